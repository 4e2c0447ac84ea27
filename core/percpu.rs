//! Per-CPU data
//!
//! Each physical CPU owns one [`PerCpu`] record. Trap handlers receive it by
//! mutable reference, so the counters need no synchronization.

use crate::config::MAX_CPUS;
use crate::{Error, Result};

/// Per-CPU exit statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum CpuStat {
    /// All VM exits
    VmexitsTotal = 0,
    /// Stage-2 data aborts (MMIO)
    VmexitsMmio,
    /// Management requests
    VmexitsManagement,
    /// Hypercalls
    VmexitsHypercall,
    /// GIC maintenance interrupts
    VmexitsMaintenance,
    /// Virtual interrupt injection
    VmexitsVirq,
    /// Virtual SGIs
    VmexitsVsgi,
    /// PSCI calls
    VmexitsPsci,
    /// SMCCC calls
    VmexitsSmccc,
    /// Trapped CP15 accesses
    VmexitsCp15,
}

impl CpuStat {
    pub const COUNT: usize = 10;

    /// Get statistic name
    pub fn name(&self) -> &'static str {
        match self {
            Self::VmexitsTotal => "vmexits_total",
            Self::VmexitsMmio => "vmexits_mmio",
            Self::VmexitsManagement => "vmexits_management",
            Self::VmexitsHypercall => "vmexits_hypercall",
            Self::VmexitsMaintenance => "vmexits_maintenance",
            Self::VmexitsVirq => "vmexits_virq",
            Self::VmexitsVsgi => "vmexits_vsgi",
            Self::VmexitsPsci => "vmexits_psci",
            Self::VmexitsSmccc => "vmexits_smccc",
            Self::VmexitsCp15 => "vmexits_cp15",
        }
    }
}

/// Data owned by one physical CPU
#[derive(Debug, Clone)]
pub struct PerCpu {
    cpu_id: usize,
    stats: [u32; CpuStat::COUNT],
}

impl PerCpu {
    /// Create the record of CPU `cpu_id`
    pub fn new(cpu_id: usize) -> Result<Self> {
        if cpu_id >= MAX_CPUS {
            return Err(Error::InvalidArgument);
        }

        Ok(Self {
            cpu_id,
            stats: [0; CpuStat::COUNT],
        })
    }

    /// Physical CPU id
    pub fn cpu_id(&self) -> usize {
        self.cpu_id
    }

    /// Count one event
    #[inline]
    pub fn inc_stat(&mut self, stat: CpuStat) {
        let counter = &mut self.stats[stat as usize];
        *counter = counter.wrapping_add(1);
    }

    /// Current value of a counter
    pub fn stat(&self, stat: CpuStat) -> u32 {
        self.stats[stat as usize]
    }

    /// Clear all counters
    pub fn reset_stats(&mut self) {
        self.stats = [0; CpuStat::COUNT];
    }
}
