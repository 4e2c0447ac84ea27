//! Configuration management
//!
//! Platform settings consumed by the trap path: CPU count, the SMP
//! operations of the board and the size of the passthrough window table.

use crate::arch::arm32::smp::{SmpOps, PSCI_SMP_OPS};
use crate::{Error, Result};

/// Capacity of a cell's direct passthrough window table
pub const MAX_MMIO_REGIONS: usize = 16;

/// Upper bound on CPUs handled by one hypervisor instance
pub const MAX_CPUS: usize = 8;

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Platform name
    pub name: &'static str,
    /// Number of physical CPUs
    pub max_cpus: usize,
    /// SMP bring-up operations of the platform
    pub smp: SmpOps,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: "generic-psci",
            max_cpus: 4,
            smp: PSCI_SMP_OPS,
        }
    }
}

/// Validate platform configuration
pub fn validate_platform_config(config: &PlatformConfig) -> Result<()> {
    if config.name.is_empty() {
        return Err(Error::InvalidArgument);
    }

    if config.max_cpus == 0 || config.max_cpus > MAX_CPUS {
        return Err(Error::InvalidArgument);
    }

    if config.smp.mmio_regions as usize > MAX_MMIO_REGIONS {
        return Err(Error::InvalidArgument);
    }

    Ok(())
}
