//! SMP platform operations
//!
//! Secondary CPU bring-up differs per board. Some boards park secondary
//! CPUs on a mailbox in a system register block, which every cell must be
//! able to reach and which therefore needs an always-present MMIO region.

/// SMP operations of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmpOps {
    /// Name of the bring-up method
    pub name: &'static str,
    /// Always-present MMIO regions the method needs per cell
    pub mmio_regions: u32,
}

impl SmpOps {
    /// Number of MMIO regions to reserve for these operations
    pub const fn mmio_count_regions(&self) -> u32 {
        self.mmio_regions
    }
}

/// PSCI firmware calls, no MMIO involved
pub const PSCI_SMP_OPS: SmpOps = SmpOps {
    name: "psci",
    mmio_regions: 0,
};

/// Versatile Express system register flags mailbox
pub const VEXPRESS_SMP_OPS: SmpOps = SmpOps {
    name: "vexpress",
    mmio_regions: 1,
};
