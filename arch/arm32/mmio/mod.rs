//! ARM32 MMIO trap handling
//!
//! Stage-2 data aborts taken by a cell land here. The syndrome is decoded,
//! the access is performed through the cell's passthrough windows or the
//! irqchip dispatcher, and the guest is stepped past the instruction.
//! Faults the guest's own translation should have raised are reflected
//! back as first-stage aborts.

pub mod access;
pub mod dabt;
pub mod inject;
pub mod syndrome;

pub use access::{
    perform_access, MmioAccess, MmioHandler, MmioResult, MmioWindow, PassthroughMmio, WindowFlags,
};
pub use dabt::{handle_dabt, DabtDispatcher, DabtFault, DabtState, IrqchipMmio, TrapOutcome};
pub use inject::inject_dabt;
pub use syndrome::DataAbortSyndrome;

use crate::config::PlatformConfig;

/// Number of always-present MMIO regions a cell needs on this platform
pub fn count_regions(config: &PlatformConfig) -> u32 {
    config.smp.mmio_count_regions()
}
