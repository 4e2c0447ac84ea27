//! ARM32 Architecture Module
//!
//! This module provides the stage-2 data abort path for ARMv7/ARMv8-AArch32
//! guest cells.
//!
//! # Overview
//!
//! The ARM32 module implements:
//! - HSR data abort syndrome decoding
//! - Direct MMIO access emulation with escalation to the irqchip
//! - First-stage data abort injection into the guest
//! - Banked register access for the trapped guest mode
//!
//! # Usage
//!
//! ```rust,ignore
//! use ferrovisor_dabt::arch::arm32::{self, mmio};
//!
//! let outcome = mmio::handle_dabt(&mut ctx, &mut cpu, &mut percpu, &mut windows, &mut irqchip);
//! if outcome != mmio::TrapOutcome::Handled {
//!     // park the cell
//! }
//! ```

pub mod cpu;
pub mod mmio;
pub mod smp;


// Re-export commonly used types
pub use cpu::{
    coproc, Aarch32Mode, BankedReg, Psr, ProcessorState, RegAccess, RegBank, ShadowCpu,
    SysReg, TrapContext,
};
pub use mmio::{handle_dabt, MmioAccess, MmioResult, TrapOutcome};

/// Initialize ARM32 architecture support
pub fn init() -> crate::Result<()> {
    log::info!("Initializing ARM32 architecture support");
    cpu::init()?;
    log::info!("ARM32 architecture support initialized");
    Ok(())
}
