//! ARM32 CPU support module
//!
//! Processor state, register banking and coprocessor access for the
//! trapped AArch32 guest.

pub mod context;
pub mod coproc;
pub mod psr;
pub mod state;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod hw;
        pub use hw::HypCpu;
    }
}

// Re-export commonly used types
pub use context::{RegAccess, TrapContext, NUM_USR_REGS};
pub use coproc::SysReg;
pub use psr::{Aarch32Mode, Psr};
pub use state::{BankedReg, ProcessorState, RegBank, ShadowCpu};

/// Initialize ARM32 CPU support
pub fn init() -> crate::Result<()> {
    log::info!("Initializing ARM32 CPU support");
    coproc::init()?;
    log::info!("ARM32 CPU support initialized");
    Ok(())
}
