//! Ferrovisor data abort handling
//!
//! Stage-2 data abort trap path for AArch32 cells: syndrome decoding,
//! MMIO access emulation and first-stage abort reinjection.

#![cfg_attr(not(test), no_std)]

// Core modules
pub mod utils;
pub mod config;

// Architecture-specific code
pub mod arch;

// Core hypervisor modules
pub mod core;

// Re-export key modules for convenience
pub use arch::arm32;
pub use crate::core::percpu::{CpuStat, PerCpu};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the trap handling support
pub fn init(config: &config::PlatformConfig) -> Result<()> {
    config::validate_platform_config(config)?;
    arch::init()?;

    log::info!(
        "Ferrovisor dabt v{} initialized for platform {} ({} SMP)",
        VERSION,
        config.name,
        config.smp.name
    );

    Ok(())
}

/// Common error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid argument
    InvalidArgument,
    /// Out of memory
    OutOfMemory,
    /// Not found
    NotFound,
}

/// Result type alias
pub type Result<T> = ::core::result::Result<T, Error>;

#[cfg(test)]
pub(crate) mod testing;
