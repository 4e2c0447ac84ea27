//! Architecture support

// AArch32 guests running under an ARMv7 HYP mode hypervisor
pub mod arm32;

pub use arm32::*;

/// Initialize architecture support
pub fn init() -> crate::Result<()> {
    arm32::init()
}
