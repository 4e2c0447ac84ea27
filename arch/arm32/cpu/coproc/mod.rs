//! Coprocessor access for ARMv7/ARMv8-AArch32
//!
//! CP15 register layouts and a shadow register file used by the trap path.

pub mod cp15;

// Re-export commonly used types
pub use cp15::{
    Cp15CtrlRegs, Cp15Encoding, Cp15FaultRegs, Cp15HypRegs, Cp15MmuRegs, Cp15Regs, SysReg,
    DFSR, HPFAR, HSR, SCTLR, TTBCR,
};

/// Coprocessor register read result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegReadResult {
    /// Successfully read, value in data
    Ok { data: u32 },
    /// Register not implemented
    Unimplemented,
}

/// Coprocessor register write result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWriteResult {
    /// Successfully written
    Ok,
    /// Register is read-only
    ReadOnly,
    /// Register not implemented
    Unimplemented,
}

/// Initialize coprocessor support
pub fn init() -> crate::Result<()> {
    log::debug!("ARM32 CP15 shadow: {} registers tracked", SysReg::ALL.len());
    Ok(())
}
