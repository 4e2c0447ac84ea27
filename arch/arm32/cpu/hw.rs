//! HYP mode hardware backend
//!
//! [`ProcessorState`] on an ARMv7 CPU with virtualization extensions,
//! running in HYP mode with the trapped guest's CP15 and banked registers
//! still live.

use ::core::arch::asm;

use super::coproc::SysReg;
use super::state::{BankedReg, ProcessorState, RegBank};

macro_rules! mrc {
    ($opc1:literal, $crn:literal, $crm:literal, $opc2:literal) => {{
        let value: u32;
        unsafe {
            asm!(
                concat!("mrc p15, ", $opc1, ", {}, ", $crn, ", ", $crm, ", ", $opc2),
                out(reg) value,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }};
}

macro_rules! mcr {
    ($opc1:literal, $crn:literal, $crm:literal, $opc2:literal, $value:expr) => {{
        unsafe {
            asm!(
                concat!("mcr p15, ", $opc1, ", {}, ", $crn, ", ", $crm, ", ", $opc2),
                in(reg) $value,
                options(nostack, preserves_flags)
            );
        }
    }};
}

macro_rules! mrs_banked {
    ($reg:literal) => {{
        let value: u32;
        unsafe {
            asm!(
                concat!("mrs {}, ", $reg),
                out(reg) value,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }};
}

macro_rules! msr_banked {
    ($reg:literal, $value:expr) => {{
        unsafe {
            asm!(
                concat!("msr ", $reg, ", {}"),
                in(reg) $value,
                options(nomem, nostack, preserves_flags)
            );
        }
    }};
}

/// Processor state of the current CPU
///
/// Only valid while handling a trap from the guest whose state is loaded.
#[derive(Debug, Default)]
pub struct HypCpu;

impl ProcessorState for HypCpu {
    fn read_sysreg(&self, reg: SysReg) -> u32 {
        match reg {
            SysReg::Sctlr => mrc!("0", "c1", "c0", "0"),
            SysReg::Ttbcr => mrc!("0", "c2", "c0", "2"),
            SysReg::Vbar => mrc!("0", "c12", "c0", "0"),
            SysReg::Dfsr => mrc!("0", "c5", "c0", "0"),
            SysReg::Dfar => mrc!("0", "c6", "c0", "0"),
            SysReg::Hsr => mrc!("4", "c5", "c2", "0"),
            SysReg::Hdfar => mrc!("4", "c6", "c0", "0"),
            SysReg::Hpfar => mrc!("4", "c6", "c0", "4"),
        }
    }

    fn write_sysreg(&mut self, reg: SysReg, value: u32) {
        match reg {
            SysReg::Sctlr => mcr!("0", "c1", "c0", "0", value),
            SysReg::Ttbcr => mcr!("0", "c2", "c0", "2", value),
            SysReg::Vbar => mcr!("0", "c12", "c0", "0", value),
            SysReg::Dfsr => mcr!("0", "c5", "c0", "0", value),
            SysReg::Dfar => mcr!("0", "c6", "c0", "0", value),
            SysReg::Hsr | SysReg::Hdfar | SysReg::Hpfar => {
                log::warn!("Ignoring write to read-only register {}", reg.name());
            }
        }
    }

    fn read_banked(&self, reg: BankedReg) -> u32 {
        match reg {
            BankedReg::Sp(RegBank::Usr) => mrs_banked!("SP_usr"),
            BankedReg::Sp(RegBank::Fiq) => mrs_banked!("SP_fiq"),
            BankedReg::Sp(RegBank::Irq) => mrs_banked!("SP_irq"),
            BankedReg::Sp(RegBank::Svc) => mrs_banked!("SP_svc"),
            BankedReg::Sp(RegBank::Abt) => mrs_banked!("SP_abt"),
            BankedReg::Sp(RegBank::Und) => mrs_banked!("SP_und"),
            BankedReg::Lr(RegBank::Usr) => mrs_banked!("LR_usr"),
            BankedReg::Lr(RegBank::Fiq) => mrs_banked!("LR_fiq"),
            BankedReg::Lr(RegBank::Irq) => mrs_banked!("LR_irq"),
            BankedReg::Lr(RegBank::Svc) => mrs_banked!("LR_svc"),
            BankedReg::Lr(RegBank::Abt) => mrs_banked!("LR_abt"),
            BankedReg::Lr(RegBank::Und) => mrs_banked!("LR_und"),
            BankedReg::Fiq(8) => mrs_banked!("r8_fiq"),
            BankedReg::Fiq(9) => mrs_banked!("r9_fiq"),
            BankedReg::Fiq(10) => mrs_banked!("r10_fiq"),
            BankedReg::Fiq(11) => mrs_banked!("r11_fiq"),
            BankedReg::Fiq(12) => mrs_banked!("r12_fiq"),
            BankedReg::Fiq(n) => {
                log::warn!("r{} has no FIQ banked copy", n);
                0
            }
        }
    }

    fn write_banked(&mut self, reg: BankedReg, value: u32) {
        match reg {
            BankedReg::Sp(RegBank::Usr) => msr_banked!("SP_usr", value),
            BankedReg::Sp(RegBank::Fiq) => msr_banked!("SP_fiq", value),
            BankedReg::Sp(RegBank::Irq) => msr_banked!("SP_irq", value),
            BankedReg::Sp(RegBank::Svc) => msr_banked!("SP_svc", value),
            BankedReg::Sp(RegBank::Abt) => msr_banked!("SP_abt", value),
            BankedReg::Sp(RegBank::Und) => msr_banked!("SP_und", value),
            BankedReg::Lr(RegBank::Usr) => msr_banked!("LR_usr", value),
            BankedReg::Lr(RegBank::Fiq) => msr_banked!("LR_fiq", value),
            BankedReg::Lr(RegBank::Irq) => msr_banked!("LR_irq", value),
            BankedReg::Lr(RegBank::Svc) => msr_banked!("LR_svc", value),
            BankedReg::Lr(RegBank::Abt) => msr_banked!("LR_abt", value),
            BankedReg::Lr(RegBank::Und) => msr_banked!("LR_und", value),
            BankedReg::Fiq(8) => msr_banked!("r8_fiq", value),
            BankedReg::Fiq(9) => msr_banked!("r9_fiq", value),
            BankedReg::Fiq(10) => msr_banked!("r10_fiq", value),
            BankedReg::Fiq(11) => msr_banked!("r11_fiq", value),
            BankedReg::Fiq(12) => msr_banked!("r12_fiq", value),
            BankedReg::Fiq(n) => log::warn!("r{} has no FIQ banked copy", n),
        }
    }
}
