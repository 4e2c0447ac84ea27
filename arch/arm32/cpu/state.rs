//! Processor state access for the trapped guest
//!
//! The trap path never touches CP15 or banked registers directly. It goes
//! through [`ProcessorState`], implemented by [`ShadowCpu`] for an
//! in-memory register file and by `HypCpu` on ARMv7 hardware.

use super::coproc::{Cp15Regs, RegReadResult, RegWriteResult, SysReg};
use super::psr::Aarch32Mode;

/// Register bank selected by the processor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum RegBank {
    /// User and System mode
    Usr = 0,
    Fiq = 1,
    Irq = 2,
    Svc = 3,
    Abt = 4,
    Und = 5,
}

impl RegBank {
    pub const COUNT: usize = 6;

    /// Bank used by a processor mode
    pub fn for_mode(mode: Aarch32Mode) -> Self {
        match mode {
            Aarch32Mode::User | Aarch32Mode::System => RegBank::Usr,
            Aarch32Mode::Fiq => RegBank::Fiq,
            Aarch32Mode::Irq => RegBank::Irq,
            Aarch32Mode::Supervisor => RegBank::Svc,
            Aarch32Mode::Abort => RegBank::Abt,
            Aarch32Mode::Undefined => RegBank::Und,
        }
    }
}

/// Mode-banked general purpose register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankedReg {
    /// Banked stack pointer (r13)
    Sp(RegBank),
    /// Banked link register (r14)
    Lr(RegBank),
    /// FIQ copy of r8-r12
    Fiq(u8),
}

/// Processor state capability used by the trap path
pub trait ProcessorState {
    /// Read a CP15 register
    fn read_sysreg(&self, reg: SysReg) -> u32;

    /// Write a CP15 register
    fn write_sysreg(&mut self, reg: SysReg, value: u32);

    /// Read a mode-banked register
    fn read_banked(&self, reg: BankedReg) -> u32;

    /// Write a mode-banked register
    fn write_banked(&mut self, reg: BankedReg, value: u32);
}

/// Banked register storage
#[derive(Debug, Clone, Default)]
pub struct BankedRegs {
    /// SP per bank
    pub sp: [u32; RegBank::COUNT],
    /// LR per bank
    pub lr: [u32; RegBank::COUNT],
    /// r8_fiq - r12_fiq
    pub fiq: [u32; 5],
}

/// In-memory processor state
///
/// Backs a VCPU whose CP15 and banked registers are kept in memory while
/// it is not running.
#[derive(Debug, Clone, Default)]
pub struct ShadowCpu {
    /// CP15 register file
    pub cp15: Cp15Regs,
    /// Banked general purpose registers
    pub banked: BankedRegs,
}

impl ShadowCpu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessorState for ShadowCpu {
    fn read_sysreg(&self, reg: SysReg) -> u32 {
        match self.cp15.read(reg.encoding()) {
            RegReadResult::Ok { data } => data,
            RegReadResult::Unimplemented => {
                log::warn!("CP15 read of unimplemented register {}", reg.name());
                0
            }
        }
    }

    fn write_sysreg(&mut self, reg: SysReg, value: u32) {
        match self.cp15.write(reg.encoding(), value) {
            RegWriteResult::Ok => {}
            RegWriteResult::ReadOnly => {
                log::warn!("Ignoring write to read-only register {}", reg.name());
            }
            RegWriteResult::Unimplemented => {
                log::warn!("CP15 write of unimplemented register {}", reg.name());
            }
        }
    }

    fn read_banked(&self, reg: BankedReg) -> u32 {
        match reg {
            BankedReg::Sp(bank) => self.banked.sp[bank as usize],
            BankedReg::Lr(bank) => self.banked.lr[bank as usize],
            BankedReg::Fiq(n @ 8..=12) => self.banked.fiq[(n - 8) as usize],
            BankedReg::Fiq(n) => {
                log::warn!("r{} has no FIQ banked copy", n);
                0
            }
        }
    }

    fn write_banked(&mut self, reg: BankedReg, value: u32) {
        match reg {
            BankedReg::Sp(bank) => self.banked.sp[bank as usize] = value,
            BankedReg::Lr(bank) => self.banked.lr[bank as usize] = value,
            BankedReg::Fiq(n @ 8..=12) => self.banked.fiq[(n - 8) as usize] = value,
            BankedReg::Fiq(n) => log::warn!("r{} has no FIQ banked copy", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_for_mode() {
        assert_eq!(RegBank::for_mode(Aarch32Mode::System), RegBank::Usr);
        assert_eq!(RegBank::for_mode(Aarch32Mode::User), RegBank::Usr);
        assert_eq!(RegBank::for_mode(Aarch32Mode::Abort), RegBank::Abt);
    }

    #[test]
    fn test_shadow_banked_regs() {
        let mut cpu = ShadowCpu::new();
        cpu.write_banked(BankedReg::Lr(RegBank::Abt), 0x8000_1234);
        cpu.write_banked(BankedReg::Sp(RegBank::Svc), 0x8010_0000);
        cpu.write_banked(BankedReg::Fiq(12), 0xdead_beef);

        assert_eq!(cpu.read_banked(BankedReg::Lr(RegBank::Abt)), 0x8000_1234);
        assert_eq!(cpu.read_banked(BankedReg::Lr(RegBank::Svc)), 0);
        assert_eq!(cpu.read_banked(BankedReg::Sp(RegBank::Svc)), 0x8010_0000);
        assert_eq!(cpu.read_banked(BankedReg::Fiq(12)), 0xdead_beef);
        assert_eq!(cpu.banked.fiq[4], 0xdead_beef);
    }

    #[test]
    fn test_shadow_sysregs() {
        let mut cpu = ShadowCpu::new();
        cpu.write_sysreg(SysReg::Dfar, 0xf000_0004);
        assert_eq!(cpu.read_sysreg(SysReg::Dfar), 0xf000_0004);

        // Syndrome registers ignore software writes
        cpu.write_sysreg(SysReg::Hdfar, 0x1000);
        assert_eq!(cpu.read_sysreg(SysReg::Hdfar), 0);
    }
}
