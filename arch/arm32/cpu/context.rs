//! Trapped guest context
//!
//! Register state captured by the HYP trap entry for the duration of one
//! trap. The entry path saves r0-r12 of the user bank, the guest PC
//! (ELR_hyp), CPSR (SPSR_hyp) and the syndrome (HSR). Everything else is
//! still live in the processor and is reached through [`ProcessorState`].

use tock_registers::LocalRegisterCopy;

use super::coproc::HSR;
use super::psr::{Aarch32Mode, Psr};
use super::state::{BankedReg, ProcessorState, RegBank};

/// Number of user bank registers saved on trap entry (r0-r12)
pub const NUM_USR_REGS: usize = 13;

/// Direction of a guest register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAccess {
    /// Read the guest register into the value
    Read,
    /// Write the value into the guest register
    Write,
}

/// Register context of a trapped guest CPU
#[derive(Debug, Clone)]
#[repr(C)]
pub struct TrapContext {
    /// User bank r0-r12
    pub regs: [u32; NUM_USR_REGS],
    /// Hyp Syndrome Register of the current trap
    pub esr: u32,
    /// Guest CPSR
    pub cpsr: Psr,
    /// Guest PC of the trapped instruction
    pub pc: u32,
}

impl TrapContext {
    /// Create a context for a trap taken at `pc`
    pub fn new(esr: u32, cpsr: Psr, pc: u32) -> Self {
        Self {
            regs: [0; NUM_USR_REGS],
            esr,
            cpsr,
            pc,
        }
    }

    /// Mode the guest was in when it trapped
    fn bank(&self) -> RegBank {
        match self.cpsr.mode() {
            Some(mode) => RegBank::for_mode(mode),
            None => {
                log::warn!(
                    "Trapped from invalid mode {:#x}, using usr bank",
                    self.cpsr.bits() & Psr::MODE.bits()
                );
                RegBank::Usr
            }
        }
    }

    /// Access guest register `reg` as seen from the trapped mode
    ///
    /// r8-r12 come from the FIQ bank in FIQ mode, r13/r14 from the bank
    /// of the current mode, r15 is the PC.
    pub fn access_reg<P>(&mut self, cpu: &mut P, reg: u8, value: &mut u32, access: RegAccess)
    where
        P: ProcessorState + ?Sized,
    {
        let reg = reg & 0xf;
        let banked = match reg {
            0..=7 => None,
            8..=12 if self.cpsr.mode() == Some(Aarch32Mode::Fiq) => Some(BankedReg::Fiq(reg)),
            8..=12 => None,
            13 => Some(BankedReg::Sp(self.bank())),
            14 => Some(BankedReg::Lr(self.bank())),
            _ => {
                match access {
                    RegAccess::Read => *value = self.pc,
                    RegAccess::Write => self.pc = *value,
                }
                return;
            }
        };

        match (banked, access) {
            (Some(breg), RegAccess::Read) => *value = cpu.read_banked(breg),
            (Some(breg), RegAccess::Write) => cpu.write_banked(breg, *value),
            (None, RegAccess::Read) => *value = self.regs[reg as usize],
            (None, RegAccess::Write) => self.regs[reg as usize] = *value,
        }
    }

    /// Read guest register `reg`
    pub fn read_reg<P: ProcessorState + ?Sized>(&mut self, cpu: &mut P, reg: u8) -> u32 {
        let mut value = 0;
        self.access_reg(cpu, reg, &mut value, RegAccess::Read);
        value
    }

    /// Write guest register `reg`
    pub fn write_reg<P: ProcessorState + ?Sized>(&mut self, cpu: &mut P, reg: u8, value: u32) {
        let mut value = value;
        self.access_reg(cpu, reg, &mut value, RegAccess::Write);
    }

    /// Length in bytes of the trapped instruction
    pub fn instruction_length(&self) -> u32 {
        let hsr = LocalRegisterCopy::<u32, HSR::Register>::new(self.esr);
        if hsr.is_set(HSR::IL) {
            4
        } else {
            2
        }
    }

    /// Step the guest past the trapped instruction
    ///
    /// Inside a Thumb IT block the IT state advances as well.
    pub fn skip_instruction(&mut self) {
        self.pc = self.pc.wrapping_add(self.instruction_length());
        self.cpsr.advance_it_state();
    }
}
