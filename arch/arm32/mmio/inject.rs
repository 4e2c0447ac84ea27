//! First-stage data abort injection
//!
//! Reflects a fault the guest's own translation should have raised back
//! into the guest, as if its MMU had taken a synchronous data abort.

use tock_registers::LocalRegisterCopy;

use crate::arch::arm32::cpu::coproc::{DFSR, SCTLR, TTBCR};
use crate::arch::arm32::cpu::{
    Aarch32Mode, BankedReg, ProcessorState, Psr, RegBank, SysReg, TrapContext,
};

/// High exception vector base
const HIGH_VECTORS: u32 = 0xffff_0000;

/// Data abort vector offset
const DABT_VECTOR_OFFSET: u32 = 0x10;

/// Enter the guest's data abort handler for a fault at `addr`
///
/// SCTLR and TTBCR are only read. The guest resumes at its data abort
/// vector with LR_abt, DFSR and DFAR describing the fault.
pub fn inject_dabt<P>(ctx: &mut TrapContext, cpu: &mut P, addr: u32)
where
    P: ProcessorState + ?Sized,
{
    let sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(cpu.read_sysreg(SysReg::Sctlr));
    let ttbcr = LocalRegisterCopy::<u32, TTBCR::Register>::new(cpu.read_sysreg(SysReg::Ttbcr));
    let lr_offset = if ctx.cpsr.is_thumb() { 4 } else { 0 };

    let mut cpsr = ctx.cpsr;
    cpsr.remove(Psr::MODE | Psr::IT | Psr::T | Psr::J | Psr::E);
    cpsr.set_mode(Aarch32Mode::Abort);
    cpsr.insert(Psr::I | Psr::A);
    if sctlr.is_set(SCTLR::TE) {
        cpsr.insert(Psr::T);
    }
    if sctlr.is_set(SCTLR::EE) {
        cpsr.insert(Psr::E);
    }

    cpu.write_banked(BankedReg::Lr(RegBank::Abt), ctx.pc.wrapping_add(lr_offset));

    let vector_base = if sctlr.is_set(SCTLR::V) {
        HIGH_VECTORS
    } else {
        cpu.read_sysreg(SysReg::Vbar)
    };

    let mut dfsr = LocalRegisterCopy::<u32, DFSR::Register>::new(0);
    if ttbcr.is_set(TTBCR::EAE) {
        dfsr.write(DFSR::LPAE::SET + DFSR::STATUS::DebugEvent);
    } else {
        dfsr.write(DFSR::FS::DebugEvent);
    }

    log::debug!(
        "Injecting data abort at {:#x}, {} pc {:#x} -> {:#x}",
        addr,
        ctx.cpsr.mode().map_or("unknown", |mode| mode.name()),
        ctx.pc,
        vector_base + DABT_VECTOR_OFFSET
    );

    cpu.write_sysreg(SysReg::Dfsr, dfsr.get());
    cpu.write_sysreg(SysReg::Dfar, addr);
    ctx.cpsr = cpsr;
    ctx.pc = vector_base + DABT_VECTOR_OFFSET;
}
