//! Stage-2 data abort dispatch
//!
//! A trapped guest load or store walks through a small state machine:
//!
//! ```text
//! Decode -> Reinject ----------------------------> Done(Handled)
//!        -> Access -> Complete ------------------> Done(Handled)
//!                  -> Escalate -> Complete
//!                              -> Fail ----------> Done(Forbidden | Unhandled)
//!                  -> Fail
//!        -> Fail
//! ```
//!
//! The passthrough windows get the first try, the irqchip dispatcher sees
//! whatever they leave unclaimed.

use tock_registers::LocalRegisterCopy;

use crate::arch::arm32::cpu::coproc::{HPFAR, HSR};
use crate::arch::arm32::cpu::{ProcessorState, SysReg, TrapContext};
use crate::core::percpu::{CpuStat, PerCpu};
use crate::utils::{sign_extend, REG_BYTES};

use super::access::{MmioAccess, MmioHandler, MmioResult};
use super::inject::inject_dabt;
use super::syndrome::DataAbortSyndrome;

/// Result of a trap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Trap resolved, the guest may resume
    Handled,
    /// Access denied by policy
    Forbidden,
    /// Nobody could resolve the trap
    Unhandled,
}

/// Second-stage MMIO dispatcher, usually the interrupt controller
pub trait IrqchipMmio {
    /// Attempt the access
    fn mmio_access(&mut self, mmio: &mut MmioAccess) -> TrapOutcome;
}

/// Why a data abort could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DabtFault {
    /// No valid instruction syndrome, or wider than a register
    UnsupportedSyndrome,
    /// No handler claimed the address
    Unclaimed,
    /// A handler claimed the address and refused the access
    PolicyForbidden,
}

impl DabtFault {
    /// Trap outcome reported for this fault
    pub fn outcome(self) -> TrapOutcome {
        match self {
            DabtFault::UnsupportedSyndrome | DabtFault::Unclaimed => TrapOutcome::Unhandled,
            DabtFault::PolicyForbidden => TrapOutcome::Forbidden,
        }
    }
}

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DabtState {
    /// Read the fault registers and decode the syndrome
    Decode,
    /// Reflect the fault into the guest
    Reinject,
    /// Try the passthrough windows
    Access,
    /// Hand the access to the irqchip dispatcher
    Escalate,
    /// Write back a read value and step past the instruction
    Complete,
    /// Report the fault
    Fail(DabtFault),
    /// Terminal
    Done(TrapOutcome),
}

/// Data abort dispatcher for one trap
pub struct DabtDispatcher<'a, P, M, I>
where
    P: ProcessorState + ?Sized,
    M: MmioHandler + ?Sized,
    I: IrqchipMmio + ?Sized,
{
    ctx: &'a mut TrapContext,
    cpu: &'a mut P,
    percpu: &'a mut PerCpu,
    mmio: &'a mut M,
    irqchip: &'a mut I,
    syndrome: DataAbortSyndrome,
    hdfar: u32,
    access: MmioAccess,
    state: DabtState,
}

impl<'a, P, M, I> DabtDispatcher<'a, P, M, I>
where
    P: ProcessorState + ?Sized,
    M: MmioHandler + ?Sized,
    I: IrqchipMmio + ?Sized,
{
    pub fn new(
        ctx: &'a mut TrapContext,
        cpu: &'a mut P,
        percpu: &'a mut PerCpu,
        mmio: &'a mut M,
        irqchip: &'a mut I,
    ) -> Self {
        let syndrome = DataAbortSyndrome::decode(ctx.esr);
        Self {
            ctx,
            cpu,
            percpu,
            mmio,
            irqchip,
            syndrome,
            hdfar: 0,
            access: MmioAccess {
                address: 0,
                size: syndrome.size,
                is_write: syndrome.is_write,
                value: 0,
            },
            state: DabtState::Decode,
        }
    }

    /// Current state
    pub fn state(&self) -> DabtState {
        self.state
    }

    /// Access as currently built
    pub fn access(&self) -> &MmioAccess {
        &self.access
    }

    /// Perform one transition and return the new state
    ///
    /// Stepping a finished dispatcher is a no-op.
    pub fn step(&mut self) -> DabtState {
        self.state = match self.state {
            DabtState::Decode => self.decode(),
            DabtState::Reinject => {
                inject_dabt(self.ctx, self.cpu, self.hdfar);
                DabtState::Done(TrapOutcome::Handled)
            }
            DabtState::Access => self.try_passthrough(),
            DabtState::Escalate => self.escalate(),
            DabtState::Complete => self.complete(),
            DabtState::Fail(fault) => self.fail(fault),
            done @ DabtState::Done(_) => done,
        };
        self.state
    }

    /// Step until a terminal state is reached
    pub fn run(mut self) -> TrapOutcome {
        loop {
            if let DabtState::Done(outcome) = self.step() {
                return outcome;
            }
        }
    }

    fn decode(&mut self) -> DabtState {
        let hsr = LocalRegisterCopy::<u32, HSR::Register>::new(self.ctx.esr);
        let hpfar =
            LocalRegisterCopy::<u32, HPFAR::Register>::new(self.cpu.read_sysreg(SysReg::Hpfar));
        self.hdfar = self.cpu.read_sysreg(SysReg::Hdfar);
        self.access.address =
            ((hpfar.read(HPFAR::FIPA) as usize) << 12) | (self.hdfar as usize & 0xfff);

        self.percpu.inc_stat(CpuStat::VmexitsMmio);

        log::debug!(
            "CPU {}: data {} at {:#x}({}) r{} EC {:#x} DFSC {:#x}",
            self.percpu.cpu_id(),
            self.access.direction(),
            self.access.address,
            self.access.size,
            self.syndrome.reg,
            hsr.read(HSR::EC),
            hsr.read(HSR::DFSC)
        );

        // No valid syndrome means a multiple load/store or writeback form,
        // which cannot be replayed from the ISS alone
        if !self.syndrome.isv || self.syndrome.size > REG_BYTES {
            return DabtState::Fail(DabtFault::UnsupportedSyndrome);
        }

        if self.syndrome.needs_reinjection() {
            return DabtState::Reinject;
        }

        DabtState::Access
    }

    fn try_passthrough(&mut self) -> DabtState {
        if self.access.is_write {
            let mut value = self.ctx.read_reg(self.cpu, self.syndrome.reg);
            if self.syndrome.sign_extend {
                value = sign_extend(value, 8 * self.access.size as u32);
            }
            self.access.value = value;
        } else {
            self.access.value = 0;
        }

        match self.mmio.handle(&mut self.access) {
            MmioResult::Handled => DabtState::Complete,
            MmioResult::Unhandled => DabtState::Escalate,
            MmioResult::Error => DabtState::Fail(DabtFault::PolicyForbidden),
        }
    }

    fn escalate(&mut self) -> DabtState {
        match self.irqchip.mmio_access(&mut self.access) {
            TrapOutcome::Handled => DabtState::Complete,
            TrapOutcome::Forbidden => DabtState::Fail(DabtFault::PolicyForbidden),
            TrapOutcome::Unhandled => DabtState::Fail(DabtFault::Unclaimed),
        }
    }

    fn complete(&mut self) -> DabtState {
        if !self.access.is_write {
            let mut value = self.access.value;
            if self.syndrome.sign_extend {
                value = sign_extend(value, 8 * self.access.size as u32);
            }
            self.ctx.write_reg(self.cpu, self.syndrome.reg, value);
        }

        self.ctx.skip_instruction();
        DabtState::Done(TrapOutcome::Handled)
    }

    fn fail(&mut self, fault: DabtFault) -> DabtState {
        match fault {
            DabtFault::PolicyForbidden => log::warn!(
                "Forbidden data {} at {:#x}({})",
                self.access.direction(),
                self.access.address,
                self.access.size
            ),
            DabtFault::UnsupportedSyndrome | DabtFault::Unclaimed => log::error!(
                "Unhandled data {} at {:#x}({})",
                self.access.direction(),
                self.access.address,
                self.access.size
            ),
        }
        DabtState::Done(fault.outcome())
    }
}

/// Handle a stage-2 data abort taken from a guest
///
/// `ctx.esr` holds the syndrome; HPFAR and HDFAR are read through `cpu`.
pub fn handle_dabt<P, M, I>(
    ctx: &mut TrapContext,
    cpu: &mut P,
    percpu: &mut PerCpu,
    mmio: &mut M,
    irqchip: &mut I,
) -> TrapOutcome
where
    P: ProcessorState + ?Sized,
    M: MmioHandler + ?Sized,
    I: IrqchipMmio + ?Sized,
{
    DabtDispatcher::new(ctx, cpu, percpu, mmio, irqchip).run()
}
