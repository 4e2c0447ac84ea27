//! Data abort syndrome decoding
//!
//! HSR ISS layout for data aborts (ARM DDI 0406C.d B3.13.6):
//! - [24] ISV: Instruction Syndrome Valid
//! - [23:22] SAS: access size, log2 bytes
//! - [21] SSE: sign extend loaded value
//! - [19:16] SRT: source/destination register
//! - [9] EA: external abort
//! - [8] CM: cache maintenance
//! - [7] S1PTW: fault on a stage-1 translation table walk
//! - [6] WnR: write not read
//!
//! The offsets live in [`HSR`]; nothing here shifts by hand.

use tock_registers::LocalRegisterCopy;

use crate::arch::arm32::cpu::coproc::HSR;

/// Decoded data abort syndrome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataAbortSyndrome {
    /// Instruction syndrome valid
    pub isv: bool,
    /// Access size in bytes
    pub size: usize,
    /// Sign-extend the transferred value
    pub sign_extend: bool,
    /// Source/destination register index
    pub reg: u8,
    /// External abort
    pub external_abort: bool,
    /// Cache maintenance operation
    pub cache_maintenance: bool,
    /// Stage-1 translation table walk
    pub s1ptw: bool,
    /// Write access
    pub is_write: bool,
    /// 32-bit instruction
    pub il: bool,
}

impl DataAbortSyndrome {
    /// Decode the syndrome of a data abort from the raw HSR value
    pub fn decode(esr: u32) -> Self {
        let hsr = LocalRegisterCopy::<u32, HSR::Register>::new(esr);

        Self {
            isv: hsr.is_set(HSR::ISV),
            size: 1 << hsr.read(HSR::SAS),
            sign_extend: hsr.is_set(HSR::SSE),
            reg: hsr.read(HSR::SRT) as u8,
            external_abort: hsr.is_set(HSR::EA),
            cache_maintenance: hsr.is_set(HSR::CM),
            s1ptw: hsr.is_set(HSR::S1PTW),
            is_write: hsr.is_set(HSR::WNR),
            il: hsr.is_set(HSR::IL),
        }
    }

    /// The fault must be reflected to the guest as a stage-1 abort
    pub fn needs_reinjection(&self) -> bool {
        self.s1ptw || self.external_abort || self.cache_maintenance
    }

    /// Access direction as text
    pub fn direction(&self) -> &'static str {
        if self.is_write {
            "write"
        } else {
            "read"
        }
    }
}
