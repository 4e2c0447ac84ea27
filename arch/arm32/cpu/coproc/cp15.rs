//! CP15 Coprocessor Registers for ARMv7
//!
//! Register layouts and a shadow register file for the subset of the
//! system control coprocessor the data abort path reads and writes.
//! Reference: ARM DDI 0406C.d - Chapter B4 - System Control Registers
//!
//! CP15 registers used here:
//! - SCTLR, TTBCR, VBAR (guest configuration, read only for the trap path)
//! - DFSR, DFAR (guest fault reporting, written on abort injection)
//! - HSR, HDFAR, HPFAR (HYP syndrome and fault addresses)

use tock_registers::register_bitfields;

use super::{RegReadResult, RegWriteResult};

register_bitfields! [
    u32,

    /// Hyp Syndrome Register, data abort ISS layout (B3.13.6)
    pub HSR [
        /// Exception class
        EC OFFSET(26) NUMBITS(6) [
            DataAbortLowerEl = 0x24,
            DataAbortHyp = 0x25
        ],
        /// Instruction length: 0 = 16-bit, 1 = 32-bit
        IL OFFSET(25) NUMBITS(1) [],
        /// Instruction syndrome valid
        ISV OFFSET(24) NUMBITS(1) [],
        /// Syndrome access size, log2 bytes
        SAS OFFSET(22) NUMBITS(2) [
            Byte = 0,
            Halfword = 1,
            Word = 2,
            Doubleword = 3
        ],
        /// Syndrome sign extend
        SSE OFFSET(21) NUMBITS(1) [],
        /// Syndrome register transfer
        SRT OFFSET(16) NUMBITS(4) [],
        /// External abort
        EA OFFSET(9) NUMBITS(1) [],
        /// Cache maintenance
        CM OFFSET(8) NUMBITS(1) [],
        /// Stage-2 fault on a stage-1 translation table walk
        S1PTW OFFSET(7) NUMBITS(1) [],
        /// Write not read
        WNR OFFSET(6) NUMBITS(1) [],
        /// Data fault status code
        DFSC OFFSET(0) NUMBITS(6) []
    ],

    /// Hyp IPA Fault Address Register
    pub HPFAR [
        /// IPA[39:12] of the faulting access
        FIPA OFFSET(4) NUMBITS(28) []
    ],

    /// System Control Register
    pub SCTLR [
        M OFFSET(0) NUMBITS(1) [],
        A OFFSET(1) NUMBITS(1) [],
        C OFFSET(2) NUMBITS(1) [],
        I OFFSET(12) NUMBITS(1) [],
        /// High exception vectors (0xffff0000)
        V OFFSET(13) NUMBITS(1) [],
        /// Exception endianness
        EE OFFSET(25) NUMBITS(1) [],
        /// Thumb exception enable
        TE OFFSET(30) NUMBITS(1) []
    ],

    /// Translation Table Base Control Register
    pub TTBCR [
        N OFFSET(0) NUMBITS(3) [],
        /// Extended address enable (long descriptor format)
        EAE OFFSET(31) NUMBITS(1) []
    ],

    /// Data Fault Status Register
    pub DFSR [
        /// Short-descriptor fault status FS[3:0]
        FS OFFSET(0) NUMBITS(4) [
            DebugEvent = 0x2
        ],
        /// Long-descriptor fault status
        STATUS OFFSET(0) NUMBITS(6) [
            DebugEvent = 0x22
        ],
        /// Long-descriptor format in use
        LPAE OFFSET(9) NUMBITS(1) [],
        /// Write not read
        WNR OFFSET(11) NUMBITS(1) []
    ]
];

/// CP15 register encoding for coprocessor instructions
///
/// The encoding format is: MCR/MRC p15, <opc1>, <Rt>, <CRn>, <CRm>, <opc2>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Cp15Encoding {
    /// Operand 1 (0-7)
    pub opc1: u8,
    /// Operand 2 (0-7)
    pub opc2: u8,
    /// Coprocessor Register N (0-15)
    pub crn: u8,
    /// Coprocessor Register M (0-15)
    pub crm: u8,
}

impl Cp15Encoding {
    pub const fn new(opc1: u8, opc2: u8, crn: u8, crm: u8) -> Self {
        Self { opc1, opc2, crn, crm }
    }
}

/// CP15 registers touched by the data abort path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysReg {
    /// System Control Register
    Sctlr,
    /// Translation Table Base Control Register
    Ttbcr,
    /// Vector Base Address Register
    Vbar,
    /// Data Fault Status Register
    Dfsr,
    /// Data Fault Address Register
    Dfar,
    /// Hyp Syndrome Register
    Hsr,
    /// Hyp Data Fault Address Register
    Hdfar,
    /// Hyp IPA Fault Address Register
    Hpfar,
}

impl SysReg {
    pub const ALL: [SysReg; 8] = [
        SysReg::Sctlr,
        SysReg::Ttbcr,
        SysReg::Vbar,
        SysReg::Dfsr,
        SysReg::Dfar,
        SysReg::Hsr,
        SysReg::Hdfar,
        SysReg::Hpfar,
    ];

    /// MRC/MCR encoding of the register
    pub const fn encoding(self) -> Cp15Encoding {
        match self {
            SysReg::Sctlr => Cp15Encoding::new(0, 0, 1, 0),
            SysReg::Ttbcr => Cp15Encoding::new(0, 2, 2, 0),
            SysReg::Vbar => Cp15Encoding::new(0, 0, 12, 0),
            SysReg::Dfsr => Cp15Encoding::new(0, 0, 5, 0),
            SysReg::Dfar => Cp15Encoding::new(0, 0, 6, 0),
            SysReg::Hsr => Cp15Encoding::new(4, 0, 5, 2),
            SysReg::Hdfar => Cp15Encoding::new(4, 0, 6, 0),
            SysReg::Hpfar => Cp15Encoding::new(4, 4, 6, 0),
        }
    }

    /// Get register name
    pub fn name(&self) -> &'static str {
        match self {
            SysReg::Sctlr => "SCTLR",
            SysReg::Ttbcr => "TTBCR",
            SysReg::Vbar => "VBAR",
            SysReg::Dfsr => "DFSR",
            SysReg::Dfar => "DFAR",
            SysReg::Hsr => "HSR",
            SysReg::Hdfar => "HDFAR",
            SysReg::Hpfar => "HPFAR",
        }
    }
}

/// CP15 System Control Registers
#[derive(Debug, Clone)]
#[repr(C)]
pub struct Cp15CtrlRegs {
    /// SCTLR - System Control Register
    pub sctlr: u32,
    /// VBAR - Vector Base Address Register
    pub vbar: u32,
}

impl Default for Cp15CtrlRegs {
    fn default() -> Self {
        Self {
            sctlr: 0x00C50078, // Default ARMv7 SCTLR (MMU disabled)
            vbar: 0x00000000,
        }
    }
}

/// CP15 MMU Registers
#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct Cp15MmuRegs {
    /// TTBCR - Translation Table Base Control Register
    pub ttbcr: u32,
}

/// CP15 Fault Registers
#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct Cp15FaultRegs {
    /// DFSR - Data Fault Status Register
    pub dfsr: u32,
    /// DFAR - Data Fault Address Register
    pub dfar: u32,
}

/// HYP mode syndrome and fault address registers
///
/// Filled by hardware on trap entry, read-only afterwards.
#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct Cp15HypRegs {
    /// HSR - Hyp Syndrome Register
    pub hsr: u32,
    /// HDFAR - Hyp Data Fault Address Register
    pub hdfar: u32,
    /// HPFAR - Hyp IPA Fault Address Register
    pub hpfar: u32,
}

/// CP15 shadow register file for one VCPU
#[derive(Debug, Clone, Default)]
pub struct Cp15Regs {
    /// System control registers
    pub ctrl: Cp15CtrlRegs,
    /// MMU registers
    pub mmu: Cp15MmuRegs,
    /// Fault registers
    pub fault: Cp15FaultRegs,
    /// HYP fault reporting registers
    pub hyp: Cp15HypRegs,
}

impl Cp15Regs {
    /// Read a CP15 register by encoding
    pub fn read(&self, encoding: Cp15Encoding) -> RegReadResult {
        match (encoding.opc1, encoding.crn, encoding.crm, encoding.opc2) {
            // CRn=1: System control
            (0, 1, 0, 0) => RegReadResult::Ok { data: self.ctrl.sctlr },

            // CRn=2: Translation table base control
            (0, 2, 0, 2) => RegReadResult::Ok { data: self.mmu.ttbcr },

            // CRn=5: Fault status
            (0, 5, 0, 0) => RegReadResult::Ok { data: self.fault.dfsr },
            (4, 5, 2, 0) => RegReadResult::Ok { data: self.hyp.hsr },

            // CRn=6: Fault address
            (0, 6, 0, 0) => RegReadResult::Ok { data: self.fault.dfar },
            (4, 6, 0, 0) => RegReadResult::Ok { data: self.hyp.hdfar },
            (4, 6, 0, 4) => RegReadResult::Ok { data: self.hyp.hpfar },

            // CRn=12: Vector base
            (0, 12, 0, 0) => RegReadResult::Ok { data: self.ctrl.vbar },

            _ => RegReadResult::Unimplemented,
        }
    }

    /// Write to a CP15 register by encoding
    pub fn write(&mut self, encoding: Cp15Encoding, value: u32) -> RegWriteResult {
        match (encoding.opc1, encoding.crn, encoding.crm, encoding.opc2) {
            (0, 1, 0, 0) => {
                self.ctrl.sctlr = value;
                RegWriteResult::Ok
            }
            (0, 2, 0, 2) => {
                self.mmu.ttbcr = value;
                RegWriteResult::Ok
            }
            (0, 5, 0, 0) => {
                self.fault.dfsr = value;
                RegWriteResult::Ok
            }
            (0, 6, 0, 0) => {
                self.fault.dfar = value;
                RegWriteResult::Ok
            }
            (0, 12, 0, 0) => {
                // VBAR[4:0] are reserved
                self.ctrl.vbar = value & !0x1f;
                RegWriteResult::Ok
            }

            // HYP syndrome registers are only written by hardware
            (4, 5, 2, 0) | (4, 6, 0, 0) | (4, 6, 0, 4) => RegWriteResult::ReadOnly,

            _ => RegWriteResult::Unimplemented,
        }
    }

    /// Latch the HYP fault registers as hardware does on trap entry
    pub fn latch_hyp_fault(&mut self, hsr: u32, hdfar: u32, hpfar: u32) {
        self.hyp = Cp15HypRegs { hsr, hdfar, hpfar };
    }
}
