//! AArch32 Program Status Register
//!
//! Reference: ARM DDI 0406C.d - B1.3.3 Program Status Registers (PSRs)

use bitflags::bitflags;

/// AArch32 processor modes
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aarch32Mode {
    User = 0b10000,
    Fiq = 0b10001,
    Irq = 0b10010,
    Supervisor = 0b10011,
    Abort = 0b10111,
    Undefined = 0b11011,
    System = 0b11111,
}

impl Aarch32Mode {
    /// Decode the CPSR.M field
    ///
    /// Monitor and Hyp are not reachable from a guest and decode as `None`.
    pub fn from_bits(mode: u32) -> Option<Self> {
        match mode & Psr::MODE.bits() {
            0b10000 => Some(Self::User),
            0b10001 => Some(Self::Fiq),
            0b10010 => Some(Self::Irq),
            0b10011 => Some(Self::Supervisor),
            0b10111 => Some(Self::Abort),
            0b11011 => Some(Self::Undefined),
            0b11111 => Some(Self::System),
            _ => None,
        }
    }

    /// Get mode name
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "usr",
            Self::Fiq => "fiq",
            Self::Irq => "irq",
            Self::Supervisor => "svc",
            Self::Abort => "abt",
            Self::Undefined => "und",
            Self::System => "sys",
        }
    }
}

bitflags! {
    /// CPSR/SPSR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Psr: u32 {
        const MODE = 0x1f;          // M[4:0]
        const T = 1 << 5;           // Thumb execution state
        const F = 1 << 6;           // FIQ mask
        const I = 1 << 7;           // IRQ mask
        const A = 1 << 8;           // Asynchronous abort mask
        const E = 1 << 9;           // Endianness execution state
        const IT_HIGH = 0x3f << 10; // IT[7:2]
        const GE = 0xf << 16;       // Greater than or Equal flags
        const J = 1 << 24;          // Jazelle
        const IT_LOW = 0x3 << 25;   // IT[1:0]
        const Q = 1 << 27;
        const V = 1 << 28;
        const C = 1 << 29;
        const Z = 1 << 30;
        const N = 1 << 31;

        const IT = Self::IT_HIGH.bits() | Self::IT_LOW.bits();
    }
}

impl Psr {
    /// Current processor mode, `None` for modes a guest cannot be in
    pub fn mode(&self) -> Option<Aarch32Mode> {
        Aarch32Mode::from_bits(self.bits())
    }

    /// Replace the mode field
    pub fn set_mode(&mut self, mode: Aarch32Mode) {
        self.remove(Psr::MODE);
        *self = Psr::from_bits_retain(self.bits() | mode as u32);
    }

    /// Thumb execution state
    pub fn is_thumb(&self) -> bool {
        self.contains(Psr::T)
    }

    /// Extract IT[7:0] from its split location
    pub fn it_state(&self) -> u8 {
        let bits = self.bits();
        (((bits >> 25) & 0x3) | ((bits >> 8) & 0xfc)) as u8
    }

    /// Store IT[7:0] into its split location
    pub fn set_it_state(&mut self, it: u8) {
        let it = it as u32;
        self.remove(Psr::IT);
        *self = Psr::from_bits_retain(self.bits() | ((it & 0x3) << 25) | ((it & 0xfc) << 8));
    }

    /// Advance the IT state past one instruction of an IT block
    pub fn advance_it_state(&mut self) {
        let it = self.it_state();
        if it == 0 {
            return;
        }

        let cond = it & 0xe0;
        let next = if it & 0x7 == 0 {
            // The conditional block has ended
            0
        } else {
            cond | ((it << 1) & 0x1f)
        };
        self.set_it_state(next);
    }
}
