//! Utility functions
//!
//! Small bit manipulation helpers used by the trap path.

/// Register width of an AArch32 guest in bytes
pub const REG_BYTES: usize = ::core::mem::size_of::<u32>();

/// Sign-extend the low `bits` bits of `val` to the full register width
///
/// Bits above `bits` are discarded before extending. `bits` outside
/// `1..=32` returns `val` unchanged.
#[inline]
pub const fn sign_extend(val: u32, bits: u32) -> u32 {
    if bits == 0 || bits >= 32 {
        return val;
    }
    let shift = 32 - bits;
    (((val << shift) as i32) >> shift) as u32
}

/// Mask covering the low `bytes` bytes of a register
#[inline]
pub const fn width_mask(bytes: usize) -> u32 {
    if bytes >= REG_BYTES {
        u32::MAX
    } else {
        (1u32 << (bytes * 8)) - 1
    }
}
