//! Direct MMIO access
//!
//! Width-typed volatile loads and stores, and the table of passthrough
//! windows a cell may reach directly.

use bitflags::bitflags;
use ::core::ptr::NonNull;
use heapless::Vec;
use volatile::VolatilePtr;

use crate::config::MAX_MMIO_REGIONS;
use crate::utils::width_mask;
use crate::{Error, Result};

/// A single trapped MMIO access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioAccess {
    /// Target address
    pub address: usize,
    /// Access size in bytes (1, 2 or 4)
    pub size: usize,
    /// Write access
    pub is_write: bool,
    /// Value to write, or value read
    pub value: u32,
}

impl MmioAccess {
    /// Direction as text
    pub fn direction(&self) -> &'static str {
        if self.is_write {
            "write"
        } else {
            "read"
        }
    }
}

/// Result of an MMIO access attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmioResult {
    /// Access performed, value is authoritative
    Handled,
    /// Address not claimed
    Unhandled,
    /// Address claimed but the access is not permitted
    Error,
}

/// An MMIO access handler
pub trait MmioHandler {
    /// Attempt the access
    fn handle(&mut self, mmio: &mut MmioAccess) -> MmioResult;
}

/// Perform a 1, 2 or 4 byte access at `mmio.address`
///
/// Other sizes are logged and ignored; a read then leaves `mmio.value`
/// untouched.
///
/// # Safety
/// `mmio.address` must be a mapped host address, valid and aligned for an
/// access of `mmio.size` bytes.
pub unsafe fn perform_access(mmio: &mut MmioAccess) {
    let Some(ptr) = NonNull::new(mmio.address as *mut u8) else {
        log::warn!("Ignoring MMIO access to null address");
        return;
    };

    if mmio.is_write {
        match mmio.size {
            1 => VolatilePtr::new(ptr).write(mmio.value as u8),
            2 => VolatilePtr::new(ptr.cast::<u16>()).write(mmio.value as u16),
            4 => VolatilePtr::new(ptr.cast::<u32>()).write(mmio.value),
            size => log::warn!("Ignoring unsupported MMIO access size {}", size),
        }
    } else {
        match mmio.size {
            1 => mmio.value = VolatilePtr::new(ptr).read() as u32,
            2 => mmio.value = VolatilePtr::new(ptr.cast::<u16>()).read() as u32,
            4 => mmio.value = VolatilePtr::new(ptr.cast::<u32>()).read(),
            size => log::warn!("Ignoring unsupported MMIO access size {}", size),
        }
    }
}

bitflags! {
    /// Permissions of a passthrough window
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const RW = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Guest physical range backed directly by host mapped device memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioWindow {
    /// Guest physical start address
    pub phys_start: usize,
    /// Host virtual address the range is mapped at
    pub host_start: usize,
    /// Size in bytes
    pub size: usize,
    /// Permitted directions
    pub flags: WindowFlags,
}

impl MmioWindow {
    fn end(&self) -> usize {
        self.phys_start + self.size
    }

    /// Whether `[address, address + size)` lies inside the window
    pub fn contains(&self, address: usize, size: usize) -> bool {
        address >= self.phys_start
            && address
                .checked_add(size)
                .is_some_and(|end| end <= self.end())
    }

    fn overlaps(&self, other: &MmioWindow) -> bool {
        self.phys_start < other.end() && other.phys_start < self.end()
    }
}

/// Passthrough windows of a cell
///
/// First stage of the MMIO dispatch: accesses inside a window go straight
/// to the host mapping.
#[derive(Debug, Clone, Default)]
pub struct PassthroughMmio<const N: usize = MAX_MMIO_REGIONS> {
    windows: Vec<MmioWindow, N>,
}

impl<const N: usize> PassthroughMmio<N> {
    pub const fn new() -> Self {
        Self { windows: Vec::new() }
    }

    /// Register a window
    ///
    /// # Safety
    /// `window.host_start` must map `window.size` bytes of device memory
    /// for as long as the window is registered.
    pub unsafe fn add_window(&mut self, window: MmioWindow) -> Result<()> {
        if window.size == 0
            || window.phys_start.checked_add(window.size).is_none()
            || window.host_start.checked_add(window.size).is_none()
        {
            return Err(Error::InvalidArgument);
        }

        if self.windows.iter().any(|w| w.overlaps(&window)) {
            log::warn!(
                "MMIO window {:#x}-{:#x} overlaps an existing window",
                window.phys_start,
                window.end()
            );
            return Err(Error::InvalidArgument);
        }

        self.windows.push(window).map_err(|_| Error::OutOfMemory)?;
        log::debug!(
            "MMIO window {:#x}-{:#x} -> {:#x} {:?}",
            window.phys_start,
            window.end(),
            window.host_start,
            window.flags
        );
        Ok(())
    }

    /// Remove the window starting at `phys_start`
    pub fn remove_window(&mut self, phys_start: usize) -> Result<MmioWindow> {
        let index = self
            .windows
            .iter()
            .position(|w| w.phys_start == phys_start)
            .ok_or(Error::NotFound)?;
        Ok(self.windows.swap_remove(index))
    }

    /// Window covering an access
    pub fn find(&self, address: usize, size: usize) -> Option<&MmioWindow> {
        self.windows.iter().find(|w| w.contains(address, size))
    }

    /// Number of registered windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl<const N: usize> MmioHandler for PassthroughMmio<N> {
    fn handle(&mut self, mmio: &mut MmioAccess) -> MmioResult {
        let Some(window) = self.find(mmio.address, mmio.size) else {
            return MmioResult::Unhandled;
        };

        let needed = if mmio.is_write {
            WindowFlags::WRITE
        } else {
            WindowFlags::READ
        };
        if !window.flags.contains(needed) {
            return MmioResult::Error;
        }

        let mut host = MmioAccess {
            address: window.host_start + (mmio.address - window.phys_start),
            value: mmio.value & width_mask(mmio.size),
            ..*mmio
        };
        if mmio.size.is_power_of_two() && (mmio.address | host.address) & (mmio.size - 1) != 0 {
            log::warn!(
                "Refusing misaligned MMIO {} at {:#x}({})",
                mmio.direction(),
                mmio.address,
                mmio.size
            );
            return MmioResult::Error;
        }

        // SAFETY: add_window's contract keeps the host mapping valid,
        // contains() keeps the access inside it and the address is aligned.
        unsafe { perform_access(&mut host) };

        if !mmio.is_write {
            mmio.value = host.value;
        }
        MmioResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const BASE: usize = 0x1c09_0000;

    fn windows(backing: &mut [u32], flags: WindowFlags) -> PassthroughMmio<4> {
        let mut mmio = PassthroughMmio::new();
        unsafe {
            mmio.add_window(MmioWindow {
                phys_start: BASE,
                host_start: backing.as_mut_ptr() as usize,
                size: backing.len() * 4,
                flags,
            })
            .unwrap();
        }
        mmio
    }

    fn access(address: usize, size: usize, is_write: bool, value: u32) -> MmioAccess {
        MmioAccess {
            address,
            size,
            is_write,
            value,
        }
    }

    #[test]
    fn test_perform_access_widths() {
        let mut backing = [0u32; 2];
        let host = backing.as_mut_ptr() as usize;

        unsafe {
            perform_access(&mut access(host, 4, true, 0x1122_3344));
            perform_access(&mut access(host + 4, 2, true, 0xaabb_ccdd));
            perform_access(&mut access(host + 7, 1, true, 0xee));
        }
        assert_eq!(backing[0], 0x1122_3344);
        assert_eq!(backing[1].to_ne_bytes()[3], 0xee);

        let mut read = access(host + 4, 2, false, 0);
        unsafe { perform_access(&mut read) };
        assert_eq!(read.value, 0xccdd);
    }

    #[test]
    fn test_perform_access_round_trip() {
        let mut backing = [0u32; 4];
        let host = backing.as_mut_ptr() as usize;

        for (offset, size, value) in [(0, 4, 0xdead_beef), (4, 2, 0x8001), (8, 1, 0x7f)] {
            unsafe { perform_access(&mut access(host + offset, size, true, value)) };
            let mut read = access(host + offset, size, false, 0);
            unsafe { perform_access(&mut read) };
            assert_eq!(read.value, value);
        }
    }

    #[test]
    fn test_unsupported_size_is_ignored() {
        testing::capture_logs();
        let mut backing = [0x5555_5555u32; 2];
        let host = backing.as_mut_ptr() as usize;

        unsafe { perform_access(&mut access(host, 8, true, 0)) };
        assert_eq!(backing, [0x5555_5555; 2]);

        let mut read = access(host, 3, false, 0x1234);
        unsafe { perform_access(&mut read) };
        assert_eq!(read.value, 0x1234);

        assert!(testing::logged("Ignoring unsupported MMIO access size 8"));
        assert!(testing::logged("Ignoring unsupported MMIO access size 3"));
    }

    #[test]
    fn test_window_claims_and_translates() {
        let mut backing = [0u32; 4];
        let mut mmio = windows(&mut backing, WindowFlags::RW);

        let mut write = access(BASE + 8, 4, true, 0xcafe_f00d);
        assert_eq!(mmio.handle(&mut write), MmioResult::Handled);

        let mut read = access(BASE + 8, 4, false, 0);
        assert_eq!(mmio.handle(&mut read), MmioResult::Handled);
        assert_eq!(read.value, 0xcafe_f00d);
        assert_eq!(backing[2], 0xcafe_f00d);
    }

    #[test]
    fn test_window_unclaimed() {
        let mut backing = [0u32; 4];
        let mut mmio = windows(&mut backing, WindowFlags::RW);

        assert_eq!(mmio.handle(&mut access(BASE - 4, 4, false, 0)), MmioResult::Unhandled);
        assert_eq!(mmio.handle(&mut access(BASE + 16, 1, false, 0)), MmioResult::Unhandled);
        // Straddles the end of the window
        assert_eq!(mmio.handle(&mut access(BASE + 14, 4, false, 0)), MmioResult::Unhandled);
    }

    #[test]
    fn test_window_forbidden_direction() {
        let mut backing = [0x1234u32; 4];
        let mut mmio = windows(&mut backing, WindowFlags::READ);

        assert_eq!(mmio.handle(&mut access(BASE, 4, true, 0)), MmioResult::Error);
        assert_eq!(backing[0], 0x1234);

        let mut read = access(BASE, 4, false, 0);
        assert_eq!(mmio.handle(&mut read), MmioResult::Handled);
        assert_eq!(read.value, 0x1234);
    }

    #[test]
    fn test_window_misaligned_access() {
        testing::capture_logs();
        let mut backing = [0x1122_3344u32; 4];
        let mut mmio = windows(&mut backing, WindowFlags::RW);

        let mut read = access(BASE + 2, 4, false, 0xaa);
        assert_eq!(mmio.handle(&mut read), MmioResult::Error);
        assert_eq!(read.value, 0xaa);

        assert_eq!(mmio.handle(&mut access(BASE + 1, 2, true, 0)), MmioResult::Error);
        assert_eq!(backing, [0x1122_3344; 4]);
        assert!(testing::logged("Refusing misaligned MMIO read at 0x1c090002(4)"));

        // Bytes are always aligned
        assert_eq!(mmio.handle(&mut access(BASE + 3, 1, false, 0)), MmioResult::Handled);
    }

    #[test]
    fn test_add_window_validation() {
        let mut mmio = PassthroughMmio::<2>::new();
        let window = MmioWindow {
            phys_start: BASE,
            host_start: 0x1000,
            size: 0x1000,
            flags: WindowFlags::RW,
        };

        unsafe {
            assert_eq!(
                mmio.add_window(MmioWindow { size: 0, ..window }),
                Err(Error::InvalidArgument)
            );
            assert_eq!(
                mmio.add_window(MmioWindow { phys_start: usize::MAX, ..window }),
                Err(Error::InvalidArgument)
            );
            assert!(mmio.add_window(window).is_ok());
            assert_eq!(
                mmio.add_window(MmioWindow { phys_start: BASE + 0x800, ..window }),
                Err(Error::InvalidArgument)
            );
            assert!(mmio
                .add_window(MmioWindow { phys_start: BASE + 0x1000, ..window })
                .is_ok());
            assert_eq!(
                mmio.add_window(MmioWindow { phys_start: BASE + 0x4000, ..window }),
                Err(Error::OutOfMemory)
            );
        }
        assert_eq!(mmio.len(), 2);
    }

    #[test]
    fn test_remove_window() {
        let mut backing = [0u32; 4];
        let mut mmio = windows(&mut backing, WindowFlags::RW);

        assert_eq!(mmio.remove_window(BASE + 4), Err(Error::NotFound));
        assert_eq!(mmio.remove_window(BASE).map(|w| w.size), Ok(16));
        assert!(mmio.is_empty());
        assert_eq!(mmio.handle(&mut access(BASE, 4, false, 0)), MmioResult::Unhandled);
    }
}
