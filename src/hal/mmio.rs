//! Memory-mapped register file.
//!
//! For targets (or emulators) that expose the PIC16F88 data space linearly at
//! a base address, with every bank laid out at `base + Sfr::addr()`.

use volatile_register::RW;

use super::pic16f88::Sfr;
use super::registers::RegisterBlock;

/// Register file backed by volatile loads and stores.
pub struct MmioRegisters {
    base: *mut u8,
}

// SAFETY: the register file is hardware shared by both execution contexts.
// Every access is a single volatile byte load or store; ownership of
// individual registers is arbitrated by the modules that use them.
unsafe impl Send for MmioRegisters {}
unsafe impl Sync for MmioRegisters {}

impl MmioRegisters {
    /// Register file mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base + Sfr::addr()` must be a valid, device-mapped byte for every
    /// [`Sfr`] for the whole lifetime of the returned value.
    pub const unsafe fn new(base: *mut u8) -> Self {
        Self { base }
    }

    #[inline(always)]
    fn cell(&self, sfr: Sfr) -> &RW<u8> {
        // SAFETY: guaranteed by the contract of `new`. RW<u8> is a
        // transparent wrapper around a single volatile byte.
        unsafe { &*(self.base.add(sfr.addr() as usize) as *const RW<u8>) }
    }
}

impl RegisterBlock for MmioRegisters {
    #[inline(always)]
    fn read(&self, sfr: Sfr) -> u8 {
        self.cell(sfr).read()
    }

    #[inline(always)]
    fn write(&self, sfr: Sfr, value: u8) {
        // SAFETY: writes to the special function registers have no memory
        // safety implications beyond the mapping guaranteed by `new`.
        unsafe { self.cell(sfr).write(value) }
    }
}
