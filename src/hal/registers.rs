//! Register access traits.
//!
//! A [`RegisterBlock`] is anything that can read and write an 8-bit special
//! function register by [`Sfr`]: memory-mapped hardware, an emulator, or the
//! simulator used by the integration tests.
//!
//! Every register with named bits gets a `bitflags` type that implements
//! [`SfrFlags`], which binds the flag set to its address. [`Reg`] then gives
//! boolean accessors over that single word:
//!
//! ```ignore
//! if regs.reg::<Pie1>().is_set(Pie1::CCP1IE) && regs.reg::<Pir1>().is_set(Pir1::CCP1IF) {
//!     regs.reg::<Pir1>().clear(Pir1::CCP1IF);
//! }
//! ```

use core::marker::PhantomData;

use bitflags::Flags;

use super::pic16f88::Sfr;

/// Byte-wide register file.
///
/// Both methods take `&self`: registers behave like memory-mapped cells that
/// both execution contexts may touch. Which context may write which register
/// is a convention enforced by the modules that own them.
pub trait RegisterBlock {
    /// Read one register.
    fn read(&self, sfr: Sfr) -> u8;

    /// Write one register.
    fn write(&self, sfr: Sfr, value: u8);

    /// Set bits in `mask`, leaving the others untouched.
    ///
    /// The read-modify-write runs inside a critical section so an interrupt
    /// cannot land between the read and the write-back.
    #[inline]
    fn set_bits(&self, sfr: Sfr, mask: u8) {
        critical_section::with(|_| {
            let value = self.read(sfr);
            self.write(sfr, value | mask);
        });
    }

    /// Clear bits in `mask`, leaving the others untouched.
    #[inline]
    fn clear_bits(&self, sfr: Sfr, mask: u8) {
        critical_section::with(|_| {
            let value = self.read(sfr);
            self.write(sfr, value & !mask);
        });
    }

    /// Write a 16-bit register pair, most significant byte first.
    #[inline]
    fn write_wide(&self, high: Sfr, low: Sfr, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.write(high, hi);
        self.write(low, lo);
    }

    /// Read a 16-bit register pair, most significant byte first.
    #[inline]
    fn read_wide(&self, high: Sfr, low: Sfr) -> u16 {
        let hi = self.read(high);
        let lo = self.read(low);
        u16::from_be_bytes([hi, lo])
    }

    /// Typed view of the register that holds `F`.
    #[inline]
    fn reg<F: SfrFlags>(&self) -> Reg<'_, Self, F> {
        Reg {
            block: self,
            _flags: PhantomData,
        }
    }
}

/// A flag set that lives in exactly one register.
pub trait SfrFlags: Flags<Bits = u8> + Copy {
    /// Register holding these flags.
    const SFR: Sfr;
}

/// Boolean accessors over one register word.
pub struct Reg<'a, R: ?Sized, F> {
    block: &'a R,
    _flags: PhantomData<F>,
}

impl<'a, R: RegisterBlock + ?Sized, F: SfrFlags> Reg<'a, R, F> {
    /// Current register contents, unknown bits retained.
    #[inline]
    pub fn read(&self) -> F {
        F::from_bits_retain(self.block.read(F::SFR))
    }

    /// Overwrite the whole register.
    #[inline]
    pub fn write(&self, value: F) {
        self.block.write(F::SFR, value.bits());
    }

    /// True if every bit of `flag` is set.
    #[inline]
    pub fn is_set(&self, flag: F) -> bool {
        self.read().contains(flag)
    }

    #[inline]
    pub fn set(&self, flag: F) {
        self.block.set_bits(F::SFR, flag.bits());
    }

    #[inline]
    pub fn clear(&self, flag: F) {
        self.block.clear_bits(F::SFR, flag.bits());
    }
}
