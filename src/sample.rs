//! Module: sample
//!
//! Purpose: SampleValue, one 10-bit A/D conversion result. Produced by the
//! ADC sampler, consumed by the period controller.
//!
//! Architecture:
//! - Right-justified result format (ADFM = 1): ADRESH holds bits 9:8,
//!   ADRESL holds bits 7:0
//! - A fresh value per conversion, never mutated after it is read
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Largest value a 10-bit conversion can produce.
pub const SAMPLE_MAX: u16 = 0x3FF;

/// Resolution of the converter in bits.
pub const SAMPLE_BITS: u32 = 10;

/// One potentiometer reading, domain `0..=1023`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleValue(u16);

impl SampleValue {
    /// Lowest reading (wiper at ground).
    pub const MIN: SampleValue = SampleValue(0);

    /// Full-scale reading.
    pub const MAX: SampleValue = SampleValue(SAMPLE_MAX);

    /// Wrap a raw reading. Bits above the converter resolution are dropped.
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw & SAMPLE_MAX)
    }

    /// Assemble a right-justified result from the two result registers.
    #[inline]
    pub const fn from_adres(high: u8, low: u8) -> Self {
        Self::new(((high as u16) << 8) | low as u16)
    }

    /// Raw reading.
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<SampleValue> for u16 {
    fn from(sample: SampleValue) -> Self {
        sample.0
    }
}
