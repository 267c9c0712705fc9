//! State shared between interrupt context and foreground context.
//!
//! # Ownership
//!
//! ```text
//! Item                  Writer                      Reader
//! ────                  ──────                      ──────
//! ConversionFlag (set)  dispatcher (ISR)            ADC sampler
//! ConversionFlag (clr)  ADC sampler (foreground)    dispatcher
//! SpeakerLatch          dispatcher once armed,      anyone
//!                       oscillator before arming
//! ```
//!
//! Each item has exactly one writer per direction, so no locks are needed.
//! The writer methods are crate-private: code outside this crate can observe
//! the state but cannot become a second writer. Storage is atomics with
//! plain load/store only, which 8-bit targets support without CAS.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Conversion-complete flag.
///
/// Set exactly once per completed conversion by the dispatcher, cleared
/// exactly once by the sampler after it consumed the result.
pub struct ConversionFlag {
    set: AtomicBool,
    /// Completions signalled while the previous one was still unconsumed.
    overruns: AtomicU8,
}

impl ConversionFlag {
    pub const fn new() -> Self {
        Self {
            set: AtomicBool::new(false),
            overruns: AtomicU8::new(0),
        }
    }

    /// Interrupt side: a conversion finished.
    #[inline]
    pub(crate) fn signal(&self) {
        if self.set.load(Ordering::Acquire) {
            // Only the ISR writes this counter
            let n = self.overruns.load(Ordering::Relaxed);
            self.overruns.store(n.saturating_add(1), Ordering::Relaxed);
        }
        self.set.store(true, Ordering::Release);
    }

    /// Foreground side: the result has been consumed.
    #[inline]
    pub(crate) fn clear(&self) {
        self.set.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Number of completions that landed on an unconsumed flag.
    ///
    /// Stays zero while the in-flight guard works.
    #[inline]
    pub fn overruns(&self) -> u8 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl Default for ConversionFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Shadow copy of the PORTA output latch.
///
/// PORTA is written from the shadow, never read-modify-written, so reads of
/// the pins cannot corrupt the latch.
pub struct SpeakerLatch {
    value: AtomicU8,
    mask: u8,
}

impl SpeakerLatch {
    /// Latch driving the pin(s) in `mask`, starting low.
    pub const fn new(mask: u8) -> Self {
        Self {
            value: AtomicU8::new(0),
            mask,
        }
    }

    /// Flip the speaker bit, returning the new port value.
    #[inline]
    pub(crate) fn toggle(&self) -> u8 {
        let value = self.value.load(Ordering::Relaxed) ^ self.mask;
        self.value.store(value, Ordering::Relaxed);
        value
    }

    /// Force the speaker bit, returning the new port value.
    #[inline]
    pub(crate) fn drive(&self, high: bool) -> u8 {
        let value = if high {
            self.value.load(Ordering::Relaxed) | self.mask
        } else {
            self.value.load(Ordering::Relaxed) & !self.mask
        };
        self.value.store(value, Ordering::Relaxed);
        value
    }

    /// Current port value.
    #[inline]
    pub fn get(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.get() & self.mask != 0
    }

    #[inline]
    pub fn mask(&self) -> u8 {
        self.mask
    }
}

/// Everything both contexts touch, meant to live in one `static`.
///
/// ```ignore
/// static SHARED: SharedState = SharedState::new(pins::RA1);
/// ```
pub struct SharedState {
    conversion: ConversionFlag,
    speaker: SpeakerLatch,
    /// Interrupt entries with nothing enabled and pending. ISR-written.
    spurious: AtomicU8,
}

impl SharedState {
    pub const fn new(speaker_mask: u8) -> Self {
        Self {
            conversion: ConversionFlag::new(),
            speaker: SpeakerLatch::new(speaker_mask),
            spurious: AtomicU8::new(0),
        }
    }

    #[inline]
    pub fn conversion(&self) -> &ConversionFlag {
        &self.conversion
    }

    #[inline]
    pub fn speaker(&self) -> &SpeakerLatch {
        &self.speaker
    }

    #[inline]
    pub(crate) fn note_spurious(&self) {
        let n = self.spurious.load(Ordering::Relaxed);
        self.spurious.store(n.saturating_add(1), Ordering::Relaxed);
    }

    /// Interrupt entries that found no enabled, pending source.
    #[inline]
    pub fn spurious_interrupts(&self) -> u8 {
        self.spurious.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_set_clear_cycle() {
        let flag = ConversionFlag::new();
        assert!(!flag.is_set());

        flag.signal();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
        flag.signal();
        assert!(flag.is_set());

        assert_eq!(flag.overruns(), 0);
    }

    #[test]
    fn test_flag_counts_overrun() {
        let flag = ConversionFlag::new();
        flag.signal();
        flag.signal();
        assert!(flag.is_set());
        assert_eq!(flag.overruns(), 1);
    }

    #[test]
    fn test_latch_toggle_parity() {
        let latch = SpeakerLatch::new(0b10);
        for n in 1..=9u32 {
            latch.toggle();
            assert_eq!(latch.is_high(), n % 2 == 1);
        }
    }

    #[test]
    fn test_latch_drive_keeps_other_bits() {
        let latch = SpeakerLatch::new(0b10);
        assert_eq!(latch.drive(true), 0b10);
        assert_eq!(latch.drive(false), 0b00);
        assert!(!latch.is_high());
    }
}
