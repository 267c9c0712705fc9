//! Period controller: pot reading → compare period.
//!
//! `target = base_period + sample`. Monotone, no saturation needed: the
//! configuration guarantees `base_period + 1023` fits the 16-bit register.
//! A larger reading means a longer period and so a lower pitch.
//!
//! The controller remembers the last committed period and only touches the
//! hardware when the target differs. A stationary pot, or one that keeps
//! quantizing to the same code, costs no register writes.

use crate::oscillator::ComparePeriod;
use crate::sample::SampleValue;

pub struct PeriodController {
    base_period: u16,
    /// Last period committed to the oscillator.
    active: u16,
    /// Hardware writes since boot.
    commits: u32,
}

impl PeriodController {
    /// Controller whose active period is `base_period`, matching the value
    /// the oscillator is armed with.
    pub const fn new(base_period: u16) -> Self {
        Self {
            base_period,
            active: base_period,
            commits: 0,
        }
    }

    /// Period for `sample`.
    #[inline]
    pub const fn target(&self, sample: SampleValue) -> u16 {
        self.base_period + sample.get()
    }

    /// Retune `osc` for `sample` if the period changes.
    ///
    /// Returns the committed period, or `None` when the write was suppressed.
    pub fn update<O: ComparePeriod + ?Sized>(
        &mut self,
        sample: SampleValue,
        osc: &mut O,
    ) -> Option<u16> {
        let target = self.target(sample);
        if target == self.active {
            return None;
        }

        osc.set_period(target);
        self.active = target;
        self.commits = self.commits.wrapping_add(1);
        Some(target)
    }

    #[inline]
    pub fn base_period(&self) -> u16 {
        self.base_period
    }

    #[inline]
    pub fn active(&self) -> u16 {
        self.active
    }

    /// Number of periods committed since boot.
    #[inline]
    pub fn commits(&self) -> u32 {
        self.commits
    }
}
