//! Module: config
//!
//! Purpose: Build-time and boot-time configuration of the tone generator.
//!
//! Architecture:
//! - `ToneConfig::DEFAULT` reproduces the reference board: 4 MHz internal
//!   oscillator, 1 µs Timer1 tick, pot on AN0, speaker on RA1, LED on RB5
//! - Builder-style `with_*` methods for board variants
//! - `validate()` runs once in the Boot stage; a rejected config halts
//!   through the fault path before any peripheral is touched
//!
//! Safety: Safe. Plain data, no shared state.

use crate::adc::SampleMode;
use crate::hal::pic16f88::{pins, MAX_ADC_CHANNEL};
use crate::logging::LogLevel;
use crate::sample::SAMPLE_MAX;

/// Shortest pacing interval accepted.
///
/// With special-event-triggered conversions running at audio rate, the result
/// register is only safe to read right after the completion flag. A generous
/// pacing interval keeps the foreground far from that window.
pub const MIN_PACING_MS: u32 = 10;

/// Shortest base compare period accepted, in ticks.
///
/// Every match costs one dispatcher entry. Below this the interrupt load
/// leaves the foreground too little time to sample and retune.
pub const MIN_BASE_PERIOD: u16 = 100;

/// Firmware version string, stamped by build.rs.
pub const VERSION_STRING: &str = env!("VERSION_STRING");

/// Tone generator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneConfig {
    /// Timer1 tick rate in Hz (instruction clock / prescaler).
    pub tick_hz: u32,
    /// Compare period for a zero reading, in ticks.
    pub base_period: u16,
    /// Foreground pause between samples.
    pub pacing_ms: u32,
    /// Analog channel the potentiometer is wired to (AN0..AN6).
    pub adc_channel: u8,
    /// PORTA bit driving the speaker.
    pub speaker_mask: u8,
    /// PORTB bit driving the diagnostic LED.
    pub fault_led_mask: u8,
    /// How the sampler waits for a conversion.
    pub sample_mode: SampleMode,
    /// Full periods of the delay-loop chirp played before arming, 0 = off.
    pub startup_chirp_cycles: u16,
    /// Half period of the startup chirp.
    pub chirp_half_period_us: u32,
    /// LED toggle interval once halted.
    pub fault_blink_ms: u32,
    /// Most verbose level that reaches the log stream.
    pub log_level: LogLevel,
}

impl ToneConfig {
    pub const DEFAULT: ToneConfig = ToneConfig {
        tick_hz: 1_000_000,
        base_period: 1000,
        pacing_ms: 100,
        adc_channel: 0,
        speaker_mask: pins::RA1,
        fault_led_mask: pins::RB5,
        sample_mode: SampleMode::InterruptDriven,
        startup_chirp_cycles: 50,
        chirp_half_period_us: 1000,
        fault_blink_ms: 50,
        log_level: LogLevel::Info,
    };

    pub const fn with_base_period(mut self, base_period: u16) -> Self {
        self.base_period = base_period;
        self
    }

    pub const fn with_pacing_ms(mut self, pacing_ms: u32) -> Self {
        self.pacing_ms = pacing_ms;
        self
    }

    pub const fn with_adc_channel(mut self, channel: u8) -> Self {
        self.adc_channel = channel;
        self
    }

    pub const fn with_speaker_mask(mut self, mask: u8) -> Self {
        self.speaker_mask = mask;
        self
    }

    pub const fn with_fault_led_mask(mut self, mask: u8) -> Self {
        self.fault_led_mask = mask;
        self
    }

    pub const fn with_sample_mode(mut self, mode: SampleMode) -> Self {
        self.sample_mode = mode;
        self
    }

    pub const fn with_startup_chirp(mut self, cycles: u16, half_period_us: u32) -> Self {
        self.startup_chirp_cycles = cycles;
        self.chirp_half_period_us = half_period_us;
        self
    }

    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Check the configuration before it reaches the hardware.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.base_period < MIN_BASE_PERIOD {
            return Err(ConfigError::BasePeriodTooShort {
                base_period: self.base_period,
            });
        }
        if self.base_period as u32 + SAMPLE_MAX as u32 > u16::MAX as u32 {
            return Err(ConfigError::NoHeadroom {
                base_period: self.base_period,
            });
        }
        if self.adc_channel > MAX_ADC_CHANNEL {
            return Err(ConfigError::InvalidChannel(self.adc_channel));
        }
        if self.speaker_mask.count_ones() != 1 {
            return Err(ConfigError::SpeakerMask(self.speaker_mask));
        }
        if self.fault_led_mask.count_ones() != 1 {
            return Err(ConfigError::LedMask(self.fault_led_mask));
        }
        // AN0..AN4 share pins with RA0..RA4
        if self.adc_channel <= 4 && self.speaker_mask == 1 << self.adc_channel {
            return Err(ConfigError::PinConflict {
                channel: self.adc_channel,
            });
        }
        if self.pacing_ms < MIN_PACING_MS {
            return Err(ConfigError::PacingTooShort {
                pacing_ms: self.pacing_ms,
            });
        }
        Ok(())
    }

    /// Acoustic frequency for a compare period: one toggle per match, so a
    /// full cycle takes two periods.
    #[inline]
    pub fn frequency_hz(&self, period: u16) -> u32 {
        if period == 0 {
            return 0;
        }
        self.tick_hz / (2 * period as u32)
    }

    /// Highest and lowest pitch the pot can reach.
    pub fn frequency_range(&self) -> (u32, u32) {
        let lowest_period = self.base_period.saturating_add(SAMPLE_MAX);
        (
            self.frequency_hz(self.base_period),
            self.frequency_hz(lowest_period),
        )
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reason a configuration was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroTickRate,
    /// Base period below [`MIN_BASE_PERIOD`].
    BasePeriodTooShort { base_period: u16 },
    /// base_period + full-scale sample does not fit the 16-bit compare register.
    NoHeadroom { base_period: u16 },
    InvalidChannel(u8),
    /// Speaker mask must select exactly one pin.
    SpeakerMask(u8),
    /// LED mask must select exactly one pin.
    LedMask(u8),
    /// Speaker pin is the analog input pin.
    PinConflict { channel: u8 },
    PacingTooShort { pacing_ms: u32 },
}

impl ConfigError {
    /// Diagnostic word stored alongside the fault code.
    pub fn fault_data(self) -> u16 {
        match self {
            ConfigError::ZeroTickRate => 0x0100,
            ConfigError::BasePeriodTooShort { base_period } => {
                0x0200 | base_period.min(0xFF)
            }
            ConfigError::NoHeadroom { .. } => 0x0300,
            ConfigError::InvalidChannel(ch) => 0x0400 | ch as u16,
            ConfigError::SpeakerMask(mask) => 0x0500 | mask as u16,
            ConfigError::PinConflict { channel } => 0x0600 | channel as u16,
            ConfigError::PacingTooShort { pacing_ms } => 0x0700 | pacing_ms.min(0xFF) as u16,
            ConfigError::LedMask(mask) => 0x0800 | mask as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ToneConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(ToneConfig::default(), ToneConfig::DEFAULT);
    }

    #[test]
    fn test_default_pitch() {
        let config = ToneConfig::DEFAULT;
        // Same 500 Hz the delay-loop firmware produced
        assert_eq!(config.frequency_hz(1000), 500);
        assert_eq!(config.frequency_range(), (500, 247));
        assert_eq!(config.frequency_hz(0), 0);
    }

    #[test]
    fn test_headroom_boundary() {
        let fits = ToneConfig::DEFAULT.with_base_period(u16::MAX - SAMPLE_MAX);
        assert_eq!(fits.validate(), Ok(()));

        let too_big = ToneConfig::DEFAULT.with_base_period(u16::MAX - SAMPLE_MAX + 1);
        assert_eq!(
            too_big.validate(),
            Err(ConfigError::NoHeadroom { base_period: 64513 })
        );
    }

    #[test]
    fn test_rejects_bad_pins() {
        let config = ToneConfig::DEFAULT.with_adc_channel(7);
        assert_eq!(config.validate(), Err(ConfigError::InvalidChannel(7)));

        let config = ToneConfig::DEFAULT.with_speaker_mask(0b11);
        assert_eq!(config.validate(), Err(ConfigError::SpeakerMask(0b11)));

        let config = ToneConfig::DEFAULT.with_adc_channel(1);
        assert_eq!(config.validate(), Err(ConfigError::PinConflict { channel: 1 }));
    }

    #[test]
    fn test_rejects_short_pacing() {
        let config = ToneConfig::DEFAULT.with_pacing_ms(1);
        assert_eq!(config.validate(), Err(ConfigError::PacingTooShort { pacing_ms: 1 }));
        assert_eq!(ConfigError::PacingTooShort { pacing_ms: 1 }.fault_data(), 0x0701);
    }

    #[test]
    fn test_base_period_floor() {
        let config = ToneConfig::DEFAULT.with_base_period(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::BasePeriodTooShort { base_period: 0 })
        );

        // A few ticks per match would starve the foreground
        let config = ToneConfig::DEFAULT.with_base_period(2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::BasePeriodTooShort { base_period: 2 })
        );
        assert_eq!(
            ConfigError::BasePeriodTooShort { base_period: 2 }.fault_data(),
            0x0202
        );

        let config = ToneConfig::DEFAULT.with_base_period(MIN_BASE_PERIOD);
        assert_eq!(config.validate(), Ok(()));
        let config = ToneConfig::DEFAULT.with_base_period(MIN_BASE_PERIOD - 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_led_mask() {
        let config = ToneConfig::DEFAULT.with_fault_led_mask(0);
        assert_eq!(config.validate(), Err(ConfigError::LedMask(0)));

        let config = ToneConfig::DEFAULT.with_fault_led_mask(pins::RB5 | 1);
        assert_eq!(config.validate(), Err(ConfigError::LedMask(0x21)));
        assert_eq!(ConfigError::LedMask(0x21).fault_data(), 0x0821);

        let config = ToneConfig::DEFAULT.with_fault_led_mask(1 << 3);
        assert_eq!(config.validate(), Ok(()));
    }
}
