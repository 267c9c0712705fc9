//! # pot-tone
//!
//! Potentiometer-controlled tone generator for the PIC16F88.
//!
//! ## Architecture
//!
//! Two execution contexts share one core:
//! - **Interrupt context**: [`on_interrupt`] toggles the speaker on every
//!   Timer1/CCP1 compare match and flags finished ADC conversions.
//! - **Foreground context**: [`ForegroundLoop`] samples the pot, maps the
//!   reading to a compare period and retunes the oscillator when it moves.
//!
//! Every piece of state crossing the boundary lives in [`SharedState`] and
//! has exactly one writer per direction. Hardware is reached only through
//! the [`RegisterBlock`] trait, so the same code drives the real register
//! file or a host-side simulator.

#![cfg_attr(not(test), no_std)]

pub mod adc;
pub mod boot;
pub mod config;
pub mod dispatch;
pub mod fault;
pub mod foreground;
pub mod hal;
pub mod logging;
pub mod oscillator;
pub mod period;
pub mod sample;
pub mod shared;

pub use adc::{AdcSampler, SampleMode};
pub use boot::{BootStage, Firmware};
pub use config::{ConfigError, ToneConfig};
pub use dispatch::{on_interrupt, InterruptDispatcher, Serviced};
pub use fault::{FaultCode, FaultState, FAULT};
pub use foreground::ForegroundLoop;
pub use hal::{MmioRegisters, RegisterBlock, Sfr};
pub use logging::{LogLevel, LogRing, LOG};
pub use oscillator::{ComparePeriod, ToneOscillator};
pub use period::PeriodController;
pub use sample::SampleValue;
pub use shared::{ConversionFlag, SharedState, SpeakerLatch};
