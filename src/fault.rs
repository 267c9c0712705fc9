//! Fault state and the fatal-error path for pot-tone.
//!
//! # Philosophy
//!
//! > A wrong tone is worse than silence.
//!
//! There is no recoverable error path in the core. Anything that would
//! produce a broken tone (an impossible configuration, a zero compare period)
//! records a [`FaultCode`], silences the speaker, and parks the CPU blinking
//! the diagnostic LED until reset.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::config::ToneConfig;
use crate::hal::pic16f88::{Intcon, Pie1, Sfr, T1con};
use crate::hal::RegisterBlock;
use crate::shared::SpeakerLatch;

/// Fault codes indicating why the firmware stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Configuration rejected at boot. Data holds the `ConfigError` word.
    InvalidConfig = 1,

    /// A compare period of zero was requested. Timer1 would match on every
    /// tick and the dispatcher would starve the foreground.
    PeriodOutOfRange = 2,
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    /// Additional data (meaning depends on the code).
    pub data: u16,
    /// Total fault count since boot (never cleared).
    pub count: u16,
}

impl FaultSnapshot {
    const CLEAR: FaultSnapshot = FaultSnapshot {
        active: false,
        code: FaultCode::None,
        data: 0,
        count: 0,
    };
}

/// Fault state readable from either context.
///
/// Multi-byte fields live behind a critical section: 8-bit targets have no
/// atomic 16-bit stores.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// FAULT.set(FaultCode::InvalidConfig, err.fault_data());
/// if FAULT.is_active() {
///     // speaker off, LED blinking
/// }
/// ```
pub struct FaultState {
    inner: Mutex<Cell<FaultSnapshot>>,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(FaultSnapshot::CLEAR)),
        }
    }

    /// Set fault state and bump the counter.
    pub fn set(&self, code: FaultCode, data: u16) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let prev = cell.get();
            cell.set(FaultSnapshot {
                active: true,
                code,
                data,
                count: prev.count.saturating_add(1),
            });
        });
    }

    /// Check if fault is currently active.
    pub fn is_active(&self) -> bool {
        self.snapshot().active
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    pub fn code(&self) -> FaultCode {
        self.snapshot().code
    }

    /// Get total fault count since boot.
    pub fn count(&self) -> u16 {
        self.snapshot().count
    }

    /// Clear the active flag. The counter is kept for diagnostics.
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut snap = cell.get();
            snap.active = false;
            cell.set(snap);
        });
    }

    /// Get a snapshot of the current fault state.
    pub fn snapshot(&self) -> FaultSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Firmware-wide fault record, inspected by the debugger after a halt.
pub static FAULT: FaultState = FaultState::new();

/// Silence the tone generator.
///
/// Masks interrupts, disables both event sources, stops Timer1 and drives
/// the speaker pin low. After this the dispatcher can no longer run, so the
/// foreground owns every register and the speaker latch.
pub fn shutdown<R: RegisterBlock + ?Sized>(regs: &R, speaker: &SpeakerLatch) {
    regs.reg::<Intcon>().clear(Intcon::GIE);
    regs.reg::<Pie1>().clear(Pie1::CCP1IE | Pie1::ADIE);
    regs.reg::<T1con>().clear(T1con::TMR1ON);
    let port = speaker.drive(false);
    regs.write(Sfr::PORTA, port);
}

/// Fatal-error path: record `code`, silence the tone, blink forever.
///
/// Never returns. Only a reset leaves this state.
pub fn halt<R, D>(
    regs: &R,
    speaker: &SpeakerLatch,
    config: &ToneConfig,
    code: FaultCode,
    data: u16,
    delay: &mut D,
) -> !
where
    R: RegisterBlock + ?Sized,
    D: DelayNs,
{
    FAULT.set(code, data);
    halt_recorded(regs, speaker, config, delay)
}

/// Fatal-error path for a fault already recorded in [`FAULT`].
pub fn halt_recorded<R, D>(
    regs: &R,
    speaker: &SpeakerLatch,
    config: &ToneConfig,
    delay: &mut D,
) -> !
where
    R: RegisterBlock + ?Sized,
    D: DelayNs,
{
    let snap = FAULT.snapshot();
    crate::fw_error!(crate::logging::LOG, 0, "FAULT {:?} {:#06x}", snap.code, snap.data);
    shutdown(regs, speaker);

    // A boot that failed early never made the LED pin an output
    regs.clear_bits(Sfr::TRISB, config.fault_led_mask);

    // Shadow latch: PORTB is written, never read back
    let mut port_b = 0u8;
    loop {
        delay.delay_ms(config.fault_blink_ms);
        port_b ^= config.fault_led_mask;
        regs.write(Sfr::PORTB, port_b);
    }
}
