//! Tone oscillator: Timer1 + CCP1 in special-event compare mode.
//!
//! ```text
//! TMR1: 0 ──▶ 1 ──▶ … ──▶ CCPR1 ─┐ match: CCP1IF set, TMR1 reset
//!  ▲                              │
//!  └──────────────────────────────┘  dispatcher toggles RA1
//! ```
//!
//! The hardware resets the counter on every match, so once armed the period
//! runs on its own: the interrupt only toggles the pin, it reloads nothing.
//! Half-period = CCPR1 ticks, tone frequency = tick rate / (2 × CCPR1).
//!
//! # Retuning
//!
//! [`ToneOscillator::set_period`] takes effect immediately, in the current
//! half-cycle. CCPR1 is two bytes wide, so the write happens with interrupts
//! masked and Timer1 paused, high byte first. If the paused counter has
//! already passed the new period it is pulled back to `period - 1`; otherwise
//! it would run on to 0xFFFF and wrap, a ~65 ms gap that is clearly audible.

use embedded_hal::delay::DelayNs;

use crate::fault::{FaultCode, FAULT};
use crate::hal::pic16f88::{Ccp1con, Intcon, Pir1, Sfr, T1con, CCP1M_SPECIAL_EVENT};
use crate::hal::RegisterBlock;
use crate::shared::SpeakerLatch;

/// Anything whose compare period can be retuned at run time.
///
/// The seam between the period controller and the timer hardware.
pub trait ComparePeriod {
    /// Commit a new period, in ticks.
    fn set_period(&mut self, period: u16);
}

/// Square-wave generator on Timer1/CCP1.
pub struct ToneOscillator<'a, R: ?Sized> {
    regs: &'a R,
    latch: &'a SpeakerLatch,
    /// Value last committed to CCPR1.
    period: u16,
}

impl<'a, R: RegisterBlock + ?Sized> ToneOscillator<'a, R> {
    pub fn new(regs: &'a R, latch: &'a SpeakerLatch) -> Self {
        Self {
            regs,
            latch,
            period: 0,
        }
    }

    /// Start the timer from a known reset state.
    ///
    /// Counter zeroed, compare register loaded, pending flag cleared, then
    /// Timer1 enabled. The compare interrupt enable is left alone: arming
    /// interrupts is a later boot stage.
    pub fn arm(&mut self, period: u16) {
        if period == 0 {
            FAULT.set(FaultCode::PeriodOutOfRange, 0);
            return;
        }

        let t1con = self.regs.reg::<T1con>();
        // Stopped, 1:1 prescale, instruction clock
        t1con.write(T1con::empty());
        self.regs.write_wide(Sfr::TMR1H, Sfr::TMR1L, 0);
        self.regs.write_wide(Sfr::CCPR1H, Sfr::CCPR1L, period);
        self.regs
            .reg::<Ccp1con>()
            .write(Ccp1con::with_mode(CCP1M_SPECIAL_EVENT));
        self.regs.reg::<Pir1>().clear(Pir1::CCP1IF);
        self.period = period;
        t1con.set(T1con::TMR1ON);
    }

    /// Retune while the timer keeps running.
    ///
    /// A zero period is refused and recorded as
    /// [`FaultCode::PeriodOutOfRange`]; the old period stays in force.
    pub fn set_period(&mut self, period: u16) {
        if period == 0 {
            FAULT.set(FaultCode::PeriodOutOfRange, self.period);
            return;
        }

        let regs = self.regs;
        critical_section::with(|_| {
            let t1con = regs.reg::<T1con>();
            t1con.clear(T1con::TMR1ON);

            regs.write_wide(Sfr::CCPR1H, Sfr::CCPR1L, period);
            let count = regs.read_wide(Sfr::TMR1H, Sfr::TMR1L);
            if count >= period {
                regs.write_wide(Sfr::TMR1H, Sfr::TMR1L, period - 1);
            }

            t1con.set(T1con::TMR1ON);
        });
        self.period = period;
    }

    /// Period currently latched in CCPR1.
    #[inline]
    pub fn period(&self) -> u16 {
        self.period
    }

    /// Frequency of the tone at `tick_hz`.
    #[inline]
    pub fn frequency_hz(&self, tick_hz: u32) -> u32 {
        if self.period == 0 {
            return 0;
        }
        tick_hz / (2 * self.period as u32)
    }

    /// Delay-loop square wave driven straight from the foreground.
    ///
    /// Only valid before interrupts are armed: until then the oscillator,
    /// not the dispatcher, owns the speaker latch. Leaves the pin low.
    pub fn chirp<D: DelayNs>(&mut self, delay: &mut D, half_period_us: u32, cycles: u16) {
        debug_assert!(!self.regs.reg::<Intcon>().is_set(Intcon::GIE));

        for _ in 0..cycles {
            for _ in 0..2 {
                let port = self.latch.toggle();
                self.regs.write(Sfr::PORTA, port);
                delay.delay_us(half_period_us);
            }
        }
        let port = self.latch.drive(false);
        self.regs.write(Sfr::PORTA, port);
    }
}

impl<R: RegisterBlock + ?Sized> ComparePeriod for ToneOscillator<'_, R> {
    #[inline]
    fn set_period(&mut self, period: u16) {
        ToneOscillator::set_period(self, period)
    }
}
