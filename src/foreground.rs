//! Foreground loop: pace, sample, retune. Forever.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ pacing delay │──▶│ AdcSampler   │──▶│ PeriodController │──▶ CCPR1
//! └──────────────┘   │ (spin wait)  │   │ (write if moved) │
//!        ▲           └──────────────┘   └──────────────────┘
//!        └────────────────────────────────────────┘
//! ```
//!
//! Everything here runs in foreground context and may be preempted by the
//! dispatcher between any two instructions. The dispatcher keeps the tone
//! going on its own; this loop only decides which period it runs at.

use embedded_hal::delay::DelayNs;

use crate::adc::AdcSampler;
use crate::config::ToneConfig;
use crate::fault::{self, FAULT};
use crate::hal::RegisterBlock;
use crate::logging::LOG;
use crate::oscillator::ToneOscillator;
use crate::period::PeriodController;
use crate::shared::SpeakerLatch;

pub struct ForegroundLoop<'a, R: ?Sized, D> {
    regs: &'a R,
    speaker: &'a SpeakerLatch,
    config: ToneConfig,
    sampler: AdcSampler<'a, R>,
    controller: PeriodController,
    oscillator: ToneOscillator<'a, R>,
    delay: D,
    /// Completed iterations, used as the log timestamp.
    cycle: u32,
}

impl<'a, R, D> ForegroundLoop<'a, R, D>
where
    R: RegisterBlock + ?Sized,
    D: DelayNs,
{
    /// Assemble the loop from already-configured parts.
    ///
    /// `oscillator` must be armed with `config.base_period`, which is where
    /// the controller starts.
    pub fn new(
        regs: &'a R,
        speaker: &'a SpeakerLatch,
        config: ToneConfig,
        sampler: AdcSampler<'a, R>,
        oscillator: ToneOscillator<'a, R>,
        delay: D,
    ) -> Self {
        Self {
            regs,
            speaker,
            config,
            sampler,
            controller: PeriodController::new(config.base_period),
            oscillator,
            delay,
            cycle: 0,
        }
    }

    /// One iteration. Returns the period committed, if any.
    pub fn step(&mut self) -> Option<u16> {
        self.delay.delay_ms(self.config.pacing_ms);

        let sample = self.sampler.sample();
        let committed = self.controller.update(sample, &mut self.oscillator);
        if let Some(period) = committed {
            crate::fw_debug!(
                LOG,
                self.cycle,
                "adc {} period {}",
                sample.get(),
                period
            );
        }

        self.cycle = self.cycle.wrapping_add(1);
        committed
    }

    /// Run forever, halting if anything recorded a fault.
    pub fn run(mut self) -> ! {
        loop {
            self.step();

            // Already recorded by whoever raised it
            if FAULT.is_active() {
                fault::halt_recorded(self.regs, self.speaker, &self.config, &mut self.delay);
            }
        }
    }

    #[inline]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    #[inline]
    pub fn controller(&self) -> &PeriodController {
        &self.controller
    }

    #[inline]
    pub fn oscillator(&self) -> &ToneOscillator<'a, R> {
        &self.oscillator
    }

    #[inline]
    pub fn config(&self) -> &ToneConfig {
        &self.config
    }
}
