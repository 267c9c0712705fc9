//! Boot sequence: reset to running tone.
//!
//! ```text
//! Boot ─▶ ConfigureIo ─▶ ConfigureAdc ─▶ ConfigureTimer ─▶ ArmInterrupts ─▶ Run
//! ```
//!
//! Stages run strictly in order, each exactly once. Interrupts stay masked
//! until the last configuration stage, so nothing fires against a half-set
//! peripheral. A rejected configuration stops the walk in `Boot`, before any
//! pin is driven.

use embedded_hal::delay::DelayNs;

use crate::adc::{spin_until, AdcSampler};
use crate::config::{ConfigError, ToneConfig, VERSION_STRING};
use crate::fault::{self, FaultCode};
use crate::foreground::ForegroundLoop;
use crate::hal::pic16f88::{Intcon, Osccon, Pie1, Pir1, Sfr, IRCF_4MHZ};
use crate::hal::RegisterBlock;
use crate::logging::LOG;
use crate::oscillator::ToneOscillator;
use crate::shared::SharedState;

/// Where the boot sequence stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStage {
    Boot,
    ConfigureIo,
    ConfigureAdc,
    ConfigureTimer,
    ArmInterrupts,
    Run,
}

impl BootStage {
    /// Following stage. `Run` is terminal.
    pub const fn next(self) -> Self {
        match self {
            BootStage::Boot => BootStage::ConfigureIo,
            BootStage::ConfigureIo => BootStage::ConfigureAdc,
            BootStage::ConfigureAdc => BootStage::ConfigureTimer,
            BootStage::ConfigureTimer => BootStage::ArmInterrupts,
            BootStage::ArmInterrupts | BootStage::Run => BootStage::Run,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BootStage::Boot => "boot",
            BootStage::ConfigureIo => "io",
            BootStage::ConfigureAdc => "adc",
            BootStage::ConfigureTimer => "timer",
            BootStage::ArmInterrupts => "irq",
            BootStage::Run => "run",
        }
    }
}

/// Firmware being brought up.
///
/// # Usage
///
/// ```ignore
/// static REGS: MmioRegisters = unsafe { MmioRegisters::new(0 as *mut u8) };
/// static SHARED: SharedState = SharedState::new(pins::RA1);
///
/// fn main() -> ! {
///     Firmware::start(&REGS, &SHARED, ToneConfig::DEFAULT, Delay::new())
/// }
/// ```
pub struct Firmware<'a, R: ?Sized, D> {
    regs: &'a R,
    shared: &'a SharedState,
    config: ToneConfig,
    delay: D,
    sampler: AdcSampler<'a, R>,
    oscillator: ToneOscillator<'a, R>,
    stage: BootStage,
}

impl<'a, R, D> Firmware<'a, R, D>
where
    R: RegisterBlock + ?Sized,
    D: DelayNs,
{
    pub fn new(regs: &'a R, shared: &'a SharedState, config: ToneConfig, delay: D) -> Self {
        Self {
            regs,
            shared,
            config,
            delay,
            sampler: AdcSampler::new(regs, shared.conversion(), config.sample_mode),
            oscillator: ToneOscillator::new(regs, shared.speaker()),
            stage: BootStage::Boot,
        }
    }

    #[inline]
    pub fn stage(&self) -> BootStage {
        self.stage
    }

    /// Execute the current stage and move to the next one.
    ///
    /// Returns the stage just completed. In `Run` this does nothing.
    pub fn advance(&mut self) -> Result<BootStage, ConfigError> {
        let stage = self.stage;
        match stage {
            BootStage::Boot => self.stage_boot()?,
            BootStage::ConfigureIo => self.stage_io(),
            BootStage::ConfigureAdc => self.sampler.configure(self.config.adc_channel),
            BootStage::ConfigureTimer => self.stage_timer(),
            BootStage::ArmInterrupts => self.stage_interrupts(),
            BootStage::Run => return Ok(stage),
        }

        crate::fw_info!(LOG, 0, "stage {} done", stage.as_str());
        self.stage = stage.next();
        Ok(stage)
    }

    /// Walk every remaining stage and hand over to the foreground loop.
    pub fn boot(mut self) -> Result<ForegroundLoop<'a, R, D>, ConfigError> {
        while self.stage != BootStage::Run {
            self.advance()?;
        }
        Ok(self.into_loop())
    }

    /// Boot and run forever. A boot error goes straight to the fault halt.
    pub fn start(regs: &'a R, shared: &'a SharedState, config: ToneConfig, delay: D) -> ! {
        let mut fw = Self::new(regs, shared, config, delay);
        while fw.stage != BootStage::Run {
            if let Err(err) = fw.advance() {
                fault::halt(
                    regs,
                    shared.speaker(),
                    &config,
                    FaultCode::InvalidConfig,
                    err.fault_data(),
                    &mut fw.delay,
                );
            }
        }
        fw.into_loop().run()
    }

    fn into_loop(self) -> ForegroundLoop<'a, R, D> {
        ForegroundLoop::new(
            self.regs,
            self.shared.speaker(),
            self.config,
            self.sampler,
            self.oscillator,
            self.delay,
        )
    }

    fn stage_boot(&mut self) -> Result<(), ConfigError> {
        LOG.set_max_level(self.config.log_level);
        crate::fw_info!(LOG, 0, "{}", VERSION_STRING);

        if let Err(err) = self.config.validate() {
            crate::fw_error!(LOG, 0, "config {:?}", err);
            return Err(err);
        }

        let osccon = self.regs.reg::<Osccon>();
        osccon.write(Osccon::with_ircf(osccon.read(), IRCF_4MHZ));
        // Delays are meaningless until the internal oscillator settles
        spin_until(|| osccon.is_set(Osccon::IOFS));
        Ok(())
    }

    fn stage_io(&mut self) {
        let regs = self.regs;
        // Latches first so the pins come up low
        regs.write(Sfr::PORTA, 0);
        regs.write(Sfr::TRISA, !self.config.speaker_mask);
        regs.write(Sfr::PORTB, 0);
        regs.write(Sfr::TRISB, !self.config.fault_led_mask);
    }

    fn stage_timer(&mut self) {
        if self.config.startup_chirp_cycles > 0 {
            self.oscillator.chirp(
                &mut self.delay,
                self.config.chirp_half_period_us,
                self.config.startup_chirp_cycles,
            );
        }
        self.oscillator.arm(self.config.base_period);

        let (high, low) = self.config.frequency_range();
        crate::fw_info!(LOG, 0, "tone {}..{} Hz", low, high);
    }

    fn stage_interrupts(&mut self) {
        let regs = self.regs;
        regs.reg::<Pir1>().clear(Pir1::CCP1IF | Pir1::ADIF);
        regs.reg::<Pie1>().set(Pie1::CCP1IE);
        regs.reg::<Intcon>().set(Intcon::PEIE);
        // The dispatcher may run from here on
        regs.reg::<Intcon>().set(Intcon::GIE);
        debug_assert!(!self.shared.conversion().is_set());
    }
}
