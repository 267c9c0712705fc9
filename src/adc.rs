//! ADC sampler: one blocking conversion per call.
//!
//! Two ways to wait for the converter:
//!
//! - [`SampleMode::Polled`]: spin on GO/DONE, no interrupt involved.
//! - [`SampleMode::InterruptDriven`]: spin on the [`ConversionFlag`] that the
//!   dispatcher sets from ADIF.
//!
//! Every wait is an unconditional spin. There is no scheduler to yield to and
//! no timeout: a conversion always completes.
//!
//! # Conversion in flight
//!
//! CCP1 in special-event mode starts a conversion on every compare match, so
//! ADIF is raised at audio rate whether or not anyone wants a sample. ADIE is
//! therefore enabled only while a sample is outstanding: it is the in-flight
//! guard. Completions outside that window are gated off by the dispatcher and
//! never touch the flag, and the result is read right after the flag, a full
//! compare period ahead of the next overwrite.

use crate::hal::pic16f88::{AdcClock, Adcon0, Adcon1, Ansel, Pie1, Pir1, Sfr};
use crate::hal::RegisterBlock;
use crate::sample::SampleValue;
use crate::shared::ConversionFlag;

/// How [`AdcSampler::sample`] waits for completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleMode {
    /// Spin on GO/DONE.
    Polled,
    /// Spin on the conversion-complete flag set from interrupt context.
    InterruptDriven,
}

/// Spin until `done` returns true.
#[inline]
pub fn spin_until(mut done: impl FnMut() -> bool) {
    while !done() {
        core::hint::spin_loop();
    }
}

/// Blocking 10-bit sampler on one analog channel.
///
/// Must only be used from the foreground: in interrupt-driven mode it spins
/// on a flag only the interrupt can set.
pub struct AdcSampler<'a, R: ?Sized> {
    regs: &'a R,
    done: &'a ConversionFlag,
    mode: SampleMode,
}

impl<'a, R: RegisterBlock + ?Sized> AdcSampler<'a, R> {
    pub fn new(regs: &'a R, done: &'a ConversionFlag, mode: SampleMode) -> Self {
        Self { regs, done, mode }
    }

    #[inline]
    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Configure the converter for `channel` and power it up.
    ///
    /// Order matters: pin function, result format, clock and channel are
    /// all settled before ADON is written on its own.
    pub fn configure(&self, channel: u8) {
        self.regs.reg::<Ansel>().write(Ansel::only(channel));
        // Right-justified, Vref = AVdd/AVss, no clock divide
        self.regs.reg::<Adcon1>().write(Adcon1::ADFM);
        self.regs
            .reg::<Adcon0>()
            .write(Adcon0::select(AdcClock::Frc, channel));
        self.regs.reg::<Adcon0>().set(Adcon0::ADON);
    }

    /// Start a conversion and block until its result is available.
    pub fn sample(&mut self) -> SampleValue {
        match self.mode {
            SampleMode::Polled => self.sample_polled(),
            SampleMode::InterruptDriven => self.sample_interrupt(),
        }
    }

    fn sample_polled(&mut self) -> SampleValue {
        let adcon0 = self.regs.reg::<Adcon0>();
        adcon0.set(Adcon0::GO_DONE);
        spin_until(|| !adcon0.is_set(Adcon0::GO_DONE));
        self.read_result()
    }

    fn sample_interrupt(&mut self) -> SampleValue {
        // A stale ADIF from an unrequested conversion must not fire the
        // moment the guard opens
        self.regs.reg::<Pir1>().clear(Pir1::ADIF);
        self.regs.reg::<Pie1>().set(Pie1::ADIE);
        self.regs.reg::<Adcon0>().set(Adcon0::GO_DONE);

        let done = self.done;
        spin_until(|| done.is_set());

        self.regs.reg::<Pie1>().clear(Pie1::ADIE);
        done.clear();
        self.read_result()
    }

    /// Right-justified result, high byte first.
    #[inline]
    pub fn read_result(&self) -> SampleValue {
        let high = self.regs.read(Sfr::ADRESH);
        let low = self.regs.read(Sfr::ADRESL);
        SampleValue::from_adres(high, low)
    }
}
