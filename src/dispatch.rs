//! Interrupt dispatcher: the single interrupt entry point.
//!
//! The part has one interrupt vector. Every entry evaluates both sources,
//! each gated by `enable AND pending`, since both may be pending at once:
//!
//! | Source             | Enable   | Pending  | Action                          |
//! |--------------------|----------|----------|---------------------------------|
//! | compare match      | `CCP1IE` | `CCP1IF` | clear, toggle latch, write PORTA|
//! | conversion done    | `ADIE`   | `ADIF`   | clear, set completion flag      |
//!
//! The compare branch runs at audio rate; any extra latency there is heard as
//! jitter. It is a fixed handful of register accesses with no loops, no
//! logging and no branches beyond the gate.
//!
//! Hardware clears GIE on entry and restores it on return, so the dispatcher
//! never runs nested and never assumes interrupts are enabled.

use bitflags::bitflags;

use crate::hal::pic16f88::{Pie1, Pir1, Sfr};
use crate::hal::RegisterBlock;
use crate::shared::SharedState;

bitflags! {
    /// Sources serviced by one dispatch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Serviced: u8 {
        const COMPARE    = 1 << 0;
        const CONVERSION = 1 << 1;
    }
}

/// Dispatcher bound to a register file and the shared state.
///
/// Cheap to build, so an interrupt vector can construct one per entry.
pub struct InterruptDispatcher<'a, R: ?Sized> {
    regs: &'a R,
    shared: &'a SharedState,
}

impl<'a, R: RegisterBlock + ?Sized> InterruptDispatcher<'a, R> {
    pub fn new(regs: &'a R, shared: &'a SharedState) -> Self {
        Self { regs, shared }
    }

    /// Service every source that is both enabled and pending.
    ///
    /// An empty result is a spurious entry.
    #[inline]
    pub fn dispatch(&self) -> Serviced {
        let mut serviced = Serviced::empty();
        let enabled = Pie1::from_bits_retain(self.regs.read(Sfr::PIE1));
        let pending = Pir1::from_bits_retain(self.regs.read(Sfr::PIR1));

        if enabled.contains(Pie1::CCP1IE) && pending.contains(Pir1::CCP1IF) {
            self.regs.clear_bits(Sfr::PIR1, Pir1::CCP1IF.bits());
            let port = self.shared.speaker().toggle();
            self.regs.write(Sfr::PORTA, port);
            serviced |= Serviced::COMPARE;
        }

        if enabled.contains(Pie1::ADIE) && pending.contains(Pir1::ADIF) {
            self.regs.clear_bits(Sfr::PIR1, Pir1::ADIF.bits());
            self.shared.conversion().signal();
            serviced |= Serviced::CONVERSION;
        }

        if serviced.is_empty() {
            self.shared.note_spurious();
        }
        serviced
    }
}

/// Entry point for the board's interrupt vector.
///
/// ```ignore
/// #[interrupt]
/// fn isr() {
///     pot_tone::on_interrupt(&REGS, &SHARED);
/// }
/// ```
#[inline]
pub fn on_interrupt<R: RegisterBlock + ?Sized>(regs: &R, shared: &SharedState) -> Serviced {
    InterruptDispatcher::new(regs, shared).dispatch()
}
