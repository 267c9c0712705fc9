//! Register-level PIC16F88 model shared by the integration tests.
//!
//! Models only what the firmware touches: Timer1 counting on the
//! instruction clock, CCP1 special-event compare, the A/D converter and
//! interrupt delivery. Interrupt context is a second thread calling the
//! dispatcher inside a critical section, which the `critical-section` std
//! implementation makes mutually exclusive with foreground critical
//! sections, as masking GIE would on the chip.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering::SeqCst};
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;
use pot_tone::hal::pic16f88::{Adcon0, Ccp1con, Intcon, Osccon, Pir1, Sfr, T1con};
use pot_tone::hal::RegisterBlock;
use pot_tone::{on_interrupt, SharedState};

/// Instruction cycles one conversion takes in the model.
pub const CONVERSION_TICKS: u8 = 12;

const REG_SPACE: usize = 0x200;

pub struct SimChip {
    regs: [AtomicU8; REG_SPACE],
    /// Every write made through `RegisterBlock::write`, in order.
    journal: Mutex<Vec<(Sfr, u8)>>,
    /// Voltage on the analog pin, as the code the converter will produce.
    analog: AtomicU16,
    /// Ticks left in the running conversion, 0 when idle.
    converting: AtomicU8,
    matches: AtomicU32,
    conversions: AtomicU32,
    interrupts: AtomicU32,
}

impl SimChip {
    pub fn new() -> Self {
        Self {
            regs: std::array::from_fn(|_| AtomicU8::new(0)),
            journal: Mutex::new(Vec::new()),
            analog: AtomicU16::new(0),
            converting: AtomicU8::new(0),
            matches: AtomicU32::new(0),
            conversions: AtomicU32::new(0),
            interrupts: AtomicU32::new(0),
        }
    }

    /// Register contents without touching the journal.
    pub fn peek(&self, sfr: Sfr) -> u8 {
        self.regs[sfr.addr() as usize].load(SeqCst)
    }

    /// Hardware-side write, not journaled.
    pub fn poke(&self, sfr: Sfr, value: u8) {
        self.regs[sfr.addr() as usize].store(value, SeqCst);
    }

    pub fn peek_wide(&self, high: Sfr, low: Sfr) -> u16 {
        u16::from_be_bytes([self.peek(high), self.peek(low)])
    }

    pub fn poke_wide(&self, high: Sfr, low: Sfr, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke(high, hi);
        self.poke(low, lo);
    }

    pub fn set_analog(&self, code: u16) {
        self.analog.store(code & 0x3FF, SeqCst);
    }

    pub fn journal(&self) -> Vec<(Sfr, u8)> {
        self.journal.lock().unwrap().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }

    /// Journaled writes to `sfr`.
    pub fn writes_to(&self, sfr: Sfr) -> Vec<u8> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == sfr)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Position of the first journaled write to `sfr` matching `pred`.
    pub fn position(&self, sfr: Sfr, pred: impl Fn(u8) -> bool) -> Option<usize> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .position(|(s, v)| *s == sfr && pred(*v))
    }

    pub fn compare_matches(&self) -> u32 {
        self.matches.load(SeqCst)
    }

    pub fn conversions(&self) -> u32 {
        self.conversions.load(SeqCst)
    }

    pub fn interrupts_delivered(&self) -> u32 {
        self.interrupts.load(SeqCst)
    }

    fn set(&self, sfr: Sfr, mask: u8) {
        self.poke(sfr, self.peek(sfr) | mask);
    }

    fn clear(&self, sfr: Sfr, mask: u8) {
        self.poke(sfr, self.peek(sfr) & !mask);
    }

    /// Advance the peripherals by one instruction cycle.
    pub fn tick(&self) {
        critical_section::with(|_| {
            self.tick_timer();
            self.tick_adc();
        });
    }

    fn tick_timer(&self) {
        let t1con = T1con::from_bits_retain(self.peek(Sfr::T1CON));
        if !t1con.contains(T1con::TMR1ON) {
            return;
        }

        let count = self.peek_wide(Sfr::TMR1H, Sfr::TMR1L).wrapping_add(1);
        let special_event = Ccp1con::from_bits_retain(self.peek(Sfr::CCP1CON)).mode()
            == pot_tone::hal::pic16f88::CCP1M_SPECIAL_EVENT;
        let compare = self.peek_wide(Sfr::CCPR1H, Sfr::CCPR1L);

        if special_event && count == compare {
            self.poke_wide(Sfr::TMR1H, Sfr::TMR1L, 0);
            self.set(Sfr::PIR1, Pir1::CCP1IF.bits());
            self.matches.fetch_add(1, SeqCst);
            if self.peek(Sfr::ADCON0) & Adcon0::ADON.bits() != 0 {
                self.set(Sfr::ADCON0, Adcon0::GO_DONE.bits());
            }
        } else {
            self.poke_wide(Sfr::TMR1H, Sfr::TMR1L, count);
        }
    }

    fn tick_adc(&self) {
        let adcon0 = Adcon0::from_bits_retain(self.peek(Sfr::ADCON0));
        if !adcon0.contains(Adcon0::ADON) || !adcon0.contains(Adcon0::GO_DONE) {
            self.converting.store(0, SeqCst);
            return;
        }

        match self.converting.load(SeqCst) {
            0 => self.converting.store(CONVERSION_TICKS, SeqCst),
            1 => {
                let [high, low] = self.analog.load(SeqCst).to_be_bytes();
                self.poke(Sfr::ADRESH, high);
                self.poke(Sfr::ADRESL, low);
                self.clear(Sfr::ADCON0, Adcon0::GO_DONE.bits());
                self.set(Sfr::PIR1, Pir1::ADIF.bits());
                self.converting.store(0, SeqCst);
                self.conversions.fetch_add(1, SeqCst);
            }
            n => self.converting.store(n - 1, SeqCst),
        }
    }

    /// Would the core vector now?
    pub fn interrupt_requested(&self) -> bool {
        let intcon = Intcon::from_bits_retain(self.peek(Sfr::INTCON));
        intcon.contains(Intcon::GIE | Intcon::PEIE)
            && self.peek(Sfr::PIE1) & self.peek(Sfr::PIR1) != 0
    }

    /// Vector to `isr` if an interrupt is requested. GIE is cleared for the
    /// duration, as the core does on entry.
    pub fn deliver(&self, isr: impl FnOnce()) -> bool {
        critical_section::with(|_| {
            if !self.interrupt_requested() {
                return false;
            }
            self.clear(Sfr::INTCON, Intcon::GIE.bits());
            isr();
            self.set(Sfr::INTCON, Intcon::GIE.bits());
            self.interrupts.fetch_add(1, SeqCst);
            true
        })
    }

    /// Tick and deliver, `ticks` times, on the calling thread.
    pub fn run(&self, ticks: u32, shared: &SharedState) {
        for _ in 0..ticks {
            self.tick();
            self.deliver(|| {
                on_interrupt(self, shared);
            });
        }
    }
}

impl RegisterBlock for SimChip {
    fn read(&self, sfr: Sfr) -> u8 {
        self.peek(sfr)
    }

    fn write(&self, sfr: Sfr, value: u8) {
        self.journal.lock().unwrap().push((sfr, value));
        let value = match sfr {
            // The internal oscillator settles instantly in the model
            Sfr::OSCCON => value | Osccon::IOFS.bits(),
            _ => value,
        };
        self.poke(sfr, value);
    }
}

struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, SeqCst);
    }
}

/// Run `foreground` on this thread while a second thread plays the
/// hardware: clocking the peripherals and taking interrupts.
pub fn with_hardware<T>(chip: &SimChip, shared: &SharedState, foreground: impl FnOnce() -> T) -> T {
    let stop = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(SeqCst) {
                chip.run(1, shared);
            }
        });
        let _guard = StopOnDrop(&stop);
        foreground()
    })
}

/// Delay that records instead of waiting.
#[derive(Default)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
    pub us: Vec<u32>,
    pub ns_total: u64,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns_total += ns as u64;
    }

    fn delay_us(&mut self, us: u32) {
        self.us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}
