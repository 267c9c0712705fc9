//! Interrupt dispatcher tests

mod common;

use common::SimChip;
use pot_tone::hal::pic16f88::{pins, Pie1, Pir1, Sfr};
use pot_tone::hal::RegisterBlock;
use pot_tone::{on_interrupt, InterruptDispatcher, Serviced, SharedState};

fn pend(chip: &SimChip, flags: Pir1) {
    chip.poke(Sfr::PIR1, chip.peek(Sfr::PIR1) | flags.bits());
}

fn enable(chip: &SimChip, flags: Pie1) {
    chip.poke(Sfr::PIE1, flags.bits());
}

#[test]
fn test_compare_toggles_speaker() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE);
    pend(&chip, Pir1::CCP1IF);

    let serviced = on_interrupt(&chip, &shared);

    assert_eq!(serviced, Serviced::COMPARE);
    assert_eq!(chip.peek(Sfr::PORTA), pins::RA1);
    assert_eq!(chip.peek(Sfr::PIR1) & Pir1::CCP1IF.bits(), 0);
    assert!(!shared.conversion().is_set());
}

#[test]
fn test_latch_parity_after_n_matches() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE);

    for n in 1..=101u32 {
        pend(&chip, Pir1::CCP1IF);
        on_interrupt(&chip, &shared);

        let high = chip.peek(Sfr::PORTA) & pins::RA1 != 0;
        assert_eq!(high, n % 2 == 1, "after {n} matches");
        assert_eq!(shared.speaker().is_high(), high);
    }
}

#[test]
fn test_port_written_from_shadow() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE);
    // Pin reads back something else; the latch must not pick it up
    chip.poke(Sfr::PORTA, 0xFF);
    pend(&chip, Pir1::CCP1IF);

    on_interrupt(&chip, &shared);

    assert_eq!(chip.writes_to(Sfr::PORTA), vec![pins::RA1]);
}

#[test]
fn test_conversion_sets_flag() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::ADIE);
    pend(&chip, Pir1::ADIF);

    assert_eq!(on_interrupt(&chip, &shared), Serviced::CONVERSION);
    assert!(shared.conversion().is_set());
    assert_eq!(chip.peek(Sfr::PIR1) & Pir1::ADIF.bits(), 0);
    // Speaker untouched
    assert!(chip.writes_to(Sfr::PORTA).is_empty());
}

#[test]
fn test_both_sources_in_one_entry() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE | Pie1::ADIE);
    pend(&chip, Pir1::CCP1IF | Pir1::ADIF);

    let serviced = InterruptDispatcher::new(&chip, &shared).dispatch();

    assert_eq!(serviced, Serviced::COMPARE | Serviced::CONVERSION);
    assert_eq!(chip.peek(Sfr::PIR1), 0);
    assert!(shared.speaker().is_high());
    assert!(shared.conversion().is_set());
}

#[test]
fn test_pending_but_disabled_is_ignored() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    // Special-event conversions raise ADIF while no sample is in flight
    enable(&chip, Pie1::CCP1IE);
    pend(&chip, Pir1::CCP1IF | Pir1::ADIF);

    assert_eq!(on_interrupt(&chip, &shared), Serviced::COMPARE);
    assert!(!shared.conversion().is_set());
    assert_ne!(chip.peek(Sfr::PIR1) & Pir1::ADIF.bits(), 0);
}

#[test]
fn test_enabled_but_not_pending_is_ignored() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE | Pie1::ADIE);

    assert_eq!(on_interrupt(&chip, &shared), Serviced::empty());
    assert!(!shared.speaker().is_high());
    assert!(!shared.conversion().is_set());
}

#[test]
fn test_spurious_entries_counted() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE);

    on_interrupt(&chip, &shared);
    on_interrupt(&chip, &shared);
    pend(&chip, Pir1::CCP1IF);
    on_interrupt(&chip, &shared);

    assert_eq!(shared.spurious_interrupts(), 2);
}

#[test]
fn test_other_pir1_bits_survive() {
    let chip = SimChip::new();
    let shared = SharedState::new(pins::RA1);
    enable(&chip, Pie1::CCP1IE);
    pend(&chip, Pir1::CCP1IF | Pir1::TMR1IF);

    on_interrupt(&chip, &shared);

    assert_eq!(chip.read(Sfr::PIR1), Pir1::TMR1IF.bits());
}
