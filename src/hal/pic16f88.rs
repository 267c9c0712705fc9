//! PIC16F88 special function registers used by the tone core.
//!
//! Addresses are data-space addresses (bank bits included), bit positions
//! follow the PIC16F87/88 datasheet (DS30487). Only the registers the tone
//! generator and its boot sequence touch are listed.
//!
//! | Register | Address | Used for                                  |
//! |----------|---------|-------------------------------------------|
//! | PORTA    | `0x005` | speaker latch (RA1)                       |
//! | PORTB    | `0x006` | diagnostic LED (RB5)                      |
//! | INTCON   | `0x00B` | GIE, PEIE                                 |
//! | PIR1     | `0x00C` | ADIF, CCP1IF pending flags                |
//! | TMR1L/H  | `0x00E` | Timer1 counter                            |
//! | T1CON    | `0x010` | Timer1 control                            |
//! | CCPR1L/H | `0x015` | compare register                          |
//! | CCP1CON  | `0x017` | compare mode                              |
//! | ADRESH   | `0x01E` | ADC result, high byte                     |
//! | ADCON0   | `0x01F` | ADC clock, channel, GO/DONE, ADON         |
//! | TRISA/B  | `0x085` | pin direction                             |
//! | PIE1     | `0x08C` | ADIE, CCP1IE enable flags                 |
//! | OSCCON   | `0x08F` | internal oscillator frequency and status  |
//! | ANSEL    | `0x09B` | analog pin select                         |
//! | ADRESL   | `0x09E` | ADC result, low byte                      |
//! | ADCON1   | `0x09F` | result format, reference                  |

use bit_field::BitField;
use bitflags::bitflags;

use super::registers::SfrFlags;

/// Special function register address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Sfr {
    PORTA = 0x005,
    PORTB = 0x006,
    INTCON = 0x00B,
    PIR1 = 0x00C,
    TMR1L = 0x00E,
    TMR1H = 0x00F,
    T1CON = 0x010,
    CCPR1L = 0x015,
    CCPR1H = 0x016,
    CCP1CON = 0x017,
    ADRESH = 0x01E,
    ADCON0 = 0x01F,
    TRISA = 0x085,
    TRISB = 0x086,
    PIE1 = 0x08C,
    OSCCON = 0x08F,
    ANSEL = 0x09B,
    ADRESL = 0x09E,
    ADCON1 = 0x09F,
}

impl Sfr {
    /// Data-space address.
    #[inline]
    pub const fn addr(self) -> u16 {
        self as u16
    }
}

/// Port bit masks.
pub mod pins {
    /// RA0/AN0, potentiometer input.
    pub const RA0: u8 = 1 << 0;
    /// RA1/AN1, speaker output.
    pub const RA1: u8 = 1 << 1;
    /// RB5, diagnostic LED.
    pub const RB5: u8 = 1 << 5;
}

bitflags! {
    /// INTCON: interrupt control.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Intcon: u8 {
        /// Global interrupt enable.
        const GIE    = 1 << 7;
        /// Peripheral interrupt enable.
        const PEIE   = 1 << 6;
        const TMR0IE = 1 << 5;
        const INT0IE = 1 << 4;
        const RBIE   = 1 << 3;
        const TMR0IF = 1 << 2;
        const INT0IF = 1 << 1;
        const RBIF   = 1 << 0;
    }

    /// PIR1: peripheral interrupt pending flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Pir1: u8 {
        /// A/D conversion complete.
        const ADIF   = 1 << 6;
        const RCIF   = 1 << 5;
        const TXIF   = 1 << 4;
        const SSPIF  = 1 << 3;
        /// CCP1 compare match.
        const CCP1IF = 1 << 2;
        const TMR2IF = 1 << 1;
        const TMR1IF = 1 << 0;
    }

    /// PIE1: peripheral interrupt enable flags, same layout as PIR1.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Pie1: u8 {
        const ADIE   = 1 << 6;
        const RCIE   = 1 << 5;
        const TXIE   = 1 << 4;
        const SSPIE  = 1 << 3;
        const CCP1IE = 1 << 2;
        const TMR2IE = 1 << 1;
        const TMR1IE = 1 << 0;
    }

    /// ADCON0: A/D control 0.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Adcon0: u8 {
        const ADCS1   = 1 << 7;
        const ADCS0   = 1 << 6;
        const CHS2    = 1 << 5;
        const CHS1    = 1 << 4;
        const CHS0    = 1 << 3;
        /// Set to start a conversion, cleared by hardware when done.
        const GO_DONE = 1 << 2;
        /// Converter powered.
        const ADON    = 1 << 0;
    }

    /// ADCON1: A/D control 1.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Adcon1: u8 {
        /// Right-justified result (six MSBs of ADRESH read as zero).
        const ADFM  = 1 << 7;
        /// Divide the conversion clock by two.
        const ADCS2 = 1 << 6;
        const VCFG1 = 1 << 5;
        const VCFG0 = 1 << 4;
    }

    /// T1CON: Timer1 control.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct T1con: u8 {
        const T1RUN   = 1 << 6;
        const T1CKPS1 = 1 << 5;
        const T1CKPS0 = 1 << 4;
        const T1OSCEN = 1 << 3;
        const T1SYNC  = 1 << 2;
        /// External clock source when set.
        const TMR1CS  = 1 << 1;
        const TMR1ON  = 1 << 0;
    }

    /// CCP1CON: capture/compare/PWM control.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Ccp1con: u8 {
        const CCP1X  = 1 << 5;
        const CCP1Y  = 1 << 4;
        const CCP1M3 = 1 << 3;
        const CCP1M2 = 1 << 2;
        const CCP1M1 = 1 << 1;
        const CCP1M0 = 1 << 0;
    }

    /// OSCCON: oscillator control.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Osccon: u8 {
        const IRCF2 = 1 << 6;
        const IRCF1 = 1 << 5;
        const IRCF0 = 1 << 4;
        const OSTS  = 1 << 3;
        /// Internal oscillator frequency is stable.
        const IOFS  = 1 << 2;
        const SCS1  = 1 << 1;
        const SCS0  = 1 << 0;
    }

    /// ANSEL: analog select, one bit per AN pin.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Ansel: u8 {
        const ANS6 = 1 << 6;
        const ANS5 = 1 << 5;
        const ANS4 = 1 << 4;
        const ANS3 = 1 << 3;
        const ANS2 = 1 << 2;
        const ANS1 = 1 << 1;
        const ANS0 = 1 << 0;
    }
}

impl SfrFlags for Intcon {
    const SFR: Sfr = Sfr::INTCON;
}

impl SfrFlags for Pir1 {
    const SFR: Sfr = Sfr::PIR1;
}

impl SfrFlags for Pie1 {
    const SFR: Sfr = Sfr::PIE1;
}

impl SfrFlags for Adcon0 {
    const SFR: Sfr = Sfr::ADCON0;
}

impl SfrFlags for Adcon1 {
    const SFR: Sfr = Sfr::ADCON1;
}

impl SfrFlags for T1con {
    const SFR: Sfr = Sfr::T1CON;
}

impl SfrFlags for Ccp1con {
    const SFR: Sfr = Sfr::CCP1CON;
}

impl SfrFlags for Osccon {
    const SFR: Sfr = Sfr::OSCCON;
}

impl SfrFlags for Ansel {
    const SFR: Sfr = Sfr::ANSEL;
}

/// A/D conversion clock, ADCS1:ADCS0 in ADCON0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcClock {
    Fosc2 = 0b00,
    Fosc8 = 0b01,
    Fosc32 = 0b10,
    /// Dedicated RC oscillator.
    Frc = 0b11,
}

/// CCP1 compare mode that drives the tone: on match CCP1IF is set, TMR1
/// is reset and, if ADON is set, an A/D conversion starts.
pub const CCP1M_SPECIAL_EVENT: u8 = 0b1011;

/// IRCF value selecting the 4 MHz internal oscillator.
pub const IRCF_4MHZ: u8 = 0b110;

/// Highest analog channel (AN6).
pub const MAX_ADC_CHANNEL: u8 = 6;

impl Adcon0 {
    const ADCS: core::ops::Range<usize> = 6..8;
    const CHS: core::ops::Range<usize> = 3..6;

    /// ADCON0 with the given clock and channel, converter off, idle.
    pub fn select(clock: AdcClock, channel: u8) -> Self {
        let mut bits = 0u8;
        bits.set_bits(Self::ADCS, clock as u8);
        bits.set_bits(Self::CHS, channel & 0b111);
        Self::from_bits_retain(bits)
    }

    /// Selected analog channel.
    pub fn channel(self) -> u8 {
        self.bits().get_bits(Self::CHS)
    }

    pub fn clock(self) -> AdcClock {
        match self.bits().get_bits(Self::ADCS) {
            0b00 => AdcClock::Fosc2,
            0b01 => AdcClock::Fosc8,
            0b10 => AdcClock::Fosc32,
            _ => AdcClock::Frc,
        }
    }
}

impl Ccp1con {
    const MODE: core::ops::Range<usize> = 0..4;

    /// CCP1CON selecting `mode` (CCP1M3:CCP1M0).
    pub fn with_mode(mode: u8) -> Self {
        let mut bits = 0u8;
        bits.set_bits(Self::MODE, mode & 0x0F);
        Self::from_bits_retain(bits)
    }

    pub fn mode(self) -> u8 {
        self.bits().get_bits(Self::MODE)
    }
}

impl Osccon {
    const IRCF: core::ops::Range<usize> = 4..7;

    /// Internal oscillator frequency select.
    pub fn ircf(self) -> u8 {
        self.bits().get_bits(Self::IRCF)
    }

    /// Same register with IRCF replaced.
    pub fn with_ircf(self, ircf: u8) -> Self {
        let mut bits = self.bits();
        bits.set_bits(Self::IRCF, ircf & 0b111);
        Self::from_bits_retain(bits)
    }
}

impl Ansel {
    /// Only `channel` configured as analog input.
    pub fn only(channel: u8) -> Self {
        Self::from_bits_truncate(1u8 << (channel & 0b111))
    }
}
