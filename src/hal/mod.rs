//! Hardware Abstraction Layer for pot-tone.
//!
//! Thin typed layer over the special function registers.
//! Business logic stays in core modules, HAL is just register I/O.

pub mod registers;
pub mod pic16f88;
pub mod mmio;

pub use registers::{Reg, RegisterBlock, SfrFlags};
pub use pic16f88::{
    Adcon0, Adcon1, Ansel, Ccp1con, Intcon, Osccon, Pie1, Pir1, Sfr, T1con,
};
pub use mmio::MmioRegisters;
