//! I/O module chain drivers
//!
//! The modules are daisy-chained shift registers sharing clock, latch and
//! load lines. One data line runs out to the first module and one comes
//! back from the last.

pub mod shift_register;

pub use shift_register::{ChainPins, ShiftRegisterChain, CLOCK_DELAY_US};
