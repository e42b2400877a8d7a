//! Indicator output implementations

pub mod gpio;

pub use gpio::PinIndicators;
