//! Hardware role traits
//!
//! These traits define the interface between the protocol engine and
//! the board-level driver implementations.

pub mod chain;
pub mod indicators;

pub use chain::IoChain;
pub use indicators::Indicators;
