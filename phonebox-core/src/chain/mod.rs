//! Module chain state
//!
//! Per-input bookkeeping for the I/O module chain, owned by the
//! shift-register driver and updated during input scans.

pub mod charge;

pub use charge::{ChargeEvent, ModuleChainState};

/// Outputs per I/O module
pub const OUTPUT_COUNT: u8 = 24;

/// Inputs per I/O module
pub const INPUT_COUNT: u8 = 16;

/// Level changes needed before an input counts as charged
pub const CHARGE_DETECT: u8 = 4;

/// Transition gap that demotes a charged input back to charging
pub const CHARGE_TIMEOUT_MS: u32 = 500;

/// Inputs tracked across the longest chain
pub const MAX_CHAIN_INPUTS: usize = INPUT_COUNT as usize * phonebox_protocol::MAX_IO_MODULES;
