//! Board-agnostic core logic for the PhoneBox I/O node
//!
//! This crate contains all node logic that does not depend on a specific
//! board:
//!
//! - Protocol engine: connection recovery, framing dispatch, replies
//! - State machine for the node protocol
//! - Firmware update session and boot-time installation
//! - Input charge detection state for the module chain
//! - Configuration types and persistence
//! - Role traits implemented by the drivers crate

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod boot;
pub mod chain;
pub mod config;
pub mod engine;
pub mod state;
pub mod traits;
pub mod update;

pub use engine::{NodeEngine, RestartReason, Tick};
pub use state::{ErrorKind, Event, Status};
