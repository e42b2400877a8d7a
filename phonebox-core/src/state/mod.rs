//! Node protocol state machine
//!
//! Defines what the node does with the next incoming bytes and how it
//! answers. The transition logic is pure: handlers turn bytes into an
//! [`Event`], and [`Status::step`] decides the next state, the reply and
//! any side effect.

pub mod events;
pub mod machine;

pub use events::{ErrorKind, Event};
pub use machine::{Effect, Reply, Status, Step};
