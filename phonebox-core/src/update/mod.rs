//! Firmware update handling
//!
//! - [`session`]: byte accounting of an image being received
//! - [`record`]: the persisted version record

pub mod record;
pub mod session;

pub use record::{load_version, store_version};
pub use session::{Progress, UpdateSession};
