//! Node configuration
//!
//! Board-agnostic settings stored as postcard binary data in `/config`.

pub mod store;
pub mod types;

pub use store::ConfigError;
pub use types::*;
