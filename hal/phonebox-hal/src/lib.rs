//! PhoneBox Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the node logic is
//! written against. A board support crate implements them for the actual
//! microcontroller (Wi-Fi socket, flash filesystem, OTA partition, GPIO).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  phonebox-core (engine, boot, config)   │
//! └─────────────────────────────────────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐   ┌──────────────────┐
//! │ phonebox-hal    │◄──│ phonebox-drivers │
//! │ (this crate)    │   │ (shift registers)│
//! └─────────────────┘   └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │  board support (socket, fs, OTA, pins)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`transport::Transport`] - Server connection byte stream
//! - [`storage::FileStore`], [`storage::StoredFile`] - Persistent files
//! - [`firmware::FirmwareUpdater`] - Firmware flashing primitive

#![no_std]
#![deny(unsafe_code)]

pub mod firmware;
pub mod gpio;
pub mod storage;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use firmware::FirmwareUpdater;
pub use gpio::{InputPin, OutputPin};
pub use storage::{FileStore, OpenMode, StorageError, StoragePath, StoredFile};
pub use transport::{Endpoint, Transport};
