//! PhoneBox Node Protocol
//!
//! This crate defines the binary protocol spoken between the central
//! server and an I/O node over a persistent TCP connection.
//!
//! # Protocol Overview
//!
//! Every server message starts with a 4-byte magic whose first byte is the
//! open tag `0xFA`. All multi-byte integers are little-endian.
//!
//! Control/I-O frame (answered with the updated frame):
//! ```text
//! ┌────────────┬──────┬───────┬────────┬──────────────────────┐
//! │ MAGIC      │ SIZE │ ALARM │ BUZZER │ SIZE × MODULE RECORD │
//! │ 0xAACAEAFA │ 2B   │ 1B    │ 1B     │ 8B each (max 10)     │
//! └────────────┴──────┴───────┴────────┴──────────────────────┘
//! ```
//!
//! Firmware update (answered with ACK, then streamed image, then ACK):
//! ```text
//! ┌────────────┬──────┬─────────┬───────────┬──────────────┐
//! │ MAGIC      │ SIZE │ VERSION │ TIMESTAMP │ IMAGE ...    │
//! │ 0xBBCAEAFA │ 4B   │ 4B rev  │ 4B rev    │ SIZE bytes   │
//! └────────────┴──────┴─────────┴───────────┴──────────────┘
//! ```
//!
//! Errors are answered with the 4-byte NACK packet. Decoding pulls one byte
//! at a time from any [`embedded_io::Read`], so the same code runs against
//! a socket or an in-memory slice.

#![no_std]
#![deny(unsafe_code)]

pub mod codec;
pub mod frame;
pub mod version;

pub use codec::DecodeError;
pub use frame::{
    read_packet_kind, Frame, ModuleRecord, PacketKind, ACK_PACKET, CLOSE_TAG, FRAME_BYTES,
    HEADER_PACKET, MAX_IO_MODULES, MODULE_RECORD_BYTES, NACK_PACKET, OPEN_TAG, UPDATE_HEADER_PACKET,
};
pub use version::{
    Timestamp, UpdateAnnouncement, VersionInfo, UPDATE_ANNOUNCEMENT_BYTES, VERSION_RECORD_BYTES,
};
