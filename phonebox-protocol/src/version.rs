//! Firmware version records
//!
//! The update announcement carries the image size, version and build
//! timestamp. The node stores the same information as a 13-byte record:
//!
//! - 0      AVAILABLE: non-zero if an image is waiting to be installed
//! - 1..5   VERSION: 4 identifier bytes, displayed as `[1].[2].[3]`
//! - 5..9   SIZE: image size in bytes, little-endian
//! - 9..13  TIMESTAMP: hour, day, month, year since 2000

use core::fmt;

use embedded_io::Read;

use crate::codec::{read_reversed, read_u32_le, DecodeError};

/// Size of the persisted version record
pub const VERSION_RECORD_BYTES: usize = 13;

/// Size of the announcement fields following the update magic
pub const UPDATE_ANNOUNCEMENT_BYTES: usize = 12;

/// Build timestamp with hour resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Hour of day, 0-23
    pub hour: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Month, 1-12
    pub month: u8,
    /// Years since 2000
    pub year: u8,
}

impl Timestamp {
    /// Unpack from hour, day, month, year order
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            hour: bytes[0],
            day: bytes[1],
            month: bytes[2],
            year: bytes[3],
        }
    }

    /// Pack in hour, day, month, year order
    pub fn to_bytes(self) -> [u8; 4] {
        [self.hour, self.day, self.month, self.year]
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "20{:02}-{:02}-{:02} {:02}H00",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Installed or pending firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VersionInfo {
    /// An image is stored and should be installed on next boot
    pub available: bool,
    /// Version identifier bytes
    pub version: [u8; 4],
    /// Image size in bytes
    pub size: u32,
    /// Build timestamp
    pub timestamp: Timestamp,
}

impl VersionInfo {
    /// Unpack a persisted record
    ///
    /// Returns `None` if `bytes` is shorter than a record.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < VERSION_RECORD_BYTES {
            return None;
        }

        Some(Self {
            available: bytes[0] != 0,
            version: [bytes[1], bytes[2], bytes[3], bytes[4]],
            size: u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
            timestamp: Timestamp::from_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]),
        })
    }

    /// Pack into the persisted record layout
    pub fn to_bytes(&self) -> [u8; VERSION_RECORD_BYTES] {
        let mut out = [0u8; VERSION_RECORD_BYTES];
        out[0] = self.available as u8;
        out[1..5].copy_from_slice(&self.version);
        out[5..9].copy_from_slice(&self.size.to_le_bytes());
        out[9..13].copy_from_slice(&self.timestamp.to_bytes());
        out
    }

    /// Major version (identifier byte 1)
    pub fn major(&self) -> u8 {
        self.version[1]
    }

    /// Minor version (identifier byte 2)
    pub fn minor(&self) -> u8 {
        self.version[2]
    }

    /// Patch level (identifier byte 3)
    pub fn patch(&self) -> u8 {
        self.version[3]
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version {}.{}.{}, released {} [{} bytes]",
            self.major(),
            self.minor(),
            self.patch(),
            self.timestamp,
            self.size
        )
    }
}

/// Fields announcing a firmware image
///
/// Version and timestamp are sent byte-reversed relative to their stored
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateAnnouncement {
    /// Image size in bytes
    pub size: u32,
    /// Version identifier, stored order
    pub version: [u8; 4],
    /// Build timestamp, stored order
    pub timestamp: Timestamp,
}

impl UpdateAnnouncement {
    /// Read the fields following the update magic
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError<R::Error>> {
        let size = read_u32_le(reader)?;
        let version = read_reversed::<R, 4>(reader)?;
        let timestamp = Timestamp::from_bytes(read_reversed::<R, 4>(reader)?);
        Ok(Self {
            size,
            version,
            timestamp,
        })
    }

    /// Encode the fields in wire order
    pub fn encode(&self) -> [u8; UPDATE_ANNOUNCEMENT_BYTES] {
        let mut out = [0u8; UPDATE_ANNOUNCEMENT_BYTES];
        out[0..4].copy_from_slice(&self.size.to_le_bytes());

        let mut version = self.version;
        version.reverse();
        out[4..8].copy_from_slice(&version);

        let mut timestamp = self.timestamp.to_bytes();
        timestamp.reverse();
        out[8..12].copy_from_slice(&timestamp);
        out
    }

    /// Version record for this image, flagged for installation
    pub fn pending_version(&self) -> VersionInfo {
        VersionInfo {
            available: true,
            version: self.version,
            size: self.size,
            timestamp: self.timestamp,
        }
    }
}
