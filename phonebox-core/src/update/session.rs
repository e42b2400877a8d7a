//! Firmware transfer accounting
//!
//! Tracks how many image bytes have been stored against the size the
//! server announced. Storage and flashing are handled elsewhere.

use phonebox_protocol::{UpdateAnnouncement, VersionInfo};

/// Transfer progress after a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// More bytes expected
    Busy,
    /// Declared size reached or exceeded
    Complete,
}

/// An image transfer in progress
///
/// Completion is `received >= declared`: a final chunk that overshoots the
/// declared size still completes the transfer and its extra bytes are kept.
/// A declared size of 0 completes on the first chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateSession {
    version: VersionInfo,
    received: u32,
}

impl UpdateSession {
    /// Start a session for an announced image
    ///
    /// The pending version is flagged available for installation.
    pub fn new(announcement: &UpdateAnnouncement) -> Self {
        Self {
            version: announcement.pending_version(),
            received: 0,
        }
    }

    /// Account for a stored chunk of `len` bytes
    pub fn accept(&mut self, len: usize) -> Progress {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.received = self.received.saturating_add(len);
        if self.is_complete() {
            Progress::Complete
        } else {
            Progress::Busy
        }
    }

    /// Bytes stored so far
    pub fn received(&self) -> u32 {
        self.received
    }

    /// Announced image size
    pub fn declared(&self) -> u32 {
        self.version.size
    }

    /// Check if the declared size has been reached
    pub fn is_complete(&self) -> bool {
        self.received >= self.version.size
    }

    /// Version record to persist once the image is complete
    pub fn version(&self) -> VersionInfo {
        self.version
    }
}
