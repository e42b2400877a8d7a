//! Events produced by the packet handlers

use phonebox_protocol::{DecodeError, PacketKind};

/// Failures that abort the current message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Packet magic matches no known type
    BadMagic,
    /// Frame declares more modules than the protocol allows
    TooManyModules,
    /// Reading from the server failed or the stream ended
    Transport,
    /// Opening or writing a file failed
    Storage,
}

impl<E> From<&DecodeError<E>> for ErrorKind {
    fn from(e: &DecodeError<E>) -> Self {
        match e {
            DecodeError::UnknownMagic(_) => ErrorKind::BadMagic,
            DecodeError::TooManyModules(_) => ErrorKind::TooManyModules,
            DecodeError::UnexpectedEof | DecodeError::Io(_) => ErrorKind::Transport,
        }
    }
}

/// Outcome of one handler call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Open tag received while idle
    OpenTag,
    /// Non-tag byte dropped while idle
    Discarded,
    /// Packet magic recognised
    PacketHeader(PacketKind),
    /// Update announcement read and firmware file opened
    UpdateAnnounced,
    /// Image chunk stored
    ChunkAccepted {
        /// Declared image size reached
        complete: bool,
    },
    /// I/O frame decoded and transferred to the chain
    PayloadProcessed,
    /// The current state has no handler
    Nothing,
    /// The handler failed
    Failed(ErrorKind),
}

impl Event {
    /// Check if this event aborts the current message
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::Failed(_))
    }
}
