//! State machine definition
//!
//! One handler runs per step, selected by the current [`Status`]. The
//! handler's [`Event`] and the status it leads to decide the reply.

use phonebox_protocol::PacketKind;

use super::events::Event;

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// No message in progress, waiting for an open tag
    Idle,
    /// Open tag seen, the rest of the magic is pending
    Header,
    /// Update magic seen, announcement pending
    UpdateInit,
    /// Announcement accepted, image transfer about to start
    UpdateStart,
    /// Image chunks are being stored
    UpdateBusy,
    /// Whole image stored
    UpdateDone,
    /// I/O magic seen, frame body pending
    Payload,
    /// Frame processed, reply pending
    Ready,
}

/// What to send back after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Nothing
    None,
    /// 4-byte ACK packet
    Ack,
    /// 4-byte NACK packet
    Nack,
    /// The whole frame buffer
    Frame,
}

/// Side effect to run before the reply is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Persist the received version record, then restart after the reply
    PersistVersionAndRestart,
}

/// Result of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    /// Status after the step
    pub next: Status,
    /// Reply to write
    pub reply: Reply,
    /// Effect to run before writing the reply
    pub effect: Option<Effect>,
}

impl Step {
    const fn quiet(next: Status) -> Self {
        Self {
            next,
            reply: Reply::None,
            effect: None,
        }
    }
}

impl Status {
    /// Check if a firmware transfer is in progress
    pub fn is_updating(&self) -> bool {
        matches!(
            self,
            Status::UpdateInit | Status::UpdateStart | Status::UpdateBusy | Status::UpdateDone
        )
    }

    /// Status reached by a handler event
    ///
    /// Failures always return to [`Status::Idle`]; unexpected events keep
    /// the current status.
    pub fn transition(self, event: Event) -> Self {
        use Status::*;

        match (self, event) {
            (_, Event::Failed(_)) => Idle,

            (Idle, Event::OpenTag) => Header,
            (Idle, Event::Discarded) => Idle,

            (Header, Event::PacketHeader(PacketKind::Io)) => Payload,
            (Header, Event::PacketHeader(PacketKind::Update)) => UpdateInit,

            (UpdateInit, Event::UpdateAnnounced) => UpdateStart,

            (UpdateBusy, Event::ChunkAccepted { complete: true }) => UpdateDone,
            (UpdateBusy, Event::ChunkAccepted { complete: false }) => UpdateBusy,

            (Payload, Event::PayloadProcessed) => Ready,

            _ => self,
        }
    }

    /// Reply policy for a status reached by a handler
    pub fn settle(self) -> Step {
        match self {
            Status::Ready => Step {
                next: Status::Idle,
                reply: Reply::Frame,
                effect: None,
            },
            Status::UpdateStart => Step {
                next: Status::UpdateBusy,
                reply: Reply::Ack,
                effect: None,
            },
            Status::UpdateDone => Step {
                next: Status::UpdateDone,
                reply: Reply::Ack,
                effect: Some(Effect::PersistVersionAndRestart),
            },
            other => Step::quiet(other),
        }
    }

    /// Full step: handler event, then reply policy
    pub fn step(self, event: Event) -> Step {
        if event.is_failure() {
            return Step {
                next: Status::Idle,
                reply: Reply::Nack,
                effect: None,
            };
        }
        self.transition(event).settle()
    }
}
