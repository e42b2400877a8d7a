//! Property tests for update accounting and the reply policy

use phonebox_core::state::{Effect, ErrorKind, Event, Reply};
use phonebox_core::update::{Progress, UpdateSession};
use phonebox_core::Status;
use phonebox_protocol::{Timestamp, UpdateAnnouncement};
use proptest::prelude::*;

fn session(size: u32) -> UpdateSession {
    UpdateSession::new(&UpdateAnnouncement {
        size,
        version: [0, 1, 0, 0],
        timestamp: Timestamp::default(),
    })
}

fn any_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Idle),
        Just(Status::Header),
        Just(Status::UpdateInit),
        Just(Status::UpdateStart),
        Just(Status::UpdateBusy),
        Just(Status::UpdateDone),
        Just(Status::Payload),
        Just(Status::Ready),
    ]
}

fn any_error() -> impl Strategy<Value = ErrorKind> {
    prop_oneof![
        Just(ErrorKind::BadMagic),
        Just(ErrorKind::TooManyModules),
        Just(ErrorKind::Transport),
        Just(ErrorKind::Storage),
    ]
}

proptest! {
    #[test]
    fn completes_exactly_when_declared_size_reached(
        size in 0u32..10_000,
        chunks in proptest::collection::vec(1usize..=1024, 1..40),
    ) {
        let mut session = session(size);
        let mut total = 0u32;

        for len in chunks {
            total += len as u32;
            let progress = session.accept(len);
            prop_assert_eq!(session.received(), total);
            prop_assert_eq!(progress == Progress::Complete, total >= size);
            if progress == Progress::Complete {
                break;
            }
        }
    }

    #[test]
    fn failures_always_nack_to_idle(status in any_status(), kind in any_error()) {
        let step = status.step(Event::Failed(kind));
        prop_assert_eq!(step.next, Status::Idle);
        prop_assert_eq!(step.reply, Reply::Nack);
        prop_assert_eq!(step.effect, None);
    }

    #[test]
    fn only_completed_downloads_restart(status in any_status(), complete in any::<bool>()) {
        // UpdateDone is terminal and never handles input
        prop_assume!(status != Status::UpdateDone);
        let step = status.step(Event::ChunkAccepted { complete });
        let restarts = step.effect == Some(Effect::PersistVersionAndRestart);
        prop_assert_eq!(restarts, status == Status::UpdateBusy && complete);
    }
}
