use super::*;
use crate::event::{ItemPatch, QueueEvent};
use spindle_core::item::SourceKind;

fn create_disc(state: &mut QueueState, fingerprint: &str, at_ms: u64) -> ItemId {
    let id = state.next_id();
    state.apply_event(&QueueEvent::ItemCreated {
        id,
        source_kind: SourceKind::Disc,
        disc_fingerprint: Some(fingerprint.into()),
        disc_title: Some("Title".into()),
        source_path: None,
        at_ms,
    });
    id
}

#[test]
fn created_item_is_findable_by_fingerprint_case_insensitively() {
    let mut state = QueueState::new();
    let id = create_disc(&mut state, "AbC123", 0);

    let found = state.find_by_fingerprint("abc123").expect("found");
    assert_eq!(found.id, id);
}

#[test]
fn applying_item_created_twice_is_idempotent() {
    let mut state = QueueState::new();
    let id = state.next_id();
    let event = QueueEvent::ItemCreated {
        id,
        source_kind: SourceKind::Disc,
        disc_fingerprint: Some("dup".into()),
        disc_title: Some("T".into()),
        source_path: None,
        at_ms: 0,
    };
    state.apply_event(&event);
    state.apply_event(&event);

    assert_eq!(state.list().count(), 1);
}

#[test]
fn claim_then_commit_moves_through_statuses_and_clears_heartbeat() {
    let mut state = QueueState::new();
    let id = create_disc(&mut state, "fp", 0);

    state.apply_event(&QueueEvent::ItemClaimed {
        id,
        to_status: Status::Identifying,
        at_ms: 5,
    });
    assert_eq!(state.get(id).unwrap().status, Status::Identifying);
    assert_eq!(state.get(id).unwrap().heartbeat_ms, Some(5));

    state.apply_event(&QueueEvent::ItemCommitted {
        id,
        to_status: Status::Identified,
        patch: ItemPatch::default(),
        at_ms: 9,
    });
    let item = state.get(id).unwrap();
    assert_eq!(item.status, Status::Identified);
    assert!(item.heartbeat_ms.is_none());
}

#[test]
fn reclaimed_item_rolls_back_and_clears_progress() {
    let mut state = QueueState::new();
    let id = create_disc(&mut state, "fp", 0);
    state.apply_event(&QueueEvent::ItemClaimed {
        id,
        to_status: Status::Ripping,
        at_ms: 1,
    });
    state.apply_event(&QueueEvent::ItemUpdated {
        id,
        patch: ItemPatch {
            progress: Some(spindle_core::item::Progress {
                stage: "rip".into(),
                percent: 40,
                message: "working".into(),
            }),
            ..Default::default()
        },
        at_ms: 2,
    });

    state.apply_event(&QueueEvent::ItemReclaimed {
        id,
        to_status: Status::Identified,
        at_ms: 3,
    });

    let item = state.get(id).unwrap();
    assert_eq!(item.status, Status::Identified);
    assert!(item.heartbeat_ms.is_none());
    assert_eq!(item.progress.percent, 0);
}

#[test]
fn retry_failed_clears_review_state_and_returns_to_pending() {
    let mut state = QueueState::new();
    let id = create_disc(&mut state, "fp", 0);
    state.apply_event(&QueueEvent::ItemStopped {
        id,
        reason: "operator stop".into(),
        at_ms: 1,
    });
    assert_eq!(state.get(id).unwrap().status, Status::Failed);

    state.apply_event(&QueueEvent::ItemRetried { id, at_ms: 2 });
    let item = state.get(id).unwrap();
    assert_eq!(item.status, Status::Pending);
    assert!(!item.review_flag);
    assert!(item.failed_at_status.is_none());
}

#[test]
fn failed_on_shutdown_only_touches_non_terminal_items() {
    let mut state = QueueState::new();
    let running = create_disc(&mut state, "running", 0);
    let done = create_disc(&mut state, "done", 0);

    state.apply_event(&QueueEvent::ItemClaimed {
        id: running,
        to_status: Status::Encoding,
        at_ms: 1,
    });
    state.apply_event(&QueueEvent::ItemCommitted {
        id: done,
        to_status: Status::Completed,
        patch: ItemPatch::default(),
        at_ms: 1,
    });

    state.apply_event(&QueueEvent::ItemsFailedOnShutdown {
        ids: vec![running, done],
        at_ms: 5,
    });

    assert_eq!(state.get(running).unwrap().status, Status::Failed);
    assert_eq!(state.get(done).unwrap().status, Status::Completed);
}
