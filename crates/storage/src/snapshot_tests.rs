use super::*;
use tempfile::tempdir;

#[test]
fn save_then_load_roundtrips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");

    let mut state = QueueState::new();
    let id = state.next_id();
    state.apply_event(&crate::event::QueueEvent::ItemCreated {
        id,
        source_kind: spindle_core::item::SourceKind::Disc,
        disc_fingerprint: Some("F00".into()),
        disc_title: Some("A Movie".into()),
        source_path: None,
        at_ms: 10,
    });

    let snapshot = Snapshot::new(5, state, 10);
    snapshot.save(&path).expect("save");

    let loaded = Snapshot::load(&path).expect("load").expect("present");
    assert_eq!(loaded.seq, 5);
    assert!(loaded.state.find_by_fingerprint("f00").is_some());
}

#[test]
fn load_missing_file_returns_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.json");
    assert!(Snapshot::load(&path).expect("load").is_none());
}

#[test]
fn load_corrupt_file_rotates_to_bak_and_returns_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    fs::write(&path, b"not json").expect("write garbage");

    let result = Snapshot::load(&path).expect("load should not error");
    assert!(result.is_none());
    assert!(path.with_extension("json.bak").exists());
}

#[test]
fn rotate_bak_path_uses_numbered_slots_once_base_exists() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    fs::write(path.with_extension("json.bak"), b"1").expect("write");

    let next = rotate_bak_path(&path);
    assert_eq!(next, path.with_extension("json.bak.1"));
}
