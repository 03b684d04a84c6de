use super::*;
use crate::event::QueueEvent;
use spindle_core::id::ItemId;
use tempfile::tempdir;

fn sample_event(id: u64) -> QueueEvent {
    QueueEvent::ItemCreated {
        id: ItemId::new(id),
        source_kind: spindle_core::item::SourceKind::Disc,
        disc_fingerprint: Some(format!("fp{id}")),
        disc_title: Some("Some Movie".into()),
        source_path: None,
        at_ms: 1_000 + id,
    }
}

#[test]
fn append_then_flush_is_visible_to_a_fresh_reader() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.wal");

    let mut wal = Wal::open(&path, 0).expect("open");
    wal.append(&sample_event(1)).expect("append");
    wal.append(&sample_event(2)).expect("append");
    wal.flush().expect("flush");

    let entries = wal.entries_after(0).expect("entries_after");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn next_unprocessed_returns_entries_in_order_then_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.wal");

    let mut wal = Wal::open(&path, 0).expect("open");
    wal.append(&sample_event(1)).expect("append");
    wal.append(&sample_event(2)).expect("append");

    let first = wal.next_unprocessed().expect("next").expect("some");
    assert_eq!(first.seq, 1);
    wal.mark_processed(first.seq);

    let second = wal.next_unprocessed().expect("next").expect("some");
    assert_eq!(second.seq, 2);
    wal.mark_processed(second.seq);

    assert!(wal.next_unprocessed().expect("next").is_none());
}

#[test]
fn reopen_resumes_from_processed_seq() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.wal");

    {
        let mut wal = Wal::open(&path, 0).expect("open");
        wal.append(&sample_event(1)).expect("append");
        wal.append(&sample_event(2)).expect("append");
        wal.flush().expect("flush");
    }

    let mut wal = Wal::open(&path, 1).expect("reopen");
    let entry = wal.next_unprocessed().expect("next").expect("some");
    assert_eq!(entry.seq, 2);
}

#[test]
fn truncate_before_drops_processed_prefix_but_keeps_tail() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.wal");

    let mut wal = Wal::open(&path, 0).expect("open");
    for i in 1..=5 {
        wal.append(&sample_event(i)).expect("append");
    }
    wal.flush().expect("flush");
    wal.mark_processed(3);
    wal.truncate_before(4).expect("truncate");

    let remaining = wal.entries_after(0).expect("entries_after");
    let seqs: Vec<u64> = remaining.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![4, 5]);
}

#[test]
fn corrupt_tail_is_rotated_to_bak_and_valid_entries_survive() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.wal");

    {
        let mut wal = Wal::open(&path, 0).expect("open");
        wal.append(&sample_event(1)).expect("append");
        wal.flush().expect("flush");
    }

    {
        use std::io::Write as _;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .expect("open for append");
        file.write_all(b"{not valid json\n").expect("write garbage");
    }

    let wal = Wal::open(&path, 0).expect("reopen after corruption");
    let entries = wal.entries_after(0).expect("entries_after");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 1);

    let bak_exists = std::fs::read_dir(dir.path())
        .expect("read_dir")
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().ends_with(".bak"));
    assert!(bak_exists, "expected a .bak file after corruption recovery");
}
