use super::*;
use spindle_core::clock::FakeClock;
use spindle_storage::StorePaths;
use std::sync::Mutex as StdMutex;
use tempfile::tempdir;

struct FixedProbe {
    disc: StdMutex<Option<DiscInfo>>,
}

#[async_trait]
impl DiscProbe for FixedProbe {
    async fn probe(&self) -> Result<Option<DiscInfo>, MonitorError> {
        Ok(self.disc.lock().expect("lock").clone())
    }
}

struct FixedFingerprint(String);

#[async_trait]
impl FingerprintProvider for FixedFingerprint {
    async fn fingerprint(&self, _disc: &DiscInfo) -> Result<String, MonitorError> {
        Ok(self.0.clone())
    }
}

fn make_monitor(
    store: Arc<QueueStore>,
    registry: Arc<StageRegistry>,
    disc: Option<DiscInfo>,
    fingerprint: &str,
) -> DiscMonitor {
    DiscMonitor::new(
        store,
        DiscArbiter::new(),
        registry,
        Arc::new(FixedProbe {
            disc: StdMutex::new(disc),
        }),
        Arc::new(FixedFingerprint(fingerprint.to_string())),
        Duration::from_secs(5),
    )
}

fn open_store(dir: &std::path::Path) -> Arc<QueueStore> {
    let paths = StorePaths {
        wal_path: dir.join("queue.wal"),
        snapshot_path: dir.join("snapshot.json"),
    };
    Arc::new(QueueStore::open(paths, Arc::new(FakeClock::new(0))).expect("open store"))
}

#[tokio::test]
async fn new_disc_is_inserted_as_pending() {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let registry = Arc::new(StageRegistry::new());
    let monitor = make_monitor(
        store.clone(),
        registry,
        Some(DiscInfo {
            label: "MOVIE_01".into(),
            media_type: "bluray".into(),
        }),
        "f1",
    );

    monitor.on_detected().await.expect("cycle");

    let items = store.list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, Status::Pending);
    assert_eq!(items[0].disc_fingerprint.as_deref(), Some("f1"));
}

#[tokio::test]
async fn reinsertion_of_completed_disc_is_left_untouched() {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let id = store.new_disc("MOVIE_01".into(), "f1".into()).expect("insert");
    // Drive it straight to completed for this test's purposes.
    let mut status = Status::Pending;
    while let Some(next) = status.in_flight_successor() {
        store.claim_next_ready(&[status]).expect("claim");
        store
            .commit_completion(id, next.next_on_success().unwrap(), Default::default())
            .expect("commit");
        status = next.next_on_success().unwrap();
        if status == Status::Completed {
            break;
        }
    }
    assert_eq!(store.get_by_id(id).unwrap().status, Status::Completed);

    let registry = Arc::new(StageRegistry::new());
    let monitor = make_monitor(
        store.clone(),
        registry,
        Some(DiscInfo {
            label: "MOVIE_01".into(),
            media_type: "bluray".into(),
        }),
        "f1",
    );
    monitor.on_detected().await.expect("cycle");

    assert_eq!(store.list().len(), 1);
    assert_eq!(store.get_by_id(id).unwrap().status, Status::Completed);
}

#[tokio::test]
async fn failed_disc_is_reset_to_pending_on_reinsertion() {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let id = store.new_disc("MOVIE_01".into(), "f1".into()).expect("insert");
    store.stop_items(&[id], "operator requested stop").expect("stop");
    assert_eq!(store.get_by_id(id).unwrap().status, Status::Failed);

    let registry = Arc::new(StageRegistry::new());
    let monitor = make_monitor(
        store.clone(),
        registry,
        Some(DiscInfo {
            label: "MOVIE_01".into(),
            media_type: "bluray".into(),
        }),
        "f1",
    );
    monitor.on_detected().await.expect("cycle");

    let item = store.get_by_id(id).unwrap();
    assert_eq!(item.status, Status::Pending);
    assert!(!item.review_flag);
}

#[tokio::test]
async fn empty_drive_is_a_noop() {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let registry = Arc::new(StageRegistry::new());
    let monitor = make_monitor(store.clone(), registry, None, "unused");

    monitor.on_detected().await.expect("cycle");
    assert!(store.list().is_empty());
}
