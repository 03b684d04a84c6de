use super::*;
use crate::monitor::{DiscInfo, DiscMonitor, DiscProbe, FingerprintProvider, MonitorError};
use crate::registry::StageRegistry;
use async_trait::async_trait;
use spindle_core::clock::FakeClock;
use spindle_core::status::Status;
use spindle_storage::StorePaths;
use tempfile::tempdir;

struct EmptyDrive;

#[async_trait]
impl DiscProbe for EmptyDrive {
    async fn probe(&self) -> Result<Option<DiscInfo>, MonitorError> {
        Ok(None)
    }
}

struct UnusedFingerprint;

#[async_trait]
impl FingerprintProvider for UnusedFingerprint {
    async fn fingerprint(&self, _disc: &DiscInfo) -> Result<String, MonitorError> {
        unreachable!("no disc is ever probed in this test")
    }
}

#[tokio::test]
async fn run_resets_stuck_items_at_startup_and_fails_active_items_on_shutdown() {
    let dir = tempdir().expect("tempdir");
    let paths = StorePaths {
        wal_path: dir.path().join("queue.wal"),
        snapshot_path: dir.path().join("snapshot.json"),
    };
    let store = Arc::new(
        QueueStore::open(paths, Arc::new(FakeClock::new(0))).expect("open store"),
    );
    let id = store.new_disc("Movie".into(), "FP1".into()).expect("insert");
    store
        .claim_next_ready(&[Status::Pending])
        .expect("claim")
        .expect("claimed");

    let runtime = Runtime::new(
        store.clone(),
        Arc::new(StageRegistry::new()),
        DiscArbiter::new(),
        WorkflowConfig {
            worker_count: 1,
            ..WorkflowConfig::default()
        },
        Vec::new(),
        dir.path().join("items"),
    );
    let monitor = DiscMonitor::new(
        store.clone(),
        DiscArbiter::new(),
        Arc::new(StageRegistry::new()),
        Arc::new(EmptyDrive),
        Arc::new(UnusedFingerprint),
        Duration::from_secs(60),
    );

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    Runtime::run(&runtime, Arc::new(monitor), shutdown)
        .await
        .expect("run completes");

    let item = store.get_by_id(id).unwrap();
    assert_eq!(item.status, Status::Failed);
    assert_eq!(
        item.review_reason.as_deref(),
        Some("active at shutdown")
    );
}

#[tokio::test]
async fn run_aborts_when_a_required_dependency_is_missing() {
    let dir = tempdir().expect("tempdir");
    let paths = StorePaths {
        wal_path: dir.path().join("queue.wal"),
        snapshot_path: dir.path().join("snapshot.json"),
    };
    let store = Arc::new(
        QueueStore::open(paths, Arc::new(FakeClock::new(0))).expect("open store"),
    );

    struct MissingBinary;
    #[async_trait]
    impl DependencyProbe for MissingBinary {
        fn name(&self) -> &str {
            "makemkvcon"
        }
        async fn is_available(&self) -> bool {
            false
        }
    }

    let runtime = Runtime::new(
        store.clone(),
        Arc::new(StageRegistry::new()),
        DiscArbiter::new(),
        WorkflowConfig::default(),
        vec![Arc::new(MissingBinary)],
        dir.path().join("items"),
    );
    let monitor = DiscMonitor::new(
        store,
        DiscArbiter::new(),
        Arc::new(StageRegistry::new()),
        Arc::new(EmptyDrive),
        Arc::new(UnusedFingerprint),
        Duration::from_secs(60),
    );

    let shutdown = CancellationToken::new();
    let err = Runtime::run(&runtime, Arc::new(monitor), shutdown)
        .await
        .expect_err("missing required dependency aborts startup");
    assert!(matches!(err, EngineError::DependencyMissing(name) if name == "makemkvcon"));
}

#[tokio::test]
async fn status_reports_probe_results_even_after_a_failed_startup() {
    let dir = tempdir().expect("tempdir");
    let paths = StorePaths {
        wal_path: dir.path().join("queue.wal"),
        snapshot_path: dir.path().join("snapshot.json"),
    };
    let store = Arc::new(
        QueueStore::open(paths, Arc::new(FakeClock::new(0))).expect("open store"),
    );

    struct MissingBinary;
    #[async_trait]
    impl DependencyProbe for MissingBinary {
        fn name(&self) -> &str {
            "whisperx"
        }
        async fn is_available(&self) -> bool {
            false
        }
        fn required(&self) -> bool {
            false
        }
    }

    let runtime = Runtime::new(
        store.clone(),
        Arc::new(StageRegistry::new()),
        DiscArbiter::new(),
        WorkflowConfig::default(),
        vec![Arc::new(MissingBinary)],
        dir.path().join("items"),
    );
    let monitor = DiscMonitor::new(
        store,
        DiscArbiter::new(),
        Arc::new(StageRegistry::new()),
        Arc::new(EmptyDrive),
        Arc::new(UnusedFingerprint),
        Duration::from_secs(60),
    );

    assert!(runtime.status().dependencies.is_empty());

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    Runtime::run(&runtime, Arc::new(monitor), shutdown)
        .await
        .expect("optional dependency never aborts startup");

    assert_eq!(
        runtime.status().dependencies,
        vec![("whisperx".to_string(), false)]
    );
}
