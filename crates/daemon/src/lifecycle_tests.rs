use super::*;

use fs2::FileExt;
use spindle_core::config::SpindleConfig;
use std::io::Write;
use tempfile::tempdir;

fn test_config(dir: &std::path::Path) -> (SpindleConfig, Layout) {
    let mut config = SpindleConfig::default();
    config.paths.staging_dir = dir.join("staging");
    config.paths.log_dir = dir.join("logs");
    config.paths.library_dir = dir.join("library");
    let layout = Layout::from_config(&config);
    (config, layout)
}

#[tokio::test]
async fn startup_creates_the_fixed_layout_and_binds_the_socket() {
    let dir = tempdir().unwrap();
    let (config, layout) = test_config(dir.path());

    let result = startup(config, layout.clone()).await.unwrap();

    assert!(layout.lock_path.exists());
    assert!(layout.socket_path.exists());
    assert!(layout.items_log_dir.is_dir());
    assert!(layout.staging_dir.is_dir());

    result.daemon.shutdown();
    assert!(!layout.socket_path.exists());
    assert!(!layout.lock_path.exists());
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    // Simulate a running daemon by holding the lock and creating its files.
    // A second startup attempt must fail without deleting anything.
    let dir = tempdir().unwrap();
    let (config, layout) = test_config(dir.path());
    std::fs::create_dir_all(layout.socket_path.parent().unwrap()).unwrap();

    std::fs::write(&layout.socket_path, b"").unwrap();

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&layout.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&layout.lock_path, b"12345").unwrap();

    match startup(config, layout.clone()).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(
        layout.socket_path.exists(),
        "socket file must not be deleted on LockFailed"
    );
    assert!(
        layout.lock_path.exists(),
        "lock file must not be deleted on LockFailed"
    );
}

#[test]
fn lock_file_not_truncated_before_lock_acquired() {
    // Verify that opening the lock file for locking does not truncate it.
    // A running daemon's PID must survive another process opening the file.
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("test.lock");

    let running_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();
    running_lock.lock_exclusive().unwrap();
    let mut f = &running_lock;
    writeln!(f, "99999").unwrap();

    let _second = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();

    let content = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(
        content.trim(),
        "99999",
        "lock file content must not be truncated by another open"
    );
}

#[test]
fn cleanup_on_failure_removes_created_files() {
    let dir = tempdir().unwrap();
    let (_config, layout) = test_config(dir.path());
    std::fs::create_dir_all(layout.socket_path.parent().unwrap()).unwrap();

    std::fs::write(&layout.socket_path, b"").unwrap();
    std::fs::write(&layout.lock_path, b"12345").unwrap();

    cleanup_on_failure(&layout);

    assert!(
        !layout.socket_path.exists(),
        "socket should be cleaned up on non-lock failure"
    );
    assert!(
        !layout.lock_path.exists(),
        "lock file should be cleaned up on non-lock failure"
    );
}
