use super::*;

use crate::lifecycle::{startup, DaemonState};
use spindle_core::config::SpindleConfig;
use std::path::PathBuf;
use tempfile::tempdir;

async fn test_daemon(dir: &std::path::Path) -> Arc<DaemonState> {
    let mut config = SpindleConfig::default();
    config.paths.staging_dir = dir.join("staging");
    config.paths.log_dir = dir.join("logs");
    config.paths.library_dir = dir.join("library");
    let layout = crate::config::Layout::from_config(&config);

    let result = startup(config, layout).await.expect("startup");
    Arc::new(result.daemon)
}

#[tokio::test]
async fn ping_responds_with_pong() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    let response = dispatch(&daemon, &shutdown, Request::Ping).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn status_reports_a_fresh_queue_as_empty() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    match dispatch(&daemon, &shutdown, Request::Status).await {
        Response::Status { status } => {
            assert_eq!(status.in_flight_count, 0);
            assert_eq!(status.failed_count, 0);
            assert_eq!(status.completed_count, 0);
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn add_file_enqueues_a_pending_item() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    let path = PathBuf::from("/videos/movie.mkv");
    match dispatch(&daemon, &shutdown, Request::AddFile { path }).await {
        Response::Added { id } => {
            let item = daemon.store.get_by_id(id).expect("item present");
            assert_eq!(item.status, Status::Pending);
        }
        other => panic!("expected Added, got {other:?}"),
    }
}

#[tokio::test]
async fn retry_silently_skips_an_id_that_is_not_failed() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    let id = daemon.store.new_file(PathBuf::from("/videos/a.mkv")).unwrap();
    let response = dispatch(&daemon, &shutdown, Request::Retry { ids: vec![id] }).await;
    assert_eq!(response, Response::Acted { ids: Vec::new() });
}

#[tokio::test]
async fn clear_completed_reports_the_number_pruned() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    let response = dispatch(&daemon, &shutdown, Request::ClearCompleted).await;
    assert_eq!(response, Response::Cleared { count: 0 });
}

#[tokio::test]
async fn shutdown_cancels_the_token_and_responds_shutting_down() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path()).await;
    let shutdown = CancellationToken::new();

    let response = dispatch(&daemon, &shutdown, Request::Shutdown).await;
    assert_eq!(response, Response::ShuttingDown);
    assert!(shutdown.is_cancelled());
}
