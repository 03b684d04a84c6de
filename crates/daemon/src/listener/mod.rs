// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC accept loop and request dispatch (spec.md §6.4, SPEC_FULL.md §11):
//! one task per connection, each request mapped onto `DaemonState`'s store
//! and runtime.

use std::path::PathBuf;
use std::sync::Arc;

use spindle_core::id::ItemId;
use spindle_core::status::Status;
use spindle_engine::{EngineStatus, WorkerPhase};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::lifecycle::DaemonState;
use crate::protocol::{Request, Response, StatusPayload, WorkerEntry};
use crate::protocol_wire::{self, DEFAULT_TIMEOUT};

/// Accepts connections on `listener` until `shutdown` fires. Each
/// connection runs on its own task so one slow or stuck client can never
/// block another.
pub async fn run(daemon: Arc<DaemonState>, listener: UnixListener, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let daemon = Arc::clone(&daemon);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, daemon, shutdown).await {
                                warn!(error = %e, "ipc connection ended with an error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept ipc connection"),
                }
            }
            _ = shutdown.cancelled() => {
                info!("ipc listener stopping");
                return;
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    daemon: Arc<DaemonState>,
    shutdown: CancellationToken,
) -> Result<(), protocol_wire::ProtocolError> {
    loop {
        let request = match protocol_wire::read_request(&mut stream, DEFAULT_TIMEOUT).await {
            Ok(request) => request,
            Err(protocol_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let response = dispatch(&daemon, &shutdown, request).await;
        let shutting_down = matches!(response, Response::ShuttingDown);
        protocol_wire::write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;
        if shutting_down {
            return Ok(());
        }
    }
}

async fn dispatch(daemon: &Arc<DaemonState>, shutdown: &CancellationToken, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Status => Response::Status {
            status: build_status_payload(daemon),
        },
        Request::StopItems { ids } => stop_items(daemon, ids),
        Request::Retry { ids } => retry_items(daemon, ids),
        Request::ClearCompleted => clear_by_status(daemon, Status::Completed),
        Request::ClearFailed => clear_by_status(daemon, Status::Failed),
        Request::ResetStuck => reset_stuck(daemon),
        Request::AddDisc => add_disc(daemon).await,
        Request::AddFile { path } => add_file(daemon, path),
        Request::Shutdown => {
            info!("shutdown requested over ipc");
            shutdown.cancel();
            Response::ShuttingDown
        }
    }
}

fn build_status_payload(daemon: &DaemonState) -> StatusPayload {
    let EngineStatus {
        running,
        workers,
        in_flight_count,
        ready_counts_by_status,
        failed_count,
        completed_count,
        dependencies,
    } = daemon.runtime.status();

    StatusPayload {
        running,
        workers: workers
            .into_iter()
            .map(|w| WorkerEntry {
                state: match w.phase {
                    WorkerPhase::Idle => "idle".to_string(),
                    WorkerPhase::Working => "working".to_string(),
                },
                current_item: w.current_item,
                stage: w.stage,
                since_ms: w.since_ms,
            })
            .collect(),
        in_flight_count,
        ready_counts_by_status,
        failed_count,
        completed_count,
        dependencies,
    }
}

/// An in-flight item is cancelled cooperatively and left for its worker to
/// fail with a review reason; anything else (ready, pending, stuck) is
/// moved straight to `Failed` since no worker is there to notice a token.
fn stop_items(daemon: &DaemonState, ids: Vec<ItemId>) -> Response {
    let mut acted = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(item) = daemon.store.get_by_id(id) else {
            continue;
        };
        let result = if item.status.is_in_flight() {
            daemon.runtime.request_stop(id);
            Ok(())
        } else {
            daemon.store.stop_items(&[id], "stopped by operator")
        };
        match result {
            Ok(()) => acted.push(id),
            Err(e) => return Response::Error { message: e.to_string() },
        }
    }
    Response::Acted { ids: acted }
}

fn retry_items(daemon: &DaemonState, ids: Vec<ItemId>) -> Response {
    let mut acted = Vec::with_capacity(ids.len());
    for id in ids {
        match daemon.store.retry_failed(id) {
            Ok(()) => acted.push(id),
            Err(spindle_storage::StoreError::NotFailed { .. }) => continue,
            Err(spindle_storage::StoreError::NotFound(_)) => continue,
            Err(e) => return Response::Error { message: e.to_string() },
        }
    }
    Response::Acted { ids: acted }
}

fn clear_by_status(daemon: &DaemonState, status: Status) -> Response {
    match daemon.store.prune_by_status(status) {
        Ok(ids) => Response::Cleared { count: ids.len() },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

fn reset_stuck(daemon: &DaemonState) -> Response {
    match daemon.store.reset_stuck_processing() {
        Ok(ids) => Response::Acted { ids },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

/// Runs one disc-monitor detection cycle immediately, bypassing its poll
/// cadence. Reconciliation happens inside `DiscMonitor::on_detected`; there
/// is nothing item-specific to report back, so `ids` is always empty.
async fn add_disc(daemon: &DaemonState) -> Response {
    match daemon.monitor.on_detected().await {
        Ok(()) => Response::Acted { ids: Vec::new() },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

fn add_file(daemon: &DaemonState, path: PathBuf) -> Response {
    match daemon.store.new_file(path) {
        Ok(id) => Response::Added { id },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
