// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown (spec.md §4.5): acquires the exclusive
//! lock, opens the queue store, wires every adapter into the stage
//! registry, constructs the `Runtime`, and binds the IPC socket last, only
//! once every earlier step has succeeded.

use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use spindle_adapters::{
    AudioAnalyzeHandler, BinaryDependencyProbe, EncodeHandler, EpisodeIdentifyHandler,
    HttpTmdbAdapter, IdentifyHandler, LibraryRefresh, MakemkvDiscProbe, MakemkvFingerprintProvider,
    OrganizeHandler, PlexRefresh, RipHandler, SubtitleHandler, TmdbAdapter, TmdbDependencyProbe,
};
use spindle_core::clock::SystemClock;
use spindle_core::config::SpindleConfig;
use spindle_core::status::Status;
use spindle_engine::{DependencyProbe, DiscArbiter, DiscMonitor, Runtime, StageRegistry};
use spindle_storage::{QueueStore, StorePaths};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::{drive_index_from_path, Layout};

pub struct DaemonState {
    pub store: Arc<QueueStore>,
    pub runtime: Arc<Runtime>,
    pub monitor: Arc<DiscMonitor>,
    pub layout: Layout,
    pub start_time: Instant,
    #[allow(dead_code)]
    lock_file: File,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),
    #[error("queue store error: {0}")]
    Store(#[from] spindle_storage::StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Starts the daemon, cleaning up anything it created if a later step
/// fails. A lock failure is the one exception: those files belong to
/// whichever daemon already holds the lock.
pub async fn startup(config: SpindleConfig, layout: Layout) -> Result<StartupResult, LifecycleError> {
    match startup_inner(&config, &layout).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&layout);
            }
            Err(e)
        }
    }
}

async fn startup_inner(
    config: &SpindleConfig,
    layout: &Layout,
) -> Result<StartupResult, LifecycleError> {
    if let Some(parent) = layout.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&layout.items_log_dir)?;
    std::fs::create_dir_all(&layout.staging_dir)?;
    std::fs::create_dir_all(&config.paths.library_dir)?;

    // Acquire the lock before touching anything else, via OpenOptions that
    // never truncate ahead of the lock — that would wipe a running
    // daemon's PID out from under it.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&layout.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    let store = Arc::new(QueueStore::open(
        StorePaths {
            wal_path: layout.wal_path.clone(),
            snapshot_path: layout.snapshot_path.clone(),
        },
        Arc::new(SystemClock),
    )?);

    let drive_index = drive_index_from_path(&config.makemkv.optical_drive);

    let tmdb: Arc<dyn TmdbAdapter> =
        Arc::new(HttpTmdbAdapter::new(config.tmdb.api_key.clone().unwrap_or_default()));

    let refresh = if config.plex.enabled {
        match (&config.plex.url, &config.plex.token) {
            (Some(url), Some(token)) => {
                Some(Box::new(PlexRefresh::new(url.clone(), token.clone())) as Box<dyn LibraryRefresh>)
            }
            _ => {
                warn!("plex.enabled is set but url/token are missing, skipping refresh hook");
                None
            }
        }
    } else {
        None
    };

    let mut registry = StageRegistry::new();
    registry.register(
        Status::Identifying,
        Arc::new(IdentifyHandler::new(Arc::clone(&tmdb), drive_index)),
    );
    registry.register(
        Status::Ripping,
        Arc::new(RipHandler::new(layout.staging_dir.clone(), drive_index)),
    );
    registry.register(
        Status::EpisodeIdentifying,
        Arc::new(EpisodeIdentifyHandler::new(Arc::clone(&tmdb))),
    );
    registry.register(
        Status::Encoding,
        Arc::new(EncodeHandler::new(
            config.drapto.preset.clone().unwrap_or_default(),
        )),
    );
    registry.register(Status::AudioAnalyzing, Arc::new(AudioAnalyzeHandler::new()));
    registry.register(
        Status::Subtitling,
        Arc::new(SubtitleHandler::new(
            config.whisperx.enabled,
            config
                .whisperx
                .model_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )),
    );
    registry.register(
        Status::Organizing,
        Arc::new(OrganizeHandler::new(config.paths.library_dir.clone(), refresh)),
    );
    let registry = Arc::new(registry);

    let arbiter = DiscArbiter::new();

    let dependency_probes: Vec<Arc<dyn DependencyProbe>> = vec![
        Arc::new(BinaryDependencyProbe::new(
            "makemkv",
            "makemkvcon",
            "--version",
        )),
        Arc::new(BinaryDependencyProbe::new("drapto", "drapto", "--version")),
        Arc::new(BinaryDependencyProbe::new("ffprobe", "ffprobe", "-version")),
        if config.whisperx.enabled {
            Arc::new(BinaryDependencyProbe::new("whisperx", "whisperx", "--help"))
        } else {
            Arc::new(BinaryDependencyProbe::new("whisperx", "whisperx", "--help").optional())
        },
        Arc::new(TmdbDependencyProbe::new(Arc::clone(&tmdb))),
    ];

    let runtime = Runtime::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        Arc::clone(&arbiter),
        config.workflow.clone(),
        dependency_probes,
        layout.items_log_dir.clone(),
    );

    let monitor = Arc::new(DiscMonitor::new(
        Arc::clone(&store),
        Arc::clone(&arbiter),
        Arc::clone(&registry),
        Arc::new(MakemkvDiscProbe::new(drive_index)),
        Arc::new(MakemkvFingerprintProvider::new()),
        Duration::from_secs(config.workflow.disc_monitor_timeout_secs.max(1)),
    ));

    // Remove a stale socket and bind last, only once every earlier
    // fallible step has already succeeded.
    if layout.socket_path.exists() {
        std::fs::remove_file(&layout.socket_path)?;
    }
    let listener = UnixListener::bind(&layout.socket_path)
        .map_err(|e| LifecycleError::BindFailed(layout.socket_path.clone(), e))?;

    info!("daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            store,
            runtime,
            monitor,
            layout: layout.clone(),
            start_time: Instant::now(),
            lock_file,
        },
        listener,
    })
}

impl DaemonState {
    /// Shuts the daemon down: checkpoints the queue store to a fresh
    /// snapshot, then removes the socket and lock files. The lock itself
    /// releases when `lock_file` drops.
    pub fn shutdown(&self) {
        info!("shutting down daemon...");
        if let Err(e) = self.store.checkpoint() {
            warn!(error = %e, "failed to checkpoint queue store on shutdown");
        }
        if self.layout.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.layout.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.layout.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.layout.lock_path) {
                warn!(error = %e, "failed to remove lock file");
            }
        }
        info!("daemon shutdown complete");
    }
}

fn cleanup_on_failure(layout: &Layout) {
    if layout.socket_path.exists() {
        let _ = std::fs::remove_file(&layout.socket_path);
    }
    if layout.lock_path.exists() {
        let _ = std::fs::remove_file(&layout.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
