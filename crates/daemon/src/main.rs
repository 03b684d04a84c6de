// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! spindled: the Spindle daemon (spec.md §4.5). Acquires the pipeline's
//! exclusive lock, opens the queue store, and runs the worker pool, disc
//! monitor, and IPC listener until asked to stop.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod lifecycle;
mod listener;
mod protocol;
mod protocol_wire;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Layout;
use crate::lifecycle::{LifecycleError, StartupResult};

/// Exit codes per spec.md §6.5.
mod exit {
    pub const SUCCESS: i32 = 0;
    pub const GENERIC_FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const ALREADY_RUNNING: i32 = 3;
    pub const DEPENDENCY_MISSING: i32 = 4;
}

const DEFAULT_CONFIG_PATH: &str = "/etc/spindle/config.toml";

/// Config path resolution: a positional CLI argument wins, then
/// `SPINDLE_CONFIG`, then the fixed system default.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("SPINDLE_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[tokio::main]
async fn main() {
    let path = config_path();
    let config = match config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error loading config {}: {e}", path.display());
            std::process::exit(exit::CONFIG_ERROR);
        }
    };

    let layout = Layout::from_config(&config);
    let _log_guard = setup_logging(&layout);

    info!("starting spindle daemon");

    let StartupResult { daemon, listener } =
        match lifecycle::startup(config, layout.clone()).await {
            Ok(result) => result,
            Err(LifecycleError::LockFailed(_)) => {
                eprintln!(
                    "spindled is already running (lock held at {})",
                    layout.lock_path.display()
                );
                std::process::exit(exit::ALREADY_RUNNING);
            }
            Err(e) => {
                error!(error = %e, "failed to start daemon");
                std::process::exit(exit::GENERIC_FAILURE);
            }
        };

    let daemon = Arc::new(daemon);
    let shutdown = CancellationToken::new();

    tokio::spawn(listener::run(
        Arc::clone(&daemon),
        listener,
        shutdown.clone(),
    ));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
            }
            shutdown.cancel();
        });
    }

    println!("READY");
    info!(socket = %daemon.layout.socket_path.display(), "daemon ready");

    let monitor = Arc::clone(&daemon.monitor);
    let result = spindle_engine::Runtime::run(&daemon.runtime, monitor, shutdown).await;

    daemon.shutdown();

    match result {
        Ok(()) => std::process::exit(exit::SUCCESS),
        Err(spindle_engine::EngineError::DependencyMissing(name)) => {
            error!(dependency = %name, "required dependency missing, daemon exiting");
            std::process::exit(exit::DEPENDENCY_MISSING);
        }
        Err(e) => {
            error!(error = %e, "daemon exited with an error");
            std::process::exit(exit::GENERIC_FAILURE);
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Opens this run's process log (spec.md §6.3: `spindle-<runid>.log`) and
/// points the fixed `spindle.log` symlink at it, so an operator tailing
/// `spindle.log` keeps following the daemon across restarts.
fn setup_logging(layout: &Layout) -> tracing_appender::non_blocking::WorkerGuard {
    use spindle_core::id::{IdGen, RunId, UuidIdGen};
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let _ = std::fs::create_dir_all(&layout.log_dir);

    let run_id = RunId::new(UuidIdGen.next());
    let run_log_path = layout.run_log_path(&run_id);
    update_log_symlink(layout, &run_log_path);

    let file_name = run_log_path
        .file_name()
        .expect("run_log_path always has a file name");
    let file_appender = tracing_appender::rolling::never(&layout.log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    guard
}

/// Replaces `spindle.log` with a fresh symlink to `run_log_path`. Failures
/// are reported to stderr but never fatal — the daemon still has its
/// per-run log file even without the convenience symlink.
fn update_log_symlink(layout: &Layout, run_log_path: &std::path::Path) {
    let link = layout.log_symlink_path();
    let _ = std::fs::remove_file(&link);
    if let Err(e) = std::os::unix::fs::symlink(run_log_path, &link) {
        eprintln!(
            "warning: failed to symlink {} -> {}: {e}",
            link.display(),
            run_log_path.display()
        );
    }
}
