// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod add;
pub mod audit;
pub mod daemon;
pub mod queue;
pub mod status;

use std::path::PathBuf;

use spindle_daemon::Layout;

use crate::client::{ClientError, DaemonClient};

/// Resolves the same config path a `spindled` instance started against
/// would use, so the CLI derives the same socket/lock paths without a
/// separate `--socket` flag to keep in sync.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("SPINDLE_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/etc/spindle/config.toml"))
}

pub fn layout_for(path: &std::path::Path) -> anyhow::Result<Layout> {
    let config = spindle_daemon::config::load(path)
        .map_err(|e| anyhow::anyhow!("loading config {}: {e}", path.display()))?;
    Ok(Layout::from_config(&config))
}

pub async fn connect(layout: &Layout) -> Result<DaemonClient, ClientError> {
    DaemonClient::connect(&layout.socket_path).await
}
