// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic point-in-time dump of `QueueState`, used to bound WAL replay time.
//!
//! Written as tmp-file-then-rename so a crash mid-write never leaves a
//! partially written snapshot in place of a good one. A snapshot that fails
//! to parse on load is rotated to `.bak` rather than deleted.

use crate::state::QueueState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// How many rotated `.bak` files to keep around a given snapshot path.
const MAX_BAK_FILES: usize = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The highest WAL seq reflected in `state`.
    pub seq: u64,
    pub state: QueueState,
    pub created_at_ms: u64,
}

impl Snapshot {
    pub fn new(seq: u64, state: QueueState, created_at_ms: u64) -> Self {
        Self {
            seq,
            state,
            created_at_ms,
        }
    }

    /// Atomically overwrite the snapshot at `path`.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp_path, &json)?;

        let file = fs::File::open(&tmp_path)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load the snapshot at `path`. Returns `Ok(None)` if no snapshot exists
    /// yet (first run). A corrupt snapshot is rotated to `.bak` and treated
    /// as absent so the daemon falls back to full WAL replay.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    path = %path.display(),
                    bak = %bak_path.display(),
                    error = %e,
                    "corrupt snapshot, rotating to .bak and falling back to WAL replay",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

/// Picks the next free `<path>.bak`, `<path>.bak.1`, ... slot, evicting the
/// oldest once `MAX_BAK_FILES` exist.
pub fn rotate_bak_path(path: &Path) -> PathBuf {
    let base_bak = path.with_extension(bak_extension(path));

    if !base_bak.exists() {
        return base_bak;
    }

    for i in 1..MAX_BAK_FILES {
        let candidate = numbered_bak_path(path, i);
        if !candidate.exists() {
            return candidate;
        }
    }

    for i in 1..MAX_BAK_FILES {
        let src = numbered_bak_path(path, i);
        let dst = numbered_bak_path(path, i - 1);
        if i == 1 {
            let _ = fs::remove_file(&dst);
        }
        let _ = fs::rename(&src, &dst);
    }

    numbered_bak_path(path, MAX_BAK_FILES - 1)
}

fn bak_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.bak"),
        None => "bak".to_string(),
    }
}

fn numbered_bak_path(path: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return path.with_extension(bak_extension(path));
    }
    let ext = bak_extension(path);
    path.with_extension(format!("{ext}.{n}"))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
