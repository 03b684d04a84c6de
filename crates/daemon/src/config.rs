// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-side configuration loading: parses the TOML file into
//! `spindle_core::config::SpindleConfig`, validates it, and derives the
//! fixed file layout under `paths.log_dir` (spec.md §6.2, §6.3).

use spindle_core::config::{ConfigValidationError, SpindleConfig};
use spindle_core::id::RunId;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
}

/// Fixed paths derived from `paths.log_dir` (spec.md §6.3): the queue
/// database, lock file, PID file, process log, and per-item log directory
/// all live here so a single `log_dir` is the only thing an operator needs
/// to point two daemon instances at different state.
#[derive(Debug, Clone)]
pub struct Layout {
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_dir: PathBuf,
    pub items_log_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl Layout {
    pub fn from_config(config: &SpindleConfig) -> Self {
        let log_dir = &config.paths.log_dir;
        Self {
            socket_path: log_dir.join("spindle.sock"),
            lock_path: log_dir.join("spindle.pid"),
            wal_path: log_dir.join("queue.wal"),
            snapshot_path: log_dir.join("queue.snapshot"),
            log_dir: log_dir.clone(),
            items_log_dir: log_dir.join("items"),
            staging_dir: config.paths.staging_dir.clone(),
        }
    }

    /// The current run's process log (spec.md §6.3): `spindle-<runid>.log`.
    pub fn run_log_path(&self, run_id: &RunId) -> PathBuf {
        self.log_dir.join(format!("spindle-{run_id}.log"))
    }

    /// The `spindle.log` symlink that always points at the current run's
    /// log file, so tailing a fixed path survives across restarts.
    pub fn log_symlink_path(&self) -> PathBuf {
        self.log_dir.join("spindle.log")
    }
}

/// Extracts the drive index `makemkvcon`'s `disc:<index>` syntax expects
/// from a device path like `/dev/sr1`, by reading the trailing digits off
/// the file name. Falls back to `0` for a path with no trailing digits
/// (e.g. a single-drive host configured as `/dev/sr0` or `/dev/dvd`).
pub fn drive_index_from_path(path: &Path) -> u32 {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let digits: String = name.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    digits.chars().rev().collect::<String>().parse().unwrap_or(0)
}

/// Loads and validates the daemon configuration from `path`.
pub fn load(path: &Path) -> Result<SpindleConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SpindleConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spindle.toml");
        std::fs::write(
            &path,
            r#"
            [workflow]
            heartbeat_interval_secs = 5
            heartbeat_timeout_secs = 20

            [paths]
            staging_dir = "/tmp/spindle/staging"
            log_dir = "/tmp/spindle/logs"
            library_dir = "/tmp/spindle/library"
            "#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.workflow.heartbeat_interval_secs, 5);
        assert_eq!(config.paths.staging_dir, PathBuf::from("/tmp/spindle/staging"));
    }

    #[test]
    fn rejects_a_config_with_an_invalid_heartbeat_relationship() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spindle.toml");
        std::fs::write(
            &path,
            r#"
            [workflow]
            heartbeat_interval_secs = 10
            heartbeat_timeout_secs = 10
            "#,
        )
        .unwrap();

        assert!(matches!(load(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_an_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(load(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn drive_index_reads_trailing_digits_from_the_device_name() {
        assert_eq!(drive_index_from_path(Path::new("/dev/sr0")), 0);
        assert_eq!(drive_index_from_path(Path::new("/dev/sr1")), 1);
        assert_eq!(drive_index_from_path(Path::new("/dev/sr12")), 12);
    }

    #[test]
    fn drive_index_defaults_to_zero_with_no_trailing_digits() {
        assert_eq!(drive_index_from_path(Path::new("/dev/dvd")), 0);
    }

    #[test]
    fn layout_derives_fixed_paths_under_log_dir() {
        let mut config = SpindleConfig::default();
        config.paths.log_dir = PathBuf::from("/tmp/spindle/logs");
        let layout = Layout::from_config(&config);
        assert_eq!(layout.socket_path, PathBuf::from("/tmp/spindle/logs/spindle.sock"));
        assert_eq!(layout.lock_path, PathBuf::from("/tmp/spindle/logs/spindle.pid"));
        assert_eq!(layout.items_log_dir, PathBuf::from("/tmp/spindle/logs/items"));
    }

    #[test]
    fn run_log_path_is_named_after_the_run_id() {
        let mut config = SpindleConfig::default();
        config.paths.log_dir = PathBuf::from("/tmp/spindle/logs");
        let layout = Layout::from_config(&config);
        let run_id = RunId::new("abc123");
        assert_eq!(
            layout.run_log_path(&run_id),
            PathBuf::from("/tmp/spindle/logs/spindle-abc123.log")
        );
        assert_eq!(layout.log_symlink_path(), PathBuf::from("/tmp/spindle/logs/spindle.log"));
    }
}
