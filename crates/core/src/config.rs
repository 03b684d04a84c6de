// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration types (spec.md §6.2, SPEC_FULL.md §10).
//!
//! These are plain data; parsing the TOML file and mapping failures to exit
//! codes is `spindle-daemon`'s job. This crate only owns the shape and the
//! one cross-field invariant the engine actually depends on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error(
        "workflow.heartbeat_timeout ({timeout}s) must exceed workflow.heartbeat_interval ({interval}s)"
    )]
    HeartbeatTimeoutTooShort { interval: u64, timeout: u64 },
}

/// `[workflow]` — read directly by the engine (spec.md §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub worker_count: usize,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_timeout_secs: u64,
    pub queue_poll_interval_secs: u64,
    /// 0 = manual retry only (spec.md §9 open question: treat as opt-in).
    pub error_retry_interval_secs: u64,
    pub disc_monitor_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            heartbeat_interval_secs: 10,
            heartbeat_timeout_secs: 30,
            queue_poll_interval_secs: 2,
            error_retry_interval_secs: 0,
            disc_monitor_timeout_secs: 5,
        }
    }
}

/// `[paths]` — read directly by the engine/daemon (spec.md §6.2, §6.3).
/// `library_dir` is not read by the engine itself, but is as much a
/// required path as `staging_dir`/`log_dir`: `OrganizeHandler` has nowhere
/// else to learn the library root from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub staging_dir: PathBuf,
    pub log_dir: PathBuf,
    pub library_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("staging"),
            log_dir: PathBuf::from("logs"),
            library_dir: PathBuf::from("library"),
        }
    }
}

/// `[makemkv]` — the engine reads only `optical_drive`; the rest is
/// pass-through configuration for `spindle-adapters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MakemkvConfig {
    pub optical_drive: PathBuf,
    pub binary: String,
}

impl Default for MakemkvConfig {
    fn default() -> Self {
        Self {
            optical_drive: PathBuf::from("/dev/sr0"),
            binary: "makemkvcon".to_string(),
        }
    }
}

/// Ambient sections the engine never reads but the daemon must still parse
/// and pass through to `spindle-adapters` (SPEC_FULL.md §10).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraptoConfig {
    pub binary: String,
    pub preset: Option<String>,
}

impl Default for DraptoConfig {
    fn default() -> Self {
        Self {
            binary: "drapto".to_string(),
            preset: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfprobeConfig {
    pub binary: String,
}

impl Default for FfprobeConfig {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperxConfig {
    pub enabled: bool,
    pub model_path: Option<PathBuf>,
}

impl Default for WhisperxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub token: Option<String>,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpindleConfig {
    pub workflow: WorkflowConfig,
    pub paths: PathsConfig,
    pub makemkv: MakemkvConfig,
    pub drapto: DraptoConfig,
    pub ffprobe: FfprobeConfig,
    pub whisperx: WhisperxConfig,
    pub tmdb: TmdbConfig,
    pub plex: PlexConfig,
    pub notifications: NotificationsConfig,
}

impl SpindleConfig {
    /// Enforces spec.md §4.5: `heartbeat_timeout > heartbeat_interval`.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.workflow.heartbeat_timeout_secs <= self.workflow.heartbeat_interval_secs {
            return Err(ConfigValidationError::HeartbeatTimeoutTooShort {
                interval: self.workflow.heartbeat_interval_secs,
                timeout: self.workflow.heartbeat_timeout_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SpindleConfig::default().validate().is_ok());
    }

    #[test]
    fn equal_interval_and_timeout_is_rejected() {
        let mut cfg = SpindleConfig::default();
        cfg.workflow.heartbeat_timeout_secs = cfg.workflow.heartbeat_interval_secs;
        assert!(cfg.validate().is_err());
    }
}
