// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers.

use crate::error::AdapterError;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for `makemkvcon -r info` disc probes.
pub const MAKEMKV_INFO_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for `makemkvcon mkv` rips. Generous: a feature-length
/// title can take the better part of an hour on an older drive.
pub const MAKEMKV_RIP_TIMEOUT: Duration = Duration::from_secs(3600 * 3);

/// Default timeout for a `drapto` encode pass.
pub const DRAPTO_TIMEOUT: Duration = Duration::from_secs(3600 * 6);

/// Default timeout for an `ffprobe` stream inspection.
pub const FFPROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for a WhisperX subtitle generation pass.
pub const WHISPERX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default timeout for a `--version`/health-check invocation.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error. The child process is killed
/// automatically when the timeout elapses, via tokio's `Child` drop impl.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, AdapterError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(AdapterError::Subprocess(format!(
            "{description} failed: {io_err}"
        ))),
        Err(_elapsed) => Err(AdapterError::Subprocess(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// Runs `<binary> --version` (or `-version`, passed via `version_flag`) as a
/// health check. `Ok(())` means the binary ran and exited; callers don't
/// need to inspect output, just reachability.
pub async fn check_binary_available(
    binary: &str,
    version_flag: &str,
) -> Result<(), AdapterError> {
    let mut cmd = Command::new(binary);
    cmd.arg(version_flag);
    match run_with_timeout(cmd, HEALTH_CHECK_TIMEOUT, binary).await {
        Ok(_output) => Ok(()),
        Err(_) => Err(AdapterError::BinaryUnavailable {
            binary: binary.to_string(),
            detail: "failed to execute".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
