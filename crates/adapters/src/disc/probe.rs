// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::subprocess::{run_with_timeout, MAKEMKV_INFO_TIMEOUT};
use async_trait::async_trait;
use spindle_engine::{DiscInfo, DiscProbe, MonitorError};
use tokio::process::Command;

/// Reads the drive's current contents via `makemkvcon -r info disc:<index>`.
/// `makemkvcon`'s robot-mode output (`-r`) reports one `DRV:` line per
/// drive; field 1 is the drive state (0 = empty) and, when a disc is
/// present, field 5 is the disc's volume label.
pub struct MakemkvDiscProbe {
    drive_index: u32,
}

impl MakemkvDiscProbe {
    pub fn new(drive_index: u32) -> Self {
        Self { drive_index }
    }
}

#[async_trait]
impl DiscProbe for MakemkvDiscProbe {
    async fn probe(&self) -> Result<Option<DiscInfo>, MonitorError> {
        let mut cmd = Command::new("makemkvcon");
        cmd.args(["-r", "info", &format!("disc:{}", self.drive_index)]);
        let output = run_with_timeout(cmd, MAKEMKV_INFO_TIMEOUT, "makemkvcon info")
            .await
            .map_err(|e| MonitorError::Probe(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Probe(format!("makemkvcon exited with {}: {stderr}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_drive_info(&stdout)
    }
}

/// Scans robot-mode `DRV:` lines for the configured drive and extracts its
/// label. Returns `Ok(None)` for an empty or unrecognized tray rather than
/// treating that as a probe failure.
fn parse_drive_info(stdout: &str) -> Result<Option<DiscInfo>, MonitorError> {
    for line in stdout.lines() {
        let Some(rest) = line.strip_prefix("DRV:") else {
            continue;
        };
        let fields: Vec<&str> = rest.split(',').collect();
        if fields.len() < 6 {
            continue;
        }
        let state: i32 = fields[1].trim().parse().unwrap_or(0);
        if state == 0 {
            continue;
        }
        let label = fields[5].trim().trim_matches('"');
        if label.is_empty() {
            continue;
        }
        return Ok(Some(DiscInfo {
            label: label.to_string(),
            media_type: "optical".to_string(),
        }));
    }
    Ok(None)
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
