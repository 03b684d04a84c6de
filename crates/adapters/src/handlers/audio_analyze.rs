// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::completed_section;
use crate::error::AdapterError;
use crate::subprocess::{check_binary_available, run_with_timeout, FFPROBE_TIMEOUT};
use async_trait::async_trait;
use spindle_core::item::WorkItem;
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use tokio::process::Command;
use tracing::info;

/// Runs `ffprobe` against the encoded file to record stream layout.
pub struct AudioAnalyzeHandler;

impl AudioAnalyzeHandler {
    pub fn new() -> Self {
        Self
    }

    fn encoded_file<'a>(&self, item: &'a WorkItem) -> Result<&'a std::path::Path, StageFailure> {
        item.encoded_file
            .as_deref()
            .ok_or_else(|| Box::new(AdapterError::MissingField("encoded_file")) as StageFailure)
    }
}

impl Default for AudioAnalyzeHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageHandler for AudioAnalyzeHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        self.encoded_file(item)?;
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        let encoded = self.encoded_file(item)?;

        let mut cmd = Command::new("ffprobe");
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            &encoded.display().to_string(),
        ]);
        let output = run_with_timeout(cmd, FFPROBE_TIMEOUT, "ffprobe")
            .await
            .map_err(|e| Box::new(e) as StageFailure)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Box::new(AdapterError::UnexpectedOutput(format!(
                "ffprobe exited with {}: {stderr}",
                output.status
            ))));
        }

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| Box::new(AdapterError::UnexpectedOutput(format!("ffprobe output: {e}"))) as StageFailure)?;
        let stream_count = parsed
            .get("streams")
            .and_then(|s| s.as_array())
            .map(|a| a.len())
            .unwrap_or(0);

        info!(item = %item.id, stream_count, "audio analyzed");

        let metadata = serde_json::json!({ "stream_count": stream_count, "streams": parsed.get("streams").cloned().unwrap_or_default() });
        Ok(ItemPatch {
            append_envelope_section: Some(completed_section("audio_analyzing", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        match check_binary_available("ffprobe", "-version").await {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "audio_analyze_tests.rs"]
mod tests;
