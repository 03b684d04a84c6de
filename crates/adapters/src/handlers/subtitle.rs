// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::skipped_section;
use crate::error::AdapterError;
use crate::subprocess::{check_binary_available, run_with_timeout, WHISPERX_TIMEOUT};
use async_trait::async_trait;
use spindle_core::item::WorkItem;
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use tokio::process::Command;
use tracing::info;

/// Runs WhisperX to generate subtitle tracks. A configured no-op when
/// subtitling is disabled (spec.md §4.2).
pub struct SubtitleHandler {
    enabled: bool,
    model: String,
}

impl SubtitleHandler {
    pub fn new(enabled: bool, model: impl Into<String>) -> Self {
        Self { enabled, model: model.into() }
    }

    fn encoded_file<'a>(&self, item: &'a WorkItem) -> Result<&'a std::path::Path, StageFailure> {
        item.encoded_file
            .as_deref()
            .ok_or_else(|| Box::new(AdapterError::MissingField("encoded_file")) as StageFailure)
    }
}

#[async_trait]
impl StageHandler for SubtitleHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        if self.enabled {
            self.encoded_file(item)?;
        }
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        if !self.enabled {
            return Ok(ItemPatch {
                append_envelope_section: Some(skipped_section("subtitling", "subtitling disabled")),
                ..Default::default()
            });
        }

        let encoded = self.encoded_file(item)?;
        let subtitle_path = encoded.with_extension("srt");

        let mut cmd = Command::new("whisperx");
        cmd.args([
            &encoded.display().to_string(),
            "--model",
            &self.model,
            "--output_format",
            "srt",
        ]);
        let output = run_with_timeout(cmd, WHISPERX_TIMEOUT, "whisperx")
            .await
            .map_err(|e| Box::new(e) as StageFailure)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Box::new(AdapterError::UnexpectedOutput(format!(
                "whisperx exited with {}: {stderr}",
                output.status
            ))));
        }

        info!(item = %item.id, subtitle = %subtitle_path.display(), "subtitled");

        let metadata = serde_json::json!({ "model": self.model });
        let section = spindle_core::envelope::EnvelopeSection {
            stage: "subtitling".to_string(),
            status: spindle_core::envelope::SectionStatus::Completed,
            assets: vec![subtitle_path],
            metadata,
        };
        Ok(ItemPatch {
            append_envelope_section: Some(section),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        if !self.enabled {
            return HealthStatus::healthy();
        }
        match check_binary_available("whisperx", "--help").await {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "subtitle_tests.rs"]
mod tests;
