// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::completed_section;
use crate::error::AdapterError;
use crate::subprocess::{check_binary_available, run_with_timeout, DRAPTO_TIMEOUT};
use async_trait::async_trait;
use spindle_core::item::WorkItem;
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use tokio::process::Command;
use tracing::info;

/// Invokes `drapto` to transcode the ripped title.
pub struct EncodeHandler {
    preset: String,
}

impl EncodeHandler {
    pub fn new(preset: impl Into<String>) -> Self {
        Self { preset: preset.into() }
    }

    fn ripped_file<'a>(&self, item: &'a WorkItem) -> Result<&'a std::path::Path, StageFailure> {
        item.ripped_file
            .as_deref()
            .ok_or_else(|| Box::new(AdapterError::MissingField("ripped_file")) as StageFailure)
    }
}

#[async_trait]
impl StageHandler for EncodeHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        self.ripped_file(item)?;
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        let ripped = self.ripped_file(item)?;
        let encoded = ripped.with_extension("encoded.mkv");

        let mut cmd = Command::new("drapto");
        cmd.args([
            "encode",
            "--preset",
            &self.preset,
            "--input",
            &ripped.display().to_string(),
            "--output",
            &encoded.display().to_string(),
        ]);
        let output = run_with_timeout(cmd, DRAPTO_TIMEOUT, "drapto encode")
            .await
            .map_err(|e| Box::new(e) as StageFailure)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Box::new(AdapterError::UnexpectedOutput(format!(
                "drapto encode exited with {}: {stderr}",
                output.status
            ))));
        }

        info!(item = %item.id, file = %encoded.display(), "encoded");

        let metadata = serde_json::json!({ "encoder": "drapto", "preset": self.preset });
        Ok(ItemPatch {
            encoded_file: Some(encoded),
            encoding_details: Some(metadata.clone()),
            append_envelope_section: Some(completed_section("encoding", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        match check_binary_available("drapto", "--version").await {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "encode_tests.rs"]
mod tests;
