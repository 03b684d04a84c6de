// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::completed_section;
use crate::error::AdapterError;
use crate::subprocess::{check_binary_available, run_with_timeout, MAKEMKV_RIP_TIMEOUT};
use async_trait::async_trait;
use spindle_core::item::WorkItem;
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

/// Drives `makemkvcon mkv` to rip the title `IdentifyHandler` selected
/// into the item's staging directory.
pub struct RipHandler {
    staging_root: PathBuf,
    drive_index: u32,
}

impl RipHandler {
    pub fn new(staging_root: PathBuf, drive_index: u32) -> Self {
        Self { staging_root, drive_index }
    }

    fn title_index(&self, item: &WorkItem) -> Result<u64, StageFailure> {
        let spec = item
            .rip_spec
            .as_ref()
            .ok_or_else(|| Box::new(AdapterError::MissingField("rip_spec")) as StageFailure)?;
        spec.get("title_index")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Box::new(AdapterError::UnexpectedOutput("rip_spec missing title_index".to_string())) as StageFailure)
    }
}

#[async_trait]
impl StageHandler for RipHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        self.title_index(item)?;
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        let title_index = self.title_index(item)?;
        let out_dir = self.staging_root.join(item.staging_dir_name());
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| Box::new(AdapterError::Subprocess(format!("creating staging dir: {e}"))) as StageFailure)?;

        let mut cmd = Command::new("makemkvcon");
        cmd.args([
            "mkv",
            &format!("disc:{}", self.drive_index),
            &title_index.to_string(),
            &out_dir.display().to_string(),
        ]);
        let output = run_with_timeout(cmd, MAKEMKV_RIP_TIMEOUT, "makemkvcon mkv")
            .await
            .map_err(|e| Box::new(e) as StageFailure)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Box::new(AdapterError::UnexpectedOutput(format!(
                "makemkvcon mkv exited with {}: {stderr}",
                output.status
            ))));
        }

        let ripped_file = newest_mkv_in(&out_dir)
            .await
            .ok_or_else(|| Box::new(AdapterError::UnexpectedOutput(format!("no .mkv produced in {}", out_dir.display()))) as StageFailure)?;

        info!(item = %item.id, file = %ripped_file.display(), "ripped");

        let metadata = serde_json::json!({ "title_index": title_index });
        Ok(ItemPatch {
            ripped_file: Some(ripped_file),
            append_envelope_section: Some(completed_section("ripping", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        match check_binary_available("makemkvcon", "--version").await {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }

    fn disc_dependent(&self) -> bool {
        true
    }
}

async fn newest_mkv_in(dir: &std::path::Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("mkv") {
            continue;
        }
        let modified = entry.metadata().await.ok()?.modified().ok()?;
        if best.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            best = Some((modified, path));
        }
    }
    best.map(|(_, path)| path)
}

#[cfg(test)]
#[path = "rip_tests.rs"]
mod tests;
