// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::completed_section;
use crate::error::AdapterError;
use crate::subprocess::{check_binary_available, run_with_timeout, MAKEMKV_INFO_TIMEOUT};
use crate::tmdb::{TmdbAdapter, TmdbLookup};
use async_trait::async_trait;
use spindle_core::item::WorkItem;
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{info, warn};

/// Probes the disc (title count, volume label) via `makemkvcon -r info`
/// and resolves `media_kind` with a best-effort TMDB title search.
pub struct IdentifyHandler {
    tmdb: Arc<dyn TmdbAdapter>,
    drive_index: u32,
}

impl IdentifyHandler {
    pub fn new(tmdb: Arc<dyn TmdbAdapter>, drive_index: u32) -> Self {
        Self { tmdb, drive_index }
    }

    fn title(&self, item: &WorkItem) -> Result<String, StageFailure> {
        if let Some(title) = &item.disc_title {
            return Ok(title.clone());
        }
        item.source_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| Box::new(AdapterError::MissingField("disc_title or source_path")) as StageFailure)
    }
}

/// Counts `TINFO:` lines, one per playlist title `makemkvcon` reports.
fn count_titles(stdout: &str) -> u32 {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("TINFO:"))
        .filter_map(|rest| rest.split(',').next())
        .collect::<std::collections::HashSet<_>>()
        .len() as u32
}

#[async_trait]
impl StageHandler for IdentifyHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        self.title(item)?;
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        let title = self.title(item)?;

        let title_count = if item.source_kind == spindle_core::item::SourceKind::Disc {
            let mut cmd = Command::new("makemkvcon");
            cmd.args(["-r", "info", &format!("disc:{}", self.drive_index)]);
            let output = run_with_timeout(cmd, MAKEMKV_INFO_TIMEOUT, "makemkvcon info")
                .await
                .map_err(|e| Box::new(e) as StageFailure)?;
            if !output.status.success() {
                return Err(Box::new(AdapterError::UnexpectedOutput(format!(
                    "makemkvcon info exited with {}",
                    output.status
                ))));
            }
            count_titles(&String::from_utf8_lossy(&output.stdout)).max(1)
        } else {
            1
        };

        let lookup = match self.tmdb.identify(&title).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(item = %item.id, %title, error = %e, "tmdb lookup failed, continuing unknown");
                TmdbLookup::unknown()
            }
        };

        info!(item = %item.id, %title, media_kind = ?lookup.media_kind, "identified");

        let metadata = serde_json::json!({
            "tmdb_id": lookup.tmdb_id,
            "matched_title": lookup.matched_title,
        });
        let rip_spec = serde_json::json!({ "title_index": 0, "title_count": title_count });

        Ok(ItemPatch {
            disc_title: Some(title),
            media_kind: Some(lookup.media_kind),
            identification_metadata: Some(metadata.clone()),
            rip_spec: Some(rip_spec),
            append_envelope_section: Some(completed_section("identifying", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        match check_binary_available("makemkvcon", "--version").await {
            Ok(()) => match self.tmdb.health_check().await {
                Ok(()) => HealthStatus::healthy(),
                Err(e) => HealthStatus::unhealthy(format!("tmdb unreachable: {e}")),
            },
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }

    fn disc_dependent(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "identify_tests.rs"]
mod tests;
