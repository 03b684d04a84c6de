// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::completed_section;
use crate::error::AdapterError;
use async_trait::async_trait;
use spindle_core::item::{MediaKind, WorkItem};
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use std::path::PathBuf;
use tracing::{info, warn};

/// Optional media-server refresh trigger (e.g. Plex). Shallow by design
/// (spec.md §8): a missing or unreachable server never fails the stage.
#[async_trait]
pub trait LibraryRefresh: Send + Sync {
    async fn refresh(&self) -> Result<(), String>;
}

/// Moves the final artifact into the library tree and, if configured,
/// triggers a media-server refresh.
pub struct OrganizeHandler {
    library_root: PathBuf,
    refresh: Option<Box<dyn LibraryRefresh>>,
}

impl OrganizeHandler {
    pub fn new(library_root: PathBuf, refresh: Option<Box<dyn LibraryRefresh>>) -> Self {
        Self { library_root, refresh }
    }

    fn source_file<'a>(&self, item: &'a WorkItem) -> Result<&'a std::path::Path, StageFailure> {
        item.encoded_file
            .as_deref()
            .ok_or_else(|| Box::new(AdapterError::MissingField("encoded_file")) as StageFailure)
    }

    fn destination(&self, item: &WorkItem, source: &std::path::Path) -> PathBuf {
        let category = match item.media_kind {
            MediaKind::Movie => "Movies",
            MediaKind::Tv => "TV",
            MediaKind::Unknown => "Unsorted",
        };
        let title = item.disc_title.clone().unwrap_or_else(|| format!("item-{}", item.id));
        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("{}.mkv", item.id)));
        self.library_root
            .join(category)
            .join(spindle_core::item::sanitize_path_segment(&title))
            .join(file_name)
    }
}

#[async_trait]
impl StageHandler for OrganizeHandler {
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        self.source_file(item)?;
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        let source = self.source_file(item)?;
        let dest = self.destination(item, source);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Box::new(AdapterError::Subprocess(format!("creating library dir: {e}"))) as StageFailure)?;
        }
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| Box::new(AdapterError::Subprocess(format!("copying into library: {e}"))) as StageFailure)?;
        tokio::fs::remove_file(source)
            .await
            .map_err(|e| Box::new(AdapterError::Subprocess(format!("removing staged file: {e}"))) as StageFailure)?;

        if let Some(refresh) = &self.refresh {
            match refresh.refresh().await {
                Ok(()) => info!(item = %item.id, "media server refresh triggered"),
                Err(e) => warn!(item = %item.id, error = %e, "media server refresh failed, ignoring"),
            }
        }

        info!(item = %item.id, dest = %dest.display(), "organized");

        let metadata = serde_json::json!({ "destination": dest.display().to_string() });
        Ok(ItemPatch {
            final_file: Some(dest),
            append_envelope_section: Some(completed_section("organizing", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        if self.library_root.exists() {
            HealthStatus::healthy()
        } else {
            HealthStatus::unhealthy(format!("library root {} does not exist", self.library_root.display()))
        }
    }
}

#[cfg(test)]
#[path = "organize_tests.rs"]
mod tests;
