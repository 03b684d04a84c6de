// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{completed_section, skipped_section};
use crate::error::AdapterError;
use crate::tmdb::TmdbAdapter;
use async_trait::async_trait;
use spindle_core::item::{MediaKind, WorkItem};
use spindle_engine::{HealthStatus, StageContext, StageFailure, StageHandler};
use spindle_storage::ItemPatch;
use std::sync::Arc;
use tracing::{info, warn};

/// Matches ripped titles to TV episodes via a TMDB season/episode lookup.
/// A no-op passthrough for `movie`/`unknown` media (spec.md §8).
pub struct EpisodeIdentifyHandler {
    tmdb: Arc<dyn TmdbAdapter>,
}

impl EpisodeIdentifyHandler {
    pub fn new(tmdb: Arc<dyn TmdbAdapter>) -> Self {
        Self { tmdb }
    }
}

#[async_trait]
impl StageHandler for EpisodeIdentifyHandler {
    async fn prepare(&self, _item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        Ok(ItemPatch::default())
    }

    async fn execute(&self, _ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure> {
        if item.media_kind != MediaKind::Tv {
            return Ok(ItemPatch {
                append_envelope_section: Some(skipped_section(
                    "episode_identifying",
                    "media_kind is not tv",
                )),
                ..Default::default()
            });
        }

        let tmdb_id = item
            .identification_metadata
            .as_ref()
            .and_then(|m| m.get("tmdb_id"))
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Box::new(AdapterError::MissingField("identification_metadata.tmdb_id")) as StageFailure)?;

        const SEASON: u32 = 1;
        let episodes = match self.tmdb.season_episodes(tmdb_id, SEASON).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(item = %item.id, tmdb_id, error = %e, "tmdb season lookup failed, continuing unknown");
                return Ok(ItemPatch {
                    append_envelope_section: Some(skipped_section(
                        "episode_identifying",
                        "tmdb season lookup failed",
                    )),
                    ..Default::default()
                });
            }
        };

        info!(item = %item.id, tmdb_id, episode_count = episodes.len(), "episode identified");

        let metadata = serde_json::json!({
            "season": SEASON,
            "episodes": episodes.iter().map(|e| serde_json::json!({
                "season": e.season,
                "episode": e.episode,
                "title": e.title,
            })).collect::<Vec<_>>(),
        });

        Ok(ItemPatch {
            append_envelope_section: Some(completed_section("episode_identifying", metadata)),
            ..Default::default()
        })
    }

    async fn health_check(&self) -> HealthStatus {
        match self.tmdb.health_check().await {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => HealthStatus::unhealthy(format!("tmdb unreachable: {e}")),
        }
    }
}

#[cfg(test)]
#[path = "episode_identify_tests.rs"]
mod tests;
