// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal TMDB client trait (SPEC_FULL.md §8: "resolves `media_kind`
//! via a best-effort TMDB lookup (HTTP via a minimal client trait so the
//! engine can inject a fake in tests)"). `IdentifyHandler` and
//! `EpisodeIdentifyHandler` are the only callers; neither needs more than
//! a title search and a season/episode lookup, so this stays a thin
//! capability object rather than a full TMDB API binding.

mod http;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use http::HttpTmdbAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTmdbAdapter;

use async_trait::async_trait;
use spindle_core::item::MediaKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("tmdb request failed: {0}")]
    Request(String),
    #[error("tmdb returned an unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("tmdb rejected the request: {0}")]
    Unauthorized(String),
}

/// What a best-effort title lookup resolves to. `Unknown` is a legitimate,
/// non-error outcome (no confident match, or TMDB unreachable) — the
/// handler falls back to it rather than failing the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmdbLookup {
    pub media_kind: MediaKind,
    pub tmdb_id: Option<u64>,
    pub matched_title: Option<String>,
}

impl TmdbLookup {
    pub fn unknown() -> Self {
        Self {
            media_kind: MediaKind::Unknown,
            tmdb_id: None,
            matched_title: None,
        }
    }
}

/// A season/episode identified against TMDB's episode listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmdbEpisode {
    pub season: u32,
    pub episode: u32,
    pub title: String,
}

#[async_trait]
pub trait TmdbAdapter: Send + Sync {
    /// Best-effort search by disc/file title. Returns `Ok(TmdbLookup::unknown())`
    /// rather than an error when there's simply no confident match.
    async fn identify(&self, title: &str) -> Result<TmdbLookup, TmdbError>;

    /// Looks up the episode list for a season of a known series.
    async fn season_episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<TmdbEpisode>, TmdbError>;

    /// Cheap reachability check for the daemon's startup dependency probe.
    async fn health_check(&self) -> Result<(), TmdbError>;
}
