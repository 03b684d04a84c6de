// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{TmdbAdapter, TmdbEpisode, TmdbError, TmdbLookup};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Test double: `identify` answers from a fixed `title -> TmdbLookup` table
/// (falling back to `TmdbLookup::unknown()`), `season_episodes` from a
/// fixed `(tmdb_id, season) -> episodes` table.
#[derive(Default)]
pub struct FakeTmdbAdapter {
    lookups: Mutex<HashMap<String, TmdbLookup>>,
    seasons: Mutex<HashMap<(u64, u32), Vec<TmdbEpisode>>>,
    healthy: Mutex<bool>,
    fail_identify: Mutex<bool>,
    fail_season_episodes: Mutex<bool>,
}

impl FakeTmdbAdapter {
    pub fn new() -> Self {
        Self {
            lookups: Mutex::new(HashMap::new()),
            seasons: Mutex::new(HashMap::new()),
            healthy: Mutex::new(true),
            fail_identify: Mutex::new(false),
            fail_season_episodes: Mutex::new(false),
        }
    }

    pub fn with_lookup(self, title: impl Into<String>, lookup: TmdbLookup) -> Self {
        self.lookups.lock().insert(title.into(), lookup);
        self
    }

    pub fn with_season(self, tmdb_id: u64, season: u32, episodes: Vec<TmdbEpisode>) -> Self {
        self.seasons.lock().insert((tmdb_id, season), episodes);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock() = healthy;
    }

    /// Makes `identify` return an `Err`, simulating a TMDB outage.
    pub fn fail_identify(self) -> Self {
        *self.fail_identify.lock() = true;
        self
    }

    /// Makes `season_episodes` return an `Err`, simulating a TMDB outage.
    pub fn fail_season_episodes(self) -> Self {
        *self.fail_season_episodes.lock() = true;
        self
    }
}

#[async_trait]
impl TmdbAdapter for FakeTmdbAdapter {
    async fn identify(&self, title: &str) -> Result<TmdbLookup, TmdbError> {
        if *self.fail_identify.lock() {
            return Err(TmdbError::Request("fake tmdb identify failure".to_string()));
        }
        Ok(self
            .lookups
            .lock()
            .get(title)
            .cloned()
            .unwrap_or_else(TmdbLookup::unknown))
    }

    async fn season_episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<TmdbEpisode>, TmdbError> {
        if *self.fail_season_episodes.lock() {
            return Err(TmdbError::Request("fake tmdb season lookup failure".to_string()));
        }
        Ok(self
            .seasons
            .lock()
            .get(&(tmdb_id, season))
            .cloned()
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), TmdbError> {
        if *self.healthy.lock() {
            Ok(())
        } else {
            Err(TmdbError::Request("fake tmdb marked unhealthy".to_string()))
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
