// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{TmdbAdapter, TmdbEpisode, TmdbError, TmdbLookup};
use async_trait::async_trait;
use serde::Deserialize;
use spindle_core::item::MediaKind;
use std::time::Duration;

const BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonResponse {
    episodes: Vec<EpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResult {
    episode_number: u32,
    season_number: u32,
    name: String,
}

pub struct HttpTmdbAdapter {
    client: reqwest::Client,
    api_key: String,
}

impl HttpTmdbAdapter {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout never fails to build");
        Self { client, api_key }
    }
}

#[async_trait]
impl TmdbAdapter for HttpTmdbAdapter {
    async fn identify(&self, title: &str) -> Result<TmdbLookup, TmdbError> {
        let url = format!("{BASE_URL}/search/multi");
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await
            .map_err(|e| TmdbError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TmdbError::Unauthorized(format!("TMDB rejected the API key for {title:?}")));
        }
        if !response.status().is_success() {
            return Err(TmdbError::Request(format!("TMDB returned {}", response.status())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| TmdbError::UnexpectedResponse(e.to_string()))?;

        let Some(top) = body.results.into_iter().next() else {
            return Ok(TmdbLookup::unknown());
        };
        let media_kind = match top.media_type.as_deref() {
            Some("movie") => MediaKind::Movie,
            Some("tv") => MediaKind::Tv,
            _ => MediaKind::Unknown,
        };
        Ok(TmdbLookup {
            media_kind,
            tmdb_id: Some(top.id),
            matched_title: top.title.or(top.name),
        })
    }

    async fn season_episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<TmdbEpisode>, TmdbError> {
        let url = format!("{BASE_URL}/tv/{tmdb_id}/season/{season}");
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TmdbError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TmdbError::Request(format!("TMDB returned {}", response.status())));
        }

        let body: SeasonResponse = response
            .json()
            .await
            .map_err(|e| TmdbError::UnexpectedResponse(e.to_string()))?;

        Ok(body
            .episodes
            .into_iter()
            .map(|e| TmdbEpisode {
                season: e.season_number,
                episode: e.episode_number,
                title: e.name,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), TmdbError> {
        let url = format!("{BASE_URL}/configuration");
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TmdbError::Request(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(TmdbError::Request(format!("TMDB returned {}", response.status())))
        }
    }
}
