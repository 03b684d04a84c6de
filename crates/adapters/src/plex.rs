// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plex library-refresh trigger (SPEC_FULL.md §8, `[plex]`): a thin
//! `GET /library/sections/all/refresh` call, wired into `OrganizeHandler`
//! as a [`LibraryRefresh`](crate::handlers::LibraryRefresh) so a missing or
//! unreachable Plex server never fails the organize stage itself.

use crate::handlers::LibraryRefresh;
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct PlexRefresh {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl PlexRefresh {
    pub fn new(url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout never fails to build");
        Self { client, url, token }
    }
}

fn refresh_endpoint(url: &str) -> String {
    format!("{}/library/sections/all/refresh", url.trim_end_matches('/'))
}

#[async_trait]
impl LibraryRefresh for PlexRefresh {
    async fn refresh(&self) -> Result<(), String> {
        let response = self
            .client
            .get(refresh_endpoint(&self.url))
            .query(&[("X-Plex-Token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("plex returned {}", response.status()));
        }
        Ok(())
    }
}
