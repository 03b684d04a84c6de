// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DependencyProbe` implementations for the external binaries the
//! pipeline drives (spec.md §4.5 step 3, §6.5 exit code 4). Each probe
//! wraps [`crate::subprocess::check_binary_available`] with the name and
//! version flag the binary actually accepts.

use crate::subprocess::check_binary_available;
use crate::tmdb::TmdbAdapter;
use async_trait::async_trait;
use spindle_engine::DependencyProbe;
use std::sync::Arc;

pub struct BinaryDependencyProbe {
    name: String,
    binary: String,
    version_flag: &'static str,
    required: bool,
}

impl BinaryDependencyProbe {
    pub fn new(name: impl Into<String>, binary: impl Into<String>, version_flag: &'static str) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            version_flag,
            required: true,
        }
    }

    /// Marks the dependency as optional: a missing binary disables whatever
    /// stage needs it rather than aborting startup (spec.md §4.5 step 3).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

#[async_trait]
impl DependencyProbe for BinaryDependencyProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        check_binary_available(&self.binary, self.version_flag)
            .await
            .is_ok()
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Probes TMDB reachability. Always optional: `IdentifyHandler`/
/// `EpisodeIdentifyHandler` already fall back to `TmdbLookup::unknown()`
/// on a failed lookup (SPEC_FULL.md §8), so an unreachable TMDB should
/// disable metadata matching, not abort the daemon.
pub struct TmdbDependencyProbe {
    tmdb: Arc<dyn TmdbAdapter>,
}

impl TmdbDependencyProbe {
    pub fn new(tmdb: Arc<dyn TmdbAdapter>) -> Self {
        Self { tmdb }
    }
}

#[async_trait]
impl DependencyProbe for TmdbDependencyProbe {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn is_available(&self) -> bool {
        self.tmdb.health_check().await.is_ok()
    }

    fn required(&self) -> bool {
        false
    }
}
