// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external binaries and services the pipeline drives
//! (SPEC_FULL.md §8): `makemkvcon`, `drapto`, `ffprobe`, WhisperX, TMDB, a
//! media-server refresh, and desktop notifications. Nothing in here decides
//! *when* a stage runs; `spindle-engine` owns that.

pub mod dependencies;
pub mod disc;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod plex;
pub mod subprocess;
pub mod tmdb;

pub use dependencies::{BinaryDependencyProbe, TmdbDependencyProbe};
pub use disc::{MakemkvDiscProbe, MakemkvFingerprintProvider};
pub use error::AdapterError;
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use plex::PlexRefresh;
pub use tmdb::{HttpTmdbAdapter, TmdbAdapter, TmdbEpisode, TmdbError, TmdbLookup};

pub use handlers::{
    AudioAnalyzeHandler, EncodeHandler, EpisodeIdentifyHandler, IdentifyHandler, LibraryRefresh,
    OrganizeHandler, RipHandler, SubtitleHandler,
};

#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use tmdb::FakeTmdbAdapter;
