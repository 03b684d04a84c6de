// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One `StageHandler` per in-flight status (SPEC_FULL.md §8), each
//! wrapping an external binary via [`crate::subprocess::run_with_timeout`].
//! Bodies here are intentionally shallow: disc metadata heuristics, TMDB
//! matching logic, encoder preset selection, subtitle generation detail,
//! and media-server refresh payloads are out of scope — these exist so
//! the engine has something real to drive end-to-end.

mod audio_analyze;
mod encode;
mod episode_identify;
mod identify;
mod organize;
mod rip;
mod subtitle;

pub use audio_analyze::AudioAnalyzeHandler;
pub use encode::EncodeHandler;
pub use episode_identify::EpisodeIdentifyHandler;
pub use identify::IdentifyHandler;
pub use organize::{LibraryRefresh, OrganizeHandler};
pub use rip::RipHandler;
pub use subtitle::SubtitleHandler;

use spindle_core::envelope::{EnvelopeSection, SectionStatus};

/// Builds a `Completed` envelope section for `stage` with no assets, only
/// metadata. Most handlers' success path needs exactly this.
fn completed_section(stage: &str, metadata: serde_json::Value) -> EnvelopeSection {
    EnvelopeSection {
        stage: stage.to_string(),
        status: SectionStatus::Completed,
        assets: vec![],
        metadata,
    }
}

/// Builds a `Skipped` envelope section, used when a stage is a configured
/// or content-driven no-op (subtitling disabled, episode identification on
/// a movie).
fn skipped_section(stage: &str, reason: &str) -> EnvelopeSection {
    EnvelopeSection {
        stage: stage.to_string(),
        status: SectionStatus::Skipped,
        assets: vec![],
        metadata: serde_json::json!({ "reason": reason }),
    }
}
