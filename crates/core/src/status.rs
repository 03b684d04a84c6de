// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The work-item status state machine (spec.md §3.3, §4.1 ordinal table).
//!
//! Represented as a closed, tagged enum per the re-architecture guidance in
//! spec.md §9 ("a tagged-variant approach ... is preferred over string
//! comparisons") rather than as a free-form string column.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a status is one an idle worker may claim, one a single worker
/// currently owns, or a final resting place for the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    InFlight,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Identifying,
    Identified,
    Ripping,
    Ripped,
    EpisodeIdentifying,
    EpisodeIdentified,
    Encoding,
    Encoded,
    AudioAnalyzing,
    AudioAnalyzed,
    Subtitling,
    Subtitled,
    Organizing,
    Completed,
    Failed,
}

impl Status {
    /// Every status, in pipeline order, for enumeration (stats, CLI listing).
    pub const ALL: [Status; 16] = [
        Status::Pending,
        Status::Identifying,
        Status::Identified,
        Status::Ripping,
        Status::Ripped,
        Status::EpisodeIdentifying,
        Status::EpisodeIdentified,
        Status::Encoding,
        Status::Encoded,
        Status::AudioAnalyzing,
        Status::AudioAnalyzed,
        Status::Subtitling,
        Status::Subtitled,
        Status::Organizing,
        Status::Completed,
        Status::Failed,
    ];

    pub fn kind(self) -> StatusKind {
        use Status::*;
        match self {
            Pending | Identified | Ripped | EpisodeIdentified | Encoded | AudioAnalyzed
            | Subtitled => StatusKind::Ready,
            Identifying | Ripping | EpisodeIdentifying | Encoding | AudioAnalyzing
            | Subtitling | Organizing => StatusKind::InFlight,
            Completed | Failed => StatusKind::Terminal,
        }
    }

    pub fn is_ready(self) -> bool {
        self.kind() == StatusKind::Ready
    }

    pub fn is_in_flight(self) -> bool {
        self.kind() == StatusKind::InFlight
    }

    pub fn is_terminal(self) -> bool {
        self.kind() == StatusKind::Terminal
    }

    /// Position in the pipeline. An in-flight status shares the ordinal of
    /// its predecessor ready status (spec.md §3.3): failing mid-stage grants
    /// no credit for having completed that stage.
    pub fn ordinal(self) -> i32 {
        use Status::*;
        match self {
            Pending => 0,
            Identifying => 0,
            Identified => 1,
            Ripping => 1,
            Ripped => 2,
            EpisodeIdentifying => 2,
            EpisodeIdentified => 3,
            Encoding => 3,
            Encoded => 4,
            AudioAnalyzing => 4,
            AudioAnalyzed => 5,
            Subtitling => 5,
            Subtitled => 6,
            Organizing => 6,
            Completed => 7,
            Failed => -1,
        }
    }

    /// Where `ReclaimStale`/`ResetStuckProcessing` send this status, if it is
    /// in-flight. `None` for ready/terminal statuses.
    pub fn rollback_target(self) -> Option<Status> {
        use Status::*;
        match self {
            Identifying => Some(Pending),
            Ripping => Some(Identified),
            EpisodeIdentifying => Some(Ripped),
            Encoding => Some(EpisodeIdentified),
            AudioAnalyzing => Some(Encoded),
            Subtitling => Some(AudioAnalyzed),
            Organizing => Some(Subtitled),
            _ => None,
        }
    }

    /// The in-flight status a claim on this ready status transitions into.
    /// `None` for in-flight/terminal statuses.
    pub fn in_flight_successor(self) -> Option<Status> {
        use Status::*;
        match self {
            Pending => Some(Identifying),
            Identified => Some(Ripping),
            Ripped => Some(EpisodeIdentifying),
            EpisodeIdentified => Some(Encoding),
            Encoded => Some(AudioAnalyzing),
            AudioAnalyzed => Some(Subtitling),
            Subtitled => Some(Organizing),
            _ => None,
        }
    }

    /// Where a successful `Execute` for this in-flight status commits to.
    /// `None` for ready/terminal statuses.
    pub fn next_on_success(self) -> Option<Status> {
        use Status::*;
        match self {
            Identifying => Some(Identified),
            Ripping => Some(Ripped),
            EpisodeIdentifying => Some(EpisodeIdentified),
            Encoding => Some(Encoded),
            AudioAnalyzing => Some(AudioAnalyzed),
            Subtitling => Some(Subtitled),
            Organizing => Some(Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        use Status::*;
        match self {
            Pending => "pending",
            Identifying => "identifying",
            Identified => "identified",
            Ripping => "ripping",
            Ripped => "ripped",
            EpisodeIdentifying => "episode_identifying",
            EpisodeIdentified => "episode_identified",
            Encoding => "encoding",
            Encoded => "encoded",
            AudioAnalyzing => "audio_analyzing",
            AudioAnalyzed => "audio_analyzed",
            Subtitling => "subtitling",
            Subtitled => "subtitled",
            Organizing => "organizing",
            Completed => "completed",
            Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
