// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The work item (spec.md §3.1): one disc or manually-ingested file
//! traversing the pipeline.

use crate::envelope::Envelope;
use crate::id::ItemId;
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Disc,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Tv,
    Unknown,
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::Unknown
    }
}

/// Free-form progress reporting a stage may update while it runs (spec.md
/// §3.1 "Progress").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    pub stage: String,
    /// 0..=100 (spec.md §3.1 invariant 4).
    pub percent: u8,
    pub message: String,
}

impl Progress {
    pub fn clear(&mut self) {
        *self = Progress::default();
    }
}

/// A work item: one disc or one manually ingested file moving through the
/// pipeline described in spec.md §3.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    /// Opaque, case-insensitive. `None` for manually ingested files.
    pub disc_fingerprint: Option<String>,
    pub source_path: Option<PathBuf>,
    pub source_kind: SourceKind,
    pub media_kind: MediaKind,
    pub status: Status,
    /// Set iff `status == Failed` (spec.md §3.1 invariant 3).
    pub failed_at_status: Option<Status>,
    pub progress: Progress,
    /// Updated by whichever worker currently owns the item. `Some` implies
    /// `status` is in-flight (spec.md §3.1 invariant 2).
    pub heartbeat_ms: Option<u64>,
    pub review_flag: bool,
    pub review_reason: Option<String>,
    pub disc_title: Option<String>,
    /// Opaque serialized identification-stage output.
    pub identification_metadata: Option<serde_json::Value>,
    /// Opaque serialized rip-spec (titles, episodes, per-stage asset lists).
    pub rip_spec: Option<serde_json::Value>,
    /// Opaque serialized encoder settings snapshot.
    pub encoding_details: Option<serde_json::Value>,
    pub ripped_file: Option<PathBuf>,
    pub encoded_file: Option<PathBuf>,
    pub final_file: Option<PathBuf>,
    pub envelope: Envelope,
    pub error_message: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl WorkItem {
    pub fn new_disc(id: ItemId, title: String, fingerprint: String, now_ms: u64) -> Self {
        Self {
            id,
            disc_fingerprint: Some(fingerprint.to_lowercase()),
            source_path: None,
            source_kind: SourceKind::Disc,
            media_kind: MediaKind::Unknown,
            status: Status::Pending,
            failed_at_status: None,
            progress: Progress::default(),
            heartbeat_ms: None,
            review_flag: false,
            review_reason: None,
            disc_title: Some(title),
            identification_metadata: None,
            rip_spec: None,
            encoding_details: None,
            ripped_file: None,
            encoded_file: None,
            final_file: None,
            envelope: Envelope::new(),
            error_message: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn new_file(id: ItemId, path: PathBuf, now_ms: u64) -> Self {
        Self {
            id,
            disc_fingerprint: None,
            source_path: Some(path),
            source_kind: SourceKind::File,
            media_kind: MediaKind::Unknown,
            status: Status::Pending,
            failed_at_status: None,
            progress: Progress::default(),
            heartbeat_ms: None,
            review_flag: false,
            review_reason: None,
            disc_title: None,
            identification_metadata: None,
            rip_spec: None,
            encoding_details: None,
            ripped_file: None,
            encoded_file: None,
            final_file: None,
            envelope: Envelope::new(),
            error_message: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// The staging directory name this item owns (spec.md §5 "Filesystem
    /// staging area"): derived from the fingerprint, or `queue-<id>` as a
    /// fallback for manually ingested files. Strips anything that isn't
    /// alphanumeric, `-`, or `_` so it's always a single safe path segment.
    pub fn staging_dir_name(&self) -> String {
        let raw = self
            .disc_fingerprint
            .clone()
            .unwrap_or_else(|| format!("queue-{}", self.id));
        sanitize_path_segment(&raw)
    }

    pub fn is_disc_dependent_candidate(&self) -> bool {
        self.source_kind == SourceKind::Disc
    }
}

/// Strips path separators and other unsafe characters from a single path
/// segment (spec.md §5: "Sanitization of path segments must strip
/// separators and unsafe characters").
pub fn sanitize_path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "item".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_disc_starts_pending_with_lowercased_fingerprint() {
        let item = WorkItem::new_disc(ItemId::new(1), "MOVIE_01".into(), "F1ABC".into(), 100);
        assert_eq!(item.status, Status::Pending);
        assert_eq!(item.disc_fingerprint.as_deref(), Some("f1abc"));
        assert_eq!(item.source_kind, SourceKind::Disc);
    }

    #[test]
    fn staging_dir_name_falls_back_to_queue_id_for_files() {
        let item = WorkItem::new_file(ItemId::new(7), "/tmp/in.mkv".into(), 0);
        assert_eq!(item.staging_dir_name(), "queue-7");
    }

    #[test]
    fn sanitize_path_segment_strips_separators() {
        assert_eq!(sanitize_path_segment("../../etc/passwd"), "______etc_passwd");
    }
}
