// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue events: the durable record the WAL stores and `QueueState` replays.
//!
//! Every mutating `QueueStore` operation (spec.md §4.1) appends exactly one
//! of these. All handlers in `QueueState::apply_event` MUST be idempotent —
//! applying the same event twice must produce the same state as applying it
//! once, since a crash between WAL flush and `mark_processed` can replay an
//! event the in-memory state already reflects.

use serde::{Deserialize, Serialize};
use spindle_core::envelope::EnvelopeSection;
use spindle_core::id::ItemId;
use spindle_core::item::{MediaKind, Progress, SourceKind, WorkItem};
use spindle_core::status::Status;
use std::path::PathBuf;

/// Sparse patch applied to a work item by `Update` or `CommitCompletion`.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub progress: Option<Progress>,
    pub media_kind: Option<MediaKind>,
    pub disc_title: Option<String>,
    pub identification_metadata: Option<serde_json::Value>,
    pub rip_spec: Option<serde_json::Value>,
    pub encoding_details: Option<serde_json::Value>,
    pub ripped_file: Option<PathBuf>,
    pub encoded_file: Option<PathBuf>,
    pub final_file: Option<PathBuf>,
    pub append_envelope_section: Option<EnvelopeSection>,
    pub error_message: Option<String>,
    pub failed_at_status: Option<Status>,
    pub review_flag: Option<bool>,
    pub review_reason: Option<String>,
}

impl ItemPatch {
    /// Applies every `Some` field onto `item`, leaving `None` fields
    /// untouched. Appending an envelope section already present for that
    /// stage is a no-op rather than an error, so replaying this twice
    /// during WAL recovery is safe.
    pub fn apply_to(&self, item: &mut WorkItem, now_ms: u64) {
        if let Some(progress) = &self.progress {
            item.progress = progress.clone();
        }
        if let Some(media_kind) = self.media_kind {
            item.media_kind = media_kind;
        }
        if let Some(title) = &self.disc_title {
            item.disc_title = Some(title.clone());
        }
        if let Some(metadata) = &self.identification_metadata {
            item.identification_metadata = Some(metadata.clone());
        }
        if let Some(rip_spec) = &self.rip_spec {
            item.rip_spec = Some(rip_spec.clone());
        }
        if let Some(details) = &self.encoding_details {
            item.encoding_details = Some(details.clone());
        }
        if let Some(path) = &self.ripped_file {
            item.ripped_file = Some(path.clone());
        }
        if let Some(path) = &self.encoded_file {
            item.encoded_file = Some(path.clone());
        }
        if let Some(path) = &self.final_file {
            item.final_file = Some(path.clone());
        }
        if let Some(section) = &self.append_envelope_section {
            if item.envelope.section_for(&section.stage).is_none() {
                let _ = item.envelope.append_section(section.clone());
            }
        }
        if let Some(message) = &self.error_message {
            item.error_message = Some(message.clone());
        }
        if let Some(failed_at) = self.failed_at_status {
            item.failed_at_status = Some(failed_at);
        }
        if let Some(flag) = self.review_flag {
            item.review_flag = flag;
        }
        if let Some(reason) = &self.review_reason {
            item.review_reason = Some(reason.clone());
        }
        item.updated_at_ms = now_ms;
    }

    /// Layers `overlay` on top of `self`: a field set in `overlay` wins,
    /// otherwise `self`'s value (if any) carries through. Used to combine
    /// a stage's `Prepare` patch with its `Execute` patch before committing
    /// a single event.
    pub fn merge(self, overlay: ItemPatch) -> ItemPatch {
        ItemPatch {
            progress: overlay.progress.or(self.progress),
            media_kind: overlay.media_kind.or(self.media_kind),
            disc_title: overlay.disc_title.or(self.disc_title),
            identification_metadata: overlay
                .identification_metadata
                .or(self.identification_metadata),
            rip_spec: overlay.rip_spec.or(self.rip_spec),
            encoding_details: overlay.encoding_details.or(self.encoding_details),
            ripped_file: overlay.ripped_file.or(self.ripped_file),
            encoded_file: overlay.encoded_file.or(self.encoded_file),
            final_file: overlay.final_file.or(self.final_file),
            append_envelope_section: overlay
                .append_envelope_section
                .or(self.append_envelope_section),
            error_message: overlay.error_message.or(self.error_message),
            failed_at_status: overlay.failed_at_status.or(self.failed_at_status),
            review_flag: overlay.review_flag.or(self.review_flag),
            review_reason: overlay.review_reason.or(self.review_reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// `NewDisc`/`NewFile`: insert a new item in `pending`.
    ItemCreated {
        id: ItemId,
        source_kind: SourceKind,
        disc_fingerprint: Option<String>,
        disc_title: Option<String>,
        source_path: Option<PathBuf>,
        at_ms: u64,
    },
    /// `Update`: a stage persisting progress/payloads without a status change.
    ItemUpdated {
        id: ItemId,
        patch: ItemPatch,
        at_ms: u64,
    },
    /// `ClaimNextReady`: ready -> in-flight successor, heartbeat set to now.
    ItemClaimed {
        id: ItemId,
        to_status: Status,
        at_ms: u64,
    },
    /// `CommitCompletion`: in-flight -> `to_status` (ready, terminal-success,
    /// or terminal-failed via the failure classifier), heartbeat cleared.
    ItemCommitted {
        id: ItemId,
        to_status: Status,
        patch: ItemPatch,
        at_ms: u64,
    },
    /// `UpdateHeartbeat`.
    HeartbeatUpdated { id: ItemId, at_ms: u64 },
    /// `ReclaimStale`/`ResetStuckProcessing`: in-flight -> ready predecessor,
    /// progress and heartbeat cleared.
    ItemReclaimed { id: ItemId, to_status: Status, at_ms: u64 },
    /// `RetryFailed`: failed -> pending, error/review cleared.
    ItemRetried { id: ItemId, at_ms: u64 },
    /// `StopItems`: -> failed, review flag set with an operator reason.
    ItemStopped {
        id: ItemId,
        reason: String,
        at_ms: u64,
    },
    /// `FailActiveOnShutdown`: every non-terminal item -> failed.
    ItemsFailedOnShutdown { ids: Vec<ItemId>, at_ms: u64 },
    /// `ClearCompleted`/`ClearFailed`: drop terminal items matching a status
    /// from the materialized queue (SPEC_FULL.md §11). The WAL entry itself
    /// is never rewritten; replay re-applies the removal.
    ItemsPruned { ids: Vec<ItemId>, at_ms: u64 },
}
