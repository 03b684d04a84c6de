// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory materialization of the queue, rebuilt from a `Snapshot`
//! plus WAL replay (spec.md §4.1 "Recovery").
//!
//! `apply_event` is the single place queue semantics live. It must be
//! idempotent: a crash between a WAL flush and `mark_processed` can hand the
//! same event to `apply_event` twice, and the result must be identical to
//! applying it once.

use crate::event::{ItemPatch, QueueEvent};
use serde::{Deserialize, Serialize};
use spindle_core::id::ItemId;
use spindle_core::item::WorkItem;
use spindle_core::status::{Status, StatusKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueState {
    items: HashMap<ItemId, WorkItem>,
    /// Lowercased disc fingerprint -> item id (spec.md §3.1 invariant 1).
    fingerprint_index: HashMap<String, ItemId>,
    next_id: u64,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.get(&id)
    }

    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Option<&WorkItem> {
        self.fingerprint_index
            .get(&fingerprint.to_lowercase())
            .and_then(|id| self.items.get(id))
    }

    pub fn list(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.values()
    }

    pub fn ready_in_status(&self, status: Status) -> impl Iterator<Item = &WorkItem> {
        self.items
            .values()
            .filter(move |item| item.status == status)
    }

    pub fn stale_in_flight<'a>(&'a self, cutoff_ms: u64) -> impl Iterator<Item = &'a WorkItem> {
        self.items.values().filter(move |item| {
            item.status.kind() == StatusKind::InFlight
                && item.heartbeat_ms.map(|hb| hb < cutoff_ms).unwrap_or(false)
        })
    }

    pub fn all_in_flight(&self) -> impl Iterator<Item = &WorkItem> {
        self.items
            .values()
            .filter(|item| item.status.kind() == StatusKind::InFlight)
    }

    pub fn non_terminal(&self) -> impl Iterator<Item = &WorkItem> {
        self.items
            .values()
            .filter(|item| item.status.kind() != StatusKind::Terminal)
    }

    pub fn next_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId::new(self.next_id)
    }

    /// Applies a single queue event. Must stay idempotent (see module docs).
    pub fn apply_event(&mut self, event: &QueueEvent) {
        match event {
            QueueEvent::ItemCreated {
                id,
                source_kind,
                disc_fingerprint,
                disc_title,
                source_path,
                at_ms,
            } => {
                if self.items.contains_key(id) {
                    return;
                }
                let item = match source_kind {
                    spindle_core::item::SourceKind::Disc => WorkItem::new_disc(
                        *id,
                        disc_title.clone().unwrap_or_default(),
                        disc_fingerprint.clone().unwrap_or_default(),
                        *at_ms,
                    ),
                    spindle_core::item::SourceKind::File => {
                        WorkItem::new_file(*id, source_path.clone().unwrap_or_default(), *at_ms)
                    }
                };
                if let Some(fp) = &item.disc_fingerprint {
                    self.fingerprint_index.insert(fp.clone(), *id);
                }
                self.next_id = self.next_id.max(id.get());
                self.items.insert(*id, item);
            }

            QueueEvent::ItemUpdated { id, patch, at_ms } => {
                if let Some(item) = self.items.get_mut(id) {
                    patch.apply_to(item, *at_ms);
                }
            }

            QueueEvent::ItemClaimed {
                id,
                to_status,
                at_ms,
            } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = *to_status;
                    item.heartbeat_ms = Some(*at_ms);
                    item.updated_at_ms = *at_ms;
                }
            }

            QueueEvent::ItemCommitted {
                id,
                to_status,
                patch,
                at_ms,
            } => {
                if let Some(item) = self.items.get_mut(id) {
                    patch.apply_to(item, *at_ms);
                    item.status = *to_status;
                    item.heartbeat_ms = None;
                    item.progress.clear();
                    item.updated_at_ms = *at_ms;
                }
            }

            QueueEvent::HeartbeatUpdated { id, at_ms } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.heartbeat_ms = Some(*at_ms);
                }
            }

            QueueEvent::ItemReclaimed {
                id,
                to_status,
                at_ms,
            } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = *to_status;
                    item.heartbeat_ms = None;
                    item.progress.clear();
                    item.updated_at_ms = *at_ms;
                }
            }

            QueueEvent::ItemRetried { id, at_ms } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = Status::Pending;
                    item.failed_at_status = None;
                    item.error_message = None;
                    item.review_flag = false;
                    item.review_reason = None;
                    item.heartbeat_ms = None;
                    item.progress.clear();
                    item.updated_at_ms = *at_ms;
                }
            }

            QueueEvent::ItemStopped { id, reason, at_ms } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.failed_at_status = Some(item.status);
                    item.status = Status::Failed;
                    item.heartbeat_ms = None;
                    item.review_flag = true;
                    item.review_reason = Some(reason.clone());
                    item.updated_at_ms = *at_ms;
                }
            }

            QueueEvent::ItemsFailedOnShutdown { ids, at_ms } => {
                for id in ids {
                    if let Some(item) = self.items.get_mut(id) {
                        if item.status.kind() != StatusKind::Terminal {
                            item.failed_at_status = Some(item.status);
                            item.status = Status::Failed;
                            item.heartbeat_ms = None;
                            item.review_flag = true;
                            item.review_reason = Some("active at shutdown".to_string());
                            item.error_message = Some("daemon stopped".to_string());
                            item.updated_at_ms = *at_ms;
                        }
                    }
                }
            }

            QueueEvent::ItemsPruned { ids, at_ms: _ } => {
                for id in ids {
                    if let Some(item) = self.items.remove(id) {
                        if let Some(fp) = &item.disc_fingerprint {
                            self.fingerprint_index.remove(fp);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
