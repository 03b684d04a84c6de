// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The queue store (spec.md §4.1): the single source of truth for every
//! work item, backed by a WAL + periodic snapshot and guarded by one
//! writer lock (SPEC_FULL.md §2 "single-writer discipline").

use crate::error::StoreError;
use crate::event::{ItemPatch, QueueEvent};
use crate::snapshot::Snapshot;
use crate::state::QueueState;
use crate::wal::Wal;
use parking_lot::Mutex;
use spindle_core::clock::Clock;
use spindle_core::id::ItemId;
use spindle_core::item::{SourceKind, WorkItem};
use spindle_core::status::{Status, StatusKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded retry budget for transient WAL I/O errors (spec.md §4.1
/// "Failure semantics"). Exhausting this budget is fatal to the operation.
const MAX_FLUSH_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub by_status: HashMap<Status, usize>,
    pub total: usize,
    pub review_flagged: usize,
}

struct Inner {
    wal: Wal,
    state: QueueState,
    last_snapshot_seq: u64,
}

pub struct QueueStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    paths: StorePaths,
}

impl QueueStore {
    /// Loads the latest snapshot (if any) then replays every WAL entry
    /// after it, reconstructing `QueueState` exactly as it stood before
    /// whatever restart is now happening (spec.md §4.1 "Recovery").
    pub fn open(paths: StorePaths, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let snapshot = Snapshot::load(&paths.snapshot_path)?;
        let (mut state, snapshot_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (QueueState::new(), 0),
        };

        let mut wal = Wal::open(&paths.wal_path, snapshot_seq)?;
        let replay = wal.entries_after(snapshot_seq)?;
        let replayed = replay.len();
        for entry in &replay {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        info!(
            snapshot_seq,
            replayed_events = replayed,
            "queue store recovered"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                last_snapshot_seq: snapshot_seq,
            }),
            clock,
            paths,
        })
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Appends `event`, applies it to in-memory state, and flushes with
    /// bounded retry on transient WAL I/O failure.
    fn commit(&self, inner: &mut Inner, event: QueueEvent) -> Result<(), StoreError> {
        inner.wal.append(&event)?;
        inner.state.apply_event(&event);

        let mut attempt = 0u32;
        loop {
            match inner.wal.flush() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_FLUSH_ATTEMPTS {
                        return Err(StoreError::Exhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(attempt, error = %e, "transient WAL flush error, retrying");
                    thread::sleep(RETRY_BASE_DELAY * attempt);
                }
            }
        }
    }

    pub fn new_disc(&self, title: String, fingerprint: String) -> Result<ItemId, StoreError> {
        let mut inner = self.inner.lock();
        if inner
            .state
            .find_by_fingerprint(&fingerprint)
            .is_some()
        {
            return Err(StoreError::DuplicateFingerprint(fingerprint.to_lowercase()));
        }
        let id = inner.state.next_id();
        let event = QueueEvent::ItemCreated {
            id,
            source_kind: SourceKind::Disc,
            disc_fingerprint: Some(fingerprint),
            disc_title: Some(title),
            source_path: None,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)?;
        Ok(id)
    }

    pub fn new_file(&self, path: PathBuf) -> Result<ItemId, StoreError> {
        let mut inner = self.inner.lock();
        let id = inner.state.next_id();
        let event = QueueEvent::ItemCreated {
            id,
            source_kind: SourceKind::File,
            disc_fingerprint: None,
            disc_title: None,
            source_path: Some(path),
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)?;
        Ok(id)
    }

    pub fn get_by_id(&self, id: ItemId) -> Option<WorkItem> {
        self.inner.lock().state.get(id).cloned()
    }

    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Option<WorkItem> {
        self.inner
            .lock()
            .state
            .find_by_fingerprint(fingerprint)
            .cloned()
    }

    pub fn list(&self) -> Vec<WorkItem> {
        self.inner.lock().state.list().cloned().collect()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        let mut by_status: HashMap<Status, usize> = HashMap::new();
        let mut review_flagged = 0;
        let mut total = 0;
        for item in inner.state.list() {
            *by_status.entry(item.status).or_insert(0) += 1;
            if item.review_flag {
                review_flagged += 1;
            }
            total += 1;
        }
        QueueStats {
            by_status,
            total,
            review_flagged,
        }
    }

    pub fn update(&self, id: ItemId, patch: ItemPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get(id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        let event = QueueEvent::ItemUpdated {
            id,
            patch,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)
    }

    /// Claims the globally oldest item whose status is in `allowed_statuses`,
    /// moving it to that status's in-flight successor and stamping a fresh
    /// heartbeat (spec.md §4.1 "ClaimNextReady"). FIFO-by-`created_at`
    /// across every allowed status, not per-status.
    pub fn claim_next_ready(
        &self,
        allowed_statuses: &[Status],
    ) -> Result<Option<WorkItem>, StoreError> {
        let mut inner = self.inner.lock();

        let candidate = allowed_statuses
            .iter()
            .flat_map(|status| inner.state.ready_in_status(*status))
            .min_by_key(|item| item.created_at_ms)
            .map(|item| (item.id, item.status));

        let Some((id, ready_status)) = candidate else {
            return Ok(None);
        };

        let to_status = ready_status
            .in_flight_successor()
            .expect("ready_in_status only yields ready-kind items, which always have a successor");

        let event = QueueEvent::ItemClaimed {
            id,
            to_status,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)?;
        Ok(inner.state.get(id).cloned())
    }

    /// Commits the outcome of an in-flight stage: either the next ready
    /// status on success, or `Failed` (with `patch.failed_at_status` set)
    /// when the failure classifier routed the error there.
    pub fn commit_completion(
        &self,
        id: ItemId,
        to_status: Status,
        patch: ItemPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get(id)
            .ok_or(StoreError::NotFound(id))?
            .status;
        if current.kind() != StatusKind::InFlight {
            return Err(StoreError::NotInFlight {
                id,
                status: current,
            });
        }
        let event = QueueEvent::ItemCommitted {
            id,
            to_status,
            patch,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)
    }

    pub fn update_heartbeat(&self, id: ItemId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get(id)
            .ok_or(StoreError::NotFound(id))?
            .status;
        if current.kind() != StatusKind::InFlight {
            return Err(StoreError::NotInFlight {
                id,
                status: current,
            });
        }
        let event = QueueEvent::HeartbeatUpdated {
            id,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)
    }

    /// Rolls back every in-flight item whose heartbeat is older than
    /// `timeout_ms` to its ready predecessor (spec.md §4.2 "ReclaimStale").
    pub fn reclaim_stale(&self, timeout_ms: u64) -> Result<Vec<ItemId>, StoreError> {
        let mut inner = self.inner.lock();
        let now = self.now_ms();
        let cutoff = now.saturating_sub(timeout_ms);

        let stale: Vec<(ItemId, Status)> = inner
            .state
            .stale_in_flight(cutoff)
            .filter_map(|item| item.status.rollback_target().map(|target| (item.id, target)))
            .collect();

        let mut reclaimed = Vec::with_capacity(stale.len());
        for (id, to_status) in stale {
            let event = QueueEvent::ItemReclaimed {
                id,
                to_status,
                at_ms: now,
            };
            self.commit(&mut inner, event)?;
            reclaimed.push(id);
        }
        Ok(reclaimed)
    }

    /// Unconditionally rolls back every in-flight item, regardless of
    /// heartbeat age. Run once at startup (spec.md §4.5 step 1): any
    /// subprocess that was running when the daemon died is gone, so its
    /// claim can never be renewed.
    pub fn reset_stuck_processing(&self) -> Result<Vec<ItemId>, StoreError> {
        let mut inner = self.inner.lock();
        let now = self.now_ms();

        let stuck: Vec<(ItemId, Status)> = inner
            .state
            .all_in_flight()
            .filter_map(|item| item.status.rollback_target().map(|target| (item.id, target)))
            .collect();

        let mut reset = Vec::with_capacity(stuck.len());
        for (id, to_status) in stuck {
            let event = QueueEvent::ItemReclaimed {
                id,
                to_status,
                at_ms: now,
            };
            self.commit(&mut inner, event)?;
            reset.push(id);
        }
        Ok(reset)
    }

    pub fn retry_failed(&self, id: ItemId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get(id)
            .ok_or(StoreError::NotFound(id))?
            .status;
        if current != Status::Failed {
            return Err(StoreError::NotFailed { id, status: current });
        }
        let event = QueueEvent::ItemRetried {
            id,
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)
    }

    /// Marks every non-terminal item failed. Run on graceful shutdown if
    /// configured to not wait out in-flight work (spec.md §4.5 "Shutdown").
    pub fn fail_active_on_shutdown(&self) -> Result<Vec<ItemId>, StoreError> {
        let mut inner = self.inner.lock();
        let ids: Vec<ItemId> = inner.state.non_terminal().map(|item| item.id).collect();
        if ids.is_empty() {
            return Ok(ids);
        }
        let event = QueueEvent::ItemsFailedOnShutdown {
            ids: ids.clone(),
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)?;
        Ok(ids)
    }

    /// Operator-initiated stop: moves the listed items straight to
    /// `Failed` with a review reason, regardless of current status.
    pub fn stop_items(&self, ids: &[ItemId], reason: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for &id in ids {
            if inner.state.get(id).is_none() {
                return Err(StoreError::NotFound(id));
            }
        }
        for &id in ids {
            let event = QueueEvent::ItemStopped {
                id,
                reason: reason.to_string(),
                at_ms: self.now_ms(),
            };
            self.commit(&mut inner, event)?;
        }
        Ok(())
    }

    /// Drops every item currently in `status` from the materialized queue
    /// (SPEC_FULL.md §11 `ClearCompleted`/`ClearFailed`). Only sensible for
    /// a terminal status; callers are expected to pass `Completed` or
    /// `Failed`.
    pub fn prune_by_status(&self, status: Status) -> Result<Vec<ItemId>, StoreError> {
        let mut inner = self.inner.lock();
        let ids: Vec<ItemId> = inner
            .state
            .list()
            .filter(|item| item.status == status)
            .map(|item| item.id)
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }
        let event = QueueEvent::ItemsPruned {
            ids: ids.clone(),
            at_ms: self.now_ms(),
        };
        self.commit(&mut inner, event)?;
        Ok(ids)
    }

    /// Writes a fresh snapshot and truncates the WAL prefix it covers.
    /// Safe to call at any time; bounds replay time on the next restart.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.write_seq();
        if seq == inner.last_snapshot_seq {
            return Ok(());
        }

        let snapshot = Snapshot::new(seq, inner.state.clone(), self.now_ms());
        snapshot.save(&self.paths.snapshot_path)?;
        inner.wal.truncate_before(seq + 1)?;
        inner.last_snapshot_seq = seq;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
