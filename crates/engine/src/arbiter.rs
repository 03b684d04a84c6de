// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The disc arbiter (spec.md §4.3): a single-slot mutual-exclusion gate
//! around the optical device, re-entrant for the same owner and exclusive
//! across owners. Implemented as the spec's re-architecture guidance
//! suggests (§9): "a token ... with an owner-id check to allow re-entry
//! from the same stage instance."

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

pub type OwnerId = u64;

struct ArbiterState {
    owner: Option<OwnerId>,
    depth: u32,
}

/// Mints distinct owner ids so unrelated callers never collide by accident.
#[derive(Debug, Default)]
pub struct OwnerIdGen(AtomicU64);

impl OwnerIdGen {
    pub fn next(&self) -> OwnerId {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

pub struct DiscArbiter {
    state: Mutex<ArbiterState>,
    notify: Notify,
}

/// Held while the caller has exclusive (or re-entrant) access to the
/// drive. Releasing is automatic on drop, which also wakes the next
/// waiter once the outermost re-entrant hold ends.
pub struct ArbiterGuard {
    arbiter: Arc<DiscArbiter>,
    owner: OwnerId,
}

impl Drop for ArbiterGuard {
    fn drop(&mut self) {
        let mut state = match self.arbiter.state.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // Another task holds the lock (e.g. a concurrent acquire
                // is about to contend with us) — spin onto blocking lock
                // via a detached task so drop itself never blocks async.
                let arbiter = self.arbiter.clone();
                let owner = self.owner;
                tokio::spawn(async move {
                    let mut state = arbiter.state.lock().await;
                    release_locked(&mut state, owner);
                    arbiter.notify.notify_one();
                });
                return;
            }
        };
        release_locked(&mut state, self.owner);
        self.arbiter.notify.notify_one();
    }
}

fn release_locked(state: &mut ArbiterState, owner: OwnerId) {
    if state.owner != Some(owner) {
        return;
    }
    state.depth = state.depth.saturating_sub(1);
    if state.depth == 0 {
        state.owner = None;
    }
}

#[derive(Debug)]
pub struct Cancelled;

impl DiscArbiter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ArbiterState {
                owner: None,
                depth: 0,
            }),
            notify: Notify::new(),
        })
    }

    /// Waits until `owner` holds (or re-enters) the arbiter, or until
    /// `cancellation` fires first. Takes an explicit `&Arc<Self>` rather
    /// than an `Arc<Self>` receiver so the returned guard can hold its own
    /// clone without forcing every caller to give up ownership.
    pub async fn acquire(
        arbiter: &Arc<Self>,
        owner: OwnerId,
        cancellation: &CancellationToken,
    ) -> Result<ArbiterGuard, Cancelled> {
        loop {
            if let Some(guard) = Self::try_acquire(arbiter, owner) {
                return Ok(guard);
            }
            tokio::select! {
                _ = arbiter.notify.notified() => {}
                _ = cancellation.cancelled() => return Err(Cancelled),
            }
        }
    }

    /// Cheap advisory check for a worker deciding whether a disc-dependent
    /// status is worth claiming this cycle (spec.md §4.5 step 1). The
    /// arbiter itself remains the authority: a `false` here never guarantees
    /// `try_acquire` will succeed, and a `true` is conservative (lock
    /// contention is treated as "held").
    pub fn is_held_by_other(&self, owner: OwnerId) -> bool {
        match self.state.try_lock() {
            Ok(state) => matches!(state.owner, Some(current) if current != owner),
            Err(_) => true,
        }
    }

    /// Whether anyone at all currently holds the slot, own claims included.
    pub fn is_held(&self) -> bool {
        match self.state.try_lock() {
            Ok(state) => state.owner.is_some(),
            Err(_) => true,
        }
    }

    /// Non-blocking attempt: succeeds immediately if free or already held
    /// by `owner`.
    pub fn try_acquire(arbiter: &Arc<Self>, owner: OwnerId) -> Option<ArbiterGuard> {
        let mut state = arbiter.state.try_lock().ok()?;
        match state.owner {
            None => {
                state.owner = Some(owner);
                state.depth = 1;
                Some(ArbiterGuard {
                    arbiter: arbiter.clone(),
                    owner,
                })
            }
            Some(current) if current == owner => {
                state.depth += 1;
                Some(ArbiterGuard {
                    arbiter: arbiter.clone(),
                    owner,
                })
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "arbiter_tests.rs"]
mod tests;
