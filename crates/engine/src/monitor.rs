// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The disc monitor (spec.md §4.4): detects disc insertion, fingerprints
//! it, and reconciles the queue accordingly.

use crate::arbiter::{DiscArbiter, OwnerId};
use crate::registry::StageRegistry;
use async_trait::async_trait;
use spindle_core::status::{Status, StatusKind};
use spindle_storage::QueueStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("fingerprint computation failed: {0}")]
    Fingerprint(String),
    #[error("queue store error: {0}")]
    Store(#[from] spindle_storage::StoreError),
}

#[derive(Debug, Clone)]
pub struct DiscInfo {
    pub label: String,
    pub media_type: String,
}

/// Reads label/media-type off the optical drive. `Ok(None)` means the tray
/// is empty or unreadable.
#[async_trait]
pub trait DiscProbe: Send + Sync {
    async fn probe(&self) -> Result<Option<DiscInfo>, MonitorError>;
}

/// Computes a stable, opaque fingerprint for a detected disc.
#[async_trait]
pub trait FingerprintProvider: Send + Sync {
    async fn fingerprint(&self, disc: &DiscInfo) -> Result<String, MonitorError>;
}

/// Statuses that are re-inserted-while-working and therefore left alone
/// (spec.md §4.4 step 6, "in-flight or near-terminal intermediate").
fn is_in_progress_ready_status(status: Status) -> bool {
    matches!(
        status,
        Status::Identified
            | Status::Ripped
            | Status::EpisodeIdentified
            | Status::Encoded
            | Status::AudioAnalyzed
            | Status::Subtitled
    )
}

/// The fixed owner identity the monitor presents to the disc arbiter. Every
/// ripping/identifying stage instance must use a different id so the
/// arbiter's re-entrancy check never conflates the monitor with a stage.
pub const MONITOR_OWNER_ID: OwnerId = 0;

pub struct DiscMonitor {
    store: Arc<QueueStore>,
    arbiter: Arc<DiscArbiter>,
    registry: Arc<StageRegistry>,
    probe: Arc<dyn DiscProbe>,
    fingerprint_provider: Arc<dyn FingerprintProvider>,
    poll_interval: Duration,
}

impl DiscMonitor {
    pub fn new(
        store: Arc<QueueStore>,
        arbiter: Arc<DiscArbiter>,
        registry: Arc<StageRegistry>,
        probe: Arc<dyn DiscProbe>,
        fingerprint_provider: Arc<dyn FingerprintProvider>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            arbiter,
            registry,
            probe,
            fingerprint_provider,
            poll_interval,
        }
    }

    /// Runs the poll loop until `cancellation` fires.
    pub async fn run(&self, cancellation: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.on_detected().await {
                        warn!(error = %e, "disc monitor cycle failed, will retry next tick");
                    }
                }
                _ = cancellation.cancelled() => {
                    info!("disc monitor stopping");
                    return;
                }
            }
        }
    }

    /// One detection cycle (spec.md §4.4 steps 2-7).
    pub async fn on_detected(&self) -> Result<(), MonitorError> {
        let disc_dependent = self.registry.disc_dependent_statuses();
        let any_disc_dependent_in_flight = self
            .store
            .list()
            .into_iter()
            .any(|item| item.status.kind() == StatusKind::InFlight && disc_dependent.contains(&item.status));
        if any_disc_dependent_in_flight {
            return Ok(());
        }

        let Some(guard) = DiscArbiter::try_acquire(&self.arbiter, MONITOR_OWNER_ID) else {
            return Ok(());
        };

        let disc = match self.probe.probe().await {
            Ok(Some(disc)) => disc,
            Ok(None) => {
                drop(guard);
                return Ok(());
            }
            Err(e) => {
                drop(guard);
                return Err(e);
            }
        };

        let fingerprint = match self.fingerprint_provider.fingerprint(&disc).await {
            Ok(fp) => fp,
            Err(e) => {
                drop(guard);
                warn!(error = %e, "fingerprint computation failed, will retry next cycle");
                return Ok(());
            }
        };

        self.reconcile(&disc, &fingerprint)?;
        drop(guard);
        Ok(())
    }

    fn reconcile(&self, disc: &DiscInfo, fingerprint: &str) -> Result<(), MonitorError> {
        match self.store.find_by_fingerprint(fingerprint) {
            None => {
                self.store.new_disc(disc.label.clone(), fingerprint.to_string())?;
                info!(label = %disc.label, %fingerprint, "new disc queued");
            }
            Some(existing) if existing.status == Status::Completed => {
                info!(id = %existing.id, %fingerprint, "disc already completed, ignoring reinsertion");
            }
            Some(existing)
                if existing.status.kind() == StatusKind::InFlight
                    || is_in_progress_ready_status(existing.status) =>
            {
                info!(id = %existing.id, status = %existing.status, "disc already in progress, leaving untouched");
            }
            Some(existing) => {
                // failed, pending, or any other ready status: reset to pending.
                if existing.status == Status::Failed {
                    // RetryFailed already clears error/review/progress/heartbeat.
                    self.store.retry_failed(existing.id)?;
                }
                if existing.disc_title.as_deref() != Some(disc.label.as_str()) {
                    use spindle_storage::ItemPatch;
                    self.store.update(
                        existing.id,
                        ItemPatch {
                            disc_title: Some(disc.label.clone()),
                            ..Default::default()
                        },
                    )?;
                }
                info!(id = %existing.id, %fingerprint, "disc reset to pending");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
