// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow manager (spec.md §4.5): the worker pool, heartbeat ticker,
//! reclaim ticker, and startup/shutdown sequencing. This is the core of the
//! core — everything else in this crate exists to serve this module.

mod worker;

use crate::arbiter::{DiscArbiter, OwnerIdGen};
use crate::error::EngineError;
use crate::item_logger::ItemLogger;
use crate::monitor::DiscMonitor;
use crate::registry::StageRegistry;
use async_trait::async_trait;
use parking_lot::Mutex;
use spindle_core::config::WorkflowConfig;
use spindle_core::id::ItemId;
use spindle_core::status::Status;
use spindle_storage::QueueStore;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A binary the engine depends on (MakeMKV, drapto, ffprobe, ...). Probed
/// once at startup (spec.md §4.5 step 3); a missing required dependency
/// aborts the start (spec.md §6.5 exit code 4).
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    fn name(&self) -> &str;
    async fn is_available(&self) -> bool;
    /// Whether a missing dependency should abort startup, or just disable
    /// the stage(s) that need it.
    fn required(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Working,
}

#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub phase: WorkerPhase,
    pub current_item: Option<ItemId>,
    pub stage: Option<Status>,
    pub since_ms: u64,
}

impl WorkerStatus {
    fn idle(since_ms: u64) -> Self {
        Self {
            phase: WorkerPhase::Idle,
            current_item: None,
            stage: None,
            since_ms,
        }
    }
}

/// A snapshot of the engine's state, as surfaced by the IPC `Status()` call
/// (spec.md §6.4).
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub running: bool,
    pub workers: Vec<WorkerStatus>,
    pub in_flight_count: usize,
    pub ready_counts_by_status: HashMap<Status, usize>,
    pub failed_count: usize,
    pub completed_count: usize,
    pub dependencies: Vec<(String, bool)>,
}

pub struct Runtime {
    pub(crate) store: Arc<QueueStore>,
    pub(crate) registry: Arc<StageRegistry>,
    pub(crate) arbiter: Arc<DiscArbiter>,
    pub(crate) config: WorkflowConfig,
    pub(crate) owner_ids: OwnerIdGen,
    pub(crate) pool_token: CancellationToken,
    pub(crate) item_tokens: Mutex<HashMap<ItemId, CancellationToken>>,
    pub(crate) stopped_by_operator: Mutex<HashSet<ItemId>>,
    pub(crate) worker_statuses: Mutex<Vec<WorkerStatus>>,
    pub(crate) item_logger: Arc<ItemLogger>,
    dependency_probes: Vec<Arc<dyn DependencyProbe>>,
    dependency_status: Mutex<Vec<(String, bool)>>,
}

impl Runtime {
    pub fn new(
        store: Arc<QueueStore>,
        registry: Arc<StageRegistry>,
        arbiter: Arc<DiscArbiter>,
        config: WorkflowConfig,
        dependency_probes: Vec<Arc<dyn DependencyProbe>>,
        items_log_dir: PathBuf,
    ) -> Arc<Self> {
        let worker_count = config.worker_count.max(1);
        Arc::new(Self {
            store,
            registry,
            arbiter,
            config,
            owner_ids: OwnerIdGen::default(),
            pool_token: CancellationToken::new(),
            item_tokens: Mutex::new(HashMap::new()),
            stopped_by_operator: Mutex::new(HashSet::new()),
            worker_statuses: Mutex::new(vec![WorkerStatus::idle(0); worker_count]),
            item_logger: Arc::new(ItemLogger::new(items_log_dir)),
            dependency_probes,
            dependency_status: Mutex::new(Vec::new()),
        })
    }

    /// The ready statuses worth attempting a claim on this cycle: every
    /// ready status, minus disc-dependent ones while the arbiter is held by
    /// someone else (spec.md §4.5 step 1, "cheap advisory check; the
    /// arbiter is the authority"). Never authoritative — a status surviving
    /// this filter can still lose the race to acquire the arbiter itself.
    pub(crate) fn claimable_statuses(&self) -> Vec<Status> {
        let disc_dependent = self.registry.disc_dependent_statuses();
        let arbiter_busy = self.arbiter.is_held();
        Status::ALL
            .into_iter()
            .filter(|s| s.is_ready())
            .filter(|s| {
                let successor_is_disc_dependent = s
                    .in_flight_successor()
                    .is_some_and(|successor| disc_dependent.contains(&successor));
                !(arbiter_busy && successor_is_disc_dependent)
            })
            .collect()
    }

    pub fn status(&self) -> EngineStatus {
        let stats = self.store.stats();
        let in_flight_count = stats
            .by_status
            .iter()
            .filter(|(status, _)| status.is_in_flight())
            .map(|(_, count)| count)
            .sum();
        EngineStatus {
            running: !self.pool_token.is_cancelled(),
            workers: self.worker_statuses.lock().clone(),
            in_flight_count,
            ready_counts_by_status: stats
                .by_status
                .iter()
                .filter(|(status, _)| status.is_ready())
                .map(|(s, c)| (*s, *c))
                .collect(),
            failed_count: *stats.by_status.get(&Status::Failed).unwrap_or(&0),
            completed_count: *stats.by_status.get(&Status::Completed).unwrap_or(&0),
            dependencies: self.dependency_status.lock().clone(),
        }
    }

    /// Requests that the named item's `Execute` be cancelled and routed to
    /// `Failed` with a review reason, rather than retried (spec.md §7 item
    /// 3, §8 scenario 6). Returns immediately; the worker owning the item
    /// observes the cancellation on its own schedule.
    pub fn request_stop(&self, id: ItemId) {
        self.stopped_by_operator.lock().insert(id);
        if let Some(token) = self.item_tokens.lock().get(&id) {
            token.cancel();
        }
    }

    /// Runs dependency probes (spec.md §4.5 step 3). Returns the probe
    /// results for the status surface; errors if a *required* dependency
    /// is unavailable.
    async fn check_dependencies(&self) -> Result<Vec<(String, bool)>, EngineError> {
        let mut results = Vec::with_capacity(self.dependency_probes.len());
        let mut missing_required = None;
        for probe in &self.dependency_probes {
            let available = probe.is_available().await;
            results.push((probe.name().to_string(), available));
            if !available && probe.required() && missing_required.is_none() {
                missing_required = Some(probe.name().to_string());
            }
        }
        *self.dependency_status.lock() = results.clone();
        if let Some(name) = missing_required {
            return Err(EngineError::DependencyMissing(name));
        }
        Ok(results)
    }

    /// Runs the engine until `shutdown` is cancelled: startup sequence
    /// (spec.md §4.5 "Startup sequence"), worker pool + tickers + disc
    /// monitor, then the shutdown sequence on cancel.
    ///
    /// Takes `runtime: &Arc<Self>` rather than a receiver so every spawned
    /// task below can hold its own clone.
    pub async fn run(
        runtime: &Arc<Self>,
        monitor: Arc<DiscMonitor>,
        shutdown: CancellationToken,
    ) -> Result<(), EngineError> {
        let reset = runtime.store.reset_stuck_processing()?;
        if !reset.is_empty() {
            info!(count = reset.len(), "reset stuck in-flight items at startup");
        }

        runtime.check_dependencies().await?;

        let mut tasks = JoinSet::new();

        for worker_id in 0..runtime.config.worker_count.max(1) {
            let runtime = Arc::clone(runtime);
            tasks.spawn(async move { worker::run(worker_id, runtime).await });
        }

        {
            let runtime = Arc::clone(runtime);
            tasks.spawn(async move { worker::run_heartbeat_ticker(runtime).await });
        }
        {
            let runtime = Arc::clone(runtime);
            tasks.spawn(async move { worker::run_reclaim_ticker(runtime).await });
        }
        {
            let pool_token = runtime.pool_token.clone();
            let monitor = Arc::clone(&monitor);
            tasks.spawn(async move {
                monitor.run(pool_token).await;
            });
        }

        shutdown.cancelled().await;
        info!("shutdown requested, cancelling workflow manager tasks");
        runtime.pool_token.cancel();

        let grace = Duration::from_secs(runtime.config.heartbeat_timeout_secs.max(5));
        if tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_err()
        {
            warn!("shutdown grace period expired with tasks still running");
        }

        let failed = runtime.store.fail_active_on_shutdown()?;
        if !failed.is_empty() {
            info!(count = failed.len(), "failed active items on shutdown");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
