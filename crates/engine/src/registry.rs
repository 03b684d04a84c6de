// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stage registry (spec.md §4.2, §6.1): a constant-time lookup from
//! in-flight status to the capability object that advances it.
//!
//! An absent handler is a legal configuration (spec.md §4.2: "a handler may
//! be absent; absent handlers behave as an immediate no-op"), used to skip
//! an optional stage such as subtitling when disabled.

use crate::error::StageFailure;
use crate::item_logger::ItemLogger;
use async_trait::async_trait;
use spindle_core::id::ItemId;
use spindle_core::item::WorkItem;
use spindle_core::status::Status;
use spindle_storage::ItemPatch;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    pub detail: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            ok: true,
            detail: String::new(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

/// The item and stage an `ItemLogger` write is attributed to, carried
/// alongside it so `StageContext::log` doesn't need its caller to repeat
/// either.
struct ItemLog {
    logger: Arc<ItemLogger>,
    item_id: ItemId,
    stage: &'static str,
}

/// Per-call context handed to a stage (spec.md §9: "pass an explicit
/// per-request context object through Prepare/Execute" rather than rely on
/// ambient globals).
pub struct StageContext {
    pub cancellation: CancellationToken,
    item_log: Option<ItemLog>,
}

impl StageContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            item_log: None,
        }
    }

    /// A context that also appends to the item's per-item log file
    /// (spec.md §6.3) as the stage progresses.
    pub fn with_item_log(
        cancellation: CancellationToken,
        logger: Arc<ItemLogger>,
        item_id: ItemId,
        stage: &'static str,
    ) -> Self {
        Self {
            cancellation,
            item_log: Some(ItemLog {
                logger,
                item_id,
                stage,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Appends a line to the item's per-item log, if one is wired up.
    /// A no-op for contexts built with `new` (e.g. in handler unit tests).
    pub fn log(&self, message: &str) {
        if let Some(item_log) = &self.item_log {
            item_log.logger.append(item_log.item_id, item_log.stage, message);
        }
    }
}

/// The capability every in-flight status's handler must implement
/// (spec.md §6.1).
///
/// `prepare`/`execute` describe their effect as an [`ItemPatch`] rather than
/// mutating `item` in place: the patch is exactly what the worker commits to
/// the queue store, so a handler can never silently lose state by mutating a
/// copy nothing persists. `item` reflects `prepare`'s patch already applied
/// by the time `execute` sees it.
#[async_trait]
pub trait StageHandler: Send + Sync {
    /// Cheap, synchronous-in-spirit validation and state-patching run on
    /// the worker immediately after claim.
    async fn prepare(&self, item: &WorkItem) -> Result<ItemPatch, StageFailure>;

    /// The long-running work. Must honor `ctx.cancellation` promptly.
    async fn execute(&self, ctx: &StageContext, item: &WorkItem) -> Result<ItemPatch, StageFailure>;

    async fn health_check(&self) -> HealthStatus;

    /// Whether this stage reads the physical optical drive and therefore
    /// must hold the disc arbiter while executing (spec.md §9: derive the
    /// disc-dependent set from handler metadata, not a hard-coded list).
    fn disc_dependent(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct StageRegistry {
    handlers: HashMap<Status, Arc<dyn StageHandler>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, status: Status, handler: Arc<dyn StageHandler>) {
        assert!(
            status.is_in_flight(),
            "a stage handler can only own an in-flight status, got {status:?}"
        );
        self.handlers.insert(status, handler);
    }

    pub fn get(&self, status: Status) -> Option<Arc<dyn StageHandler>> {
        self.handlers.get(&status).cloned()
    }

    /// The set of in-flight statuses whose handler reads the optical
    /// drive. Derived from handler metadata each call, not cached, so a
    /// registry reconfigured between tests reflects it immediately.
    pub fn disc_dependent_statuses(&self) -> HashSet<Status> {
        self.handlers
            .iter()
            .filter(|(_, handler)| handler.disc_dependent())
            .map(|(status, _)| *status)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler {
        disc_dependent: bool,
    }

    #[async_trait]
    impl StageHandler for NoopHandler {
        async fn prepare(&self, _item: &WorkItem) -> Result<ItemPatch, StageFailure> {
            Ok(ItemPatch::default())
        }

        async fn execute(
            &self,
            _ctx: &StageContext,
            _item: &WorkItem,
        ) -> Result<ItemPatch, StageFailure> {
            Ok(ItemPatch::default())
        }

        async fn health_check(&self) -> HealthStatus {
            HealthStatus::healthy()
        }

        fn disc_dependent(&self) -> bool {
            self.disc_dependent
        }
    }

    #[test]
    fn disc_dependent_statuses_are_derived_from_handler_metadata() {
        let mut registry = StageRegistry::new();
        registry.register(
            Status::Identifying,
            Arc::new(NoopHandler {
                disc_dependent: true,
            }),
        );
        registry.register(
            Status::Encoding,
            Arc::new(NoopHandler {
                disc_dependent: false,
            }),
        );

        let disc_dependent = registry.disc_dependent_statuses();
        assert!(disc_dependent.contains(&Status::Identifying));
        assert!(!disc_dependent.contains(&Status::Encoding));
    }

    #[test]
    #[should_panic(expected = "in-flight status")]
    fn registering_a_ready_status_panics() {
        let mut registry = StageRegistry::new();
        registry.register(
            Status::Pending,
            Arc::new(NoopHandler {
                disc_dependent: false,
            }),
        );
    }
}
