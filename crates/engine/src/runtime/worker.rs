// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-worker loop and the heartbeat/reclaim tickers (spec.md §4.5
//! steps 1-4).

use super::{Runtime, WorkerPhase, WorkerStatus};
use crate::arbiter::DiscArbiter;
use crate::classifier::FailureClassifier;
use crate::registry::StageContext;
use spindle_core::id::ItemId;
use spindle_core::item::WorkItem;
use spindle_core::status::Status;
use spindle_storage::{ItemPatch, QueueStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const ARBITER_ACQUIRE_DEADLINE: Duration = Duration::from_secs(30);

/// One worker's lifetime: poll, claim, run a stage to completion, repeat,
/// until the pool is cancelled.
pub(super) async fn run(worker_id: usize, runtime: Arc<Runtime>) {
    let poll_interval = Duration::from_secs(runtime.config.queue_poll_interval_secs.max(1));

    loop {
        tokio::select! {
            _ = runtime.pool_token.cancelled() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }

        let allowed = runtime.claimable_statuses();
        let claimed = match runtime.store.claim_next_ready(&allowed) {
            Ok(Some(item)) => item,
            Ok(None) => continue,
            Err(e) => {
                warn!(worker_id, error = %e, "claim_next_ready failed, will retry next poll");
                continue;
            }
        };

        run_claimed_item(worker_id, &runtime, claimed).await;
        set_idle(&runtime, worker_id);
    }
}

async fn run_claimed_item(worker_id: usize, runtime: &Arc<Runtime>, mut item: WorkItem) {
    let id = item.id;
    let stage_status = item.status;
    set_working(runtime, worker_id, id, stage_status);
    info!(worker_id, item = %id, stage = %stage_status, "claimed item");
    runtime.item_logger.append(id, stage_status.as_str(), "claimed");

    let item_token = register_item_token(runtime, id);

    let Some(handler) = runtime.registry.get(stage_status) else {
        // spec.md §4.2: an absent handler is a no-op that advances the item.
        info!(worker_id, item = %id, stage = %stage_status, "no handler registered, passing through");
        let next = stage_status
            .next_on_success()
            .expect("stage_status is in-flight, which always has a success successor");
        commit_or_log(&runtime.store, id, next, ItemPatch::default());
        unregister_item_token(runtime, id);
        return;
    };

    let disc_guard = if handler.disc_dependent() {
        let owner = runtime.owner_ids.next();
        match tokio::time::timeout(
            ARBITER_ACQUIRE_DEADLINE,
            DiscArbiter::acquire(&runtime.arbiter, owner, &item_token),
        )
        .await
        {
            Ok(Ok(guard)) => Some(guard),
            Ok(Err(_cancelled)) | Err(_timeout) => {
                // Couldn't get the drive in time: requeue rather than hold
                // the in-flight slot open (spec.md §4.5 step 2).
                info!(worker_id, item = %id, stage = %stage_status, "arbiter unavailable, requeuing");
                let predecessor = stage_status
                    .rollback_target()
                    .expect("stage_status is in-flight, which always has a rollback target");
                commit_or_log(&runtime.store, id, predecessor, ItemPatch::default());
                unregister_item_token(runtime, id);
                return;
            }
        }
    } else {
        None
    };

    let prepare_patch = match handler.prepare(&item).await {
        Ok(patch) => patch,
        Err(failure) => {
            drop(disc_guard);
            fail_item(runtime, id, stage_status, ItemPatch::default(), failure.as_ref());
            unregister_item_token(runtime, id);
            return;
        }
    };
    prepare_patch.apply_to(&mut item, runtime.store.now_ms());

    let ctx = StageContext::with_item_log(
        item_token.clone(),
        Arc::clone(&runtime.item_logger),
        id,
        stage_status.as_str(),
    );
    let result = handler.execute(&ctx, &item).await;
    drop(disc_guard);

    match result {
        Ok(execute_patch) => {
            let next = stage_status
                .next_on_success()
                .expect("stage_status is in-flight, which always has a success successor");
            let patch = prepare_patch.merge(execute_patch);
            commit_or_log(&runtime.store, id, next, patch);
            info!(worker_id, item = %id, stage = %stage_status, next = %next, "stage completed");
            runtime
                .item_logger
                .append(id, stage_status.as_str(), &format!("stage completed, advancing to {next}"));
        }
        Err(failure) => {
            if runtime.stopped_by_operator.lock().remove(&id) {
                let patch = prepare_patch.merge(ItemPatch {
                    failed_at_status: Some(stage_status),
                    review_flag: Some(true),
                    review_reason: Some("stopped by operator".to_string()),
                    error_message: Some(failure.to_string()),
                    ..Default::default()
                });
                commit_or_log(&runtime.store, id, Status::Failed, patch);
                info!(worker_id, item = %id, stage = %stage_status, "item stopped by operator");
                runtime
                    .item_logger
                    .append(id, stage_status.as_str(), "stopped by operator");
            } else if runtime.pool_token.is_cancelled() {
                // Shutdown cancellation, not a real failure: requeue so the
                // next startup's ResetStuckProcessing (or a future worker,
                // if shutdown is aborted) can pick it back up.
                let predecessor = stage_status
                    .rollback_target()
                    .expect("stage_status is in-flight, which always has a rollback target");
                commit_or_log(&runtime.store, id, predecessor, ItemPatch::default());
                info!(worker_id, item = %id, stage = %stage_status, "stage cancelled for shutdown, rolled back");
                runtime
                    .item_logger
                    .append(id, stage_status.as_str(), "cancelled for shutdown, rolled back");
            } else {
                runtime
                    .item_logger
                    .append(id, stage_status.as_str(), &format!("stage failed: {failure}"));
                fail_item(runtime, id, stage_status, prepare_patch, failure.as_ref());
            }
        }
    }

    unregister_item_token(runtime, id);
}

fn fail_item(
    runtime: &Arc<Runtime>,
    id: ItemId,
    stage_status: Status,
    base_patch: ItemPatch,
    failure: &dyn spindle_core::error::StageError,
) {
    let classification = FailureClassifier::classify(failure);
    let patch = base_patch.merge(ItemPatch {
        failed_at_status: Some(stage_status),
        review_flag: Some(classification.needs_review),
        review_reason: classification.review_reason.clone(),
        error_message: Some(classification.error_message.clone()),
        ..Default::default()
    });
    warn!(
        item = %id,
        stage = %stage_status,
        needs_review = classification.needs_review,
        error = %classification.error_message,
        "stage failed"
    );
    commit_or_log(&runtime.store, id, Status::Failed, patch);
}

fn commit_or_log(store: &QueueStore, id: ItemId, to_status: Status, patch: ItemPatch) {
    if let Err(e) = store.commit_completion(id, to_status, patch) {
        warn!(item = %id, to_status = %to_status, error = %e, "commit_completion failed");
    }
}

fn register_item_token(runtime: &Arc<Runtime>, id: ItemId) -> CancellationToken {
    let token = runtime.pool_token.child_token();
    runtime.item_tokens.lock().insert(id, token.clone());
    token
}

fn unregister_item_token(runtime: &Arc<Runtime>, id: ItemId) {
    runtime.item_tokens.lock().remove(&id);
}

fn set_working(runtime: &Arc<Runtime>, worker_id: usize, id: ItemId, stage: Status) {
    let now = runtime.store.now_ms();
    if let Some(slot) = runtime.worker_statuses.lock().get_mut(worker_id) {
        *slot = WorkerStatus {
            phase: WorkerPhase::Working,
            current_item: Some(id),
            stage: Some(stage),
            since_ms: now,
        };
    }
}

fn set_idle(runtime: &Arc<Runtime>, worker_id: usize) {
    let now = runtime.store.now_ms();
    if let Some(slot) = runtime.worker_statuses.lock().get_mut(worker_id) {
        *slot = WorkerStatus {
            phase: WorkerPhase::Idle,
            current_item: None,
            stage: None,
            since_ms: now,
        };
    }
}

/// Refreshes the heartbeat of every item this process currently owns
/// (spec.md §4.5: "UpdateHeartbeat every heartbeat_interval_secs").
pub(super) async fn run_heartbeat_ticker(runtime: Arc<Runtime>) {
    let interval = Duration::from_secs(runtime.config.heartbeat_interval_secs.max(1));
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = runtime.pool_token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let ids: Vec<ItemId> = runtime.item_tokens.lock().keys().copied().collect();
        for id in ids {
            if let Err(e) = runtime.store.update_heartbeat(id) {
                warn!(item = %id, error = %e, "heartbeat update failed");
            }
        }
    }
}

/// Rolls back in-flight items whose heartbeat has gone stale, as a
/// safety net behind the per-process `item_tokens` bookkeeping (spec.md
/// §4.5: "ReclaimStale every heartbeat_interval_secs").
pub(super) async fn run_reclaim_ticker(runtime: Arc<Runtime>) {
    let interval = Duration::from_secs(runtime.config.heartbeat_interval_secs.max(1));
    let timeout_ms = runtime.config.heartbeat_timeout_secs.saturating_mul(1000);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = runtime.pool_token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        match runtime.store.reclaim_stale(timeout_ms) {
            Ok(reclaimed) if !reclaimed.is_empty() => {
                info!(count = reclaimed.len(), "reclaimed stale in-flight items");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "reclaim_stale failed"),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
