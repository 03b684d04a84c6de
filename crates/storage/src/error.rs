// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::snapshot::SnapshotError;
use crate::wal::WalError;
use spindle_core::id::ItemId;
use spindle_core::status::Status;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("disc fingerprint {0:?} is already queued")]
    DuplicateFingerprint(String),
    #[error("item {id} is in status {status:?}, which is not a valid claim target")]
    NotClaimable { id: ItemId, status: Status },
    #[error("item {id} is in status {status:?}, which is not in-flight")]
    NotInFlight { id: ItemId, status: Status },
    #[error("item {id} is in status {status:?}, which is not failed")]
    NotFailed { id: ItemId, status: Status },
    #[error("transient store error budget exhausted after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: WalError,
    },
}
