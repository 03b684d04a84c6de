// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC request/response types (spec.md §6.4, SPEC_FULL.md §11). Wire format
//! lives in `protocol_wire`; this module only owns the message shapes.

use serde::{Deserialize, Serialize};
use spindle_core::id::ItemId;
use spindle_core::status::Status;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping, also used by the CLI to detect a live socket.
    Ping,
    /// `Status()` (spec.md §6.4).
    Status,
    /// `Stop(item_ids...)`.
    StopItems { ids: Vec<ItemId> },
    /// `Retry(item_ids...)`.
    Retry { ids: Vec<ItemId> },
    /// `ClearCompleted()`.
    ClearCompleted,
    /// `ClearFailed()`.
    ClearFailed,
    /// `ResetStuck()`.
    ResetStuck,
    /// Manually enqueue the disc currently in the drive, bypassing the
    /// monitor's poll cadence.
    AddDisc,
    /// Manually enqueue a file already present on disk.
    AddFile { path: PathBuf },
    /// Graceful daemon shutdown.
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerEntry {
    pub state: String,
    pub current_item: Option<ItemId>,
    pub stage: Option<Status>,
    pub since_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    pub running: bool,
    pub workers: Vec<WorkerEntry>,
    pub in_flight_count: usize,
    pub ready_counts_by_status: HashMap<Status, usize>,
    pub failed_count: usize,
    pub completed_count: usize,
    pub dependencies: Vec<(String, bool)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Status {
        status: StatusPayload,
    },
    /// Item(s) acted upon (stop/retry) — ids found and mutated.
    Acted {
        ids: Vec<ItemId>,
    },
    Cleared {
        count: usize,
    },
    Added {
        id: ItemId,
    },
    ShuttingDown,
    Error {
        message: String,
    },
}
