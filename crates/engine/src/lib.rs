// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-engine: the workflow manager that drives work items through the
//! pipeline (spec.md §4).
//!
//! This crate owns no I/O of its own — it claims work from `spindle-storage`
//! and hands each item to whatever `StageHandler` `spindle-adapters`
//! registered for that status. What it does own: the disc arbiter (`arbiter`),
//! the disc monitor (`monitor`), the stage registry (`registry`), the
//! failure classifier (`classifier`), and the worker pool that ties them
//! together (`runtime`).

pub mod arbiter;
pub mod classifier;
pub mod error;
pub mod item_logger;
pub mod monitor;
pub mod registry;
pub mod runtime;

pub use arbiter::{ArbiterGuard, Cancelled, DiscArbiter, OwnerId, OwnerIdGen};
pub use classifier::FailureClassifier;
pub use error::{Classification, EngineError, StageFailure};
pub use item_logger::ItemLogger;
pub use monitor::{DiscInfo, DiscMonitor, DiscProbe, FingerprintProvider, MonitorError};
pub use registry::{HealthStatus, StageContext, StageHandler, StageRegistry};
pub use runtime::{DependencyProbe, EngineStatus, Runtime, WorkerPhase, WorkerStatus};
