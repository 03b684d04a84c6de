// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters (SPEC_FULL.md §1, "desktop notify via
//! notify-rust"): an item reaching `Completed` or `Failed` with
//! `review_flag` set fires a notification if `[notifications].enabled`.

mod desktop;
mod noop;

pub use desktop::DesktopNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Adapter for sending a notification with a title and message body.
#[async_trait]
pub trait NotifyAdapter: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}
