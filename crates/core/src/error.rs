// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The classification hook a stage error exposes to the failure classifier
//! (spec.md §4.6, §7).

use std::error::Error as StdError;
use std::fmt;

/// The three classification hooks a stage error may expose. Any error
/// without one of these is treated as a plain retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Configuration,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Object-safe error trait every stage handler's error type implements
/// (directly, or via a blanket `thiserror` derive), so the failure
/// classifier can inspect it without knowing the concrete handler crate.
///
/// Errors with no opinion simply don't override `kind()`, leaving it `None`
/// — the classifier treats that as a plain retryable failure.
pub trait StageError: StdError + Send + Sync + 'static {
    fn kind(&self) -> Option<ErrorKind> {
        None
    }
}
