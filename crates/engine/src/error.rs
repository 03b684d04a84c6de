// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use spindle_core::error::ErrorKind;
use spindle_storage::StoreError;
use std::error::Error as StdError;
use thiserror::Error;

/// A stage's own error type plus whatever classification hook it exposes.
/// This is what `Execute`/`Prepare` return; the engine never inspects its
/// internals beyond `kind()` and `Display`.
pub type StageFailure = Box<dyn spindle_core::error::StageError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("queue store error: {0}")]
    Store(#[from] StoreError),
    #[error("required dependency missing: {0}")]
    DependencyMissing(String),
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// The outcome of running the failure classifier on a stage error
/// (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct Classification {
    pub needs_review: bool,
    pub review_reason: Option<String>,
    pub error_message: String,
}

impl Classification {
    pub fn from_kind(kind: Option<ErrorKind>, error_message: String) -> Self {
        match kind {
            Some(k) => Classification {
                needs_review: true,
                review_reason: Some(k.as_str().to_string()),
                error_message,
            },
            None => Classification {
                needs_review: false,
                review_reason: None,
                error_message,
            },
        }
    }
}
