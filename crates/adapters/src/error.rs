// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stage error every handler in this crate returns (boxed as
//! `spindle_engine`'s `StageFailure`).

use spindle_core::error::{ErrorKind, StageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A subprocess could not be spawned, exited non-zero, or ran past its
    /// timeout. Transient by default — the drive may just need another try.
    #[error("{0}")]
    Subprocess(String),

    /// The external binary itself is missing or unusable (`ErrorKind::Configuration`:
    /// an operator needs to fix the install, not wait for a retry).
    #[error("{binary} is not available: {detail}")]
    BinaryUnavailable { binary: String, detail: String },

    /// The disc/file didn't contain what this stage expected (bad output
    /// format, no titles found, unreadable structure).
    #[error("{0}")]
    UnexpectedOutput(String),

    #[error("item has no {0}, which this stage requires")]
    MissingField(&'static str),
}

impl StageError for AdapterError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            AdapterError::Subprocess(_) => None,
            AdapterError::BinaryUnavailable { .. } => Some(ErrorKind::Configuration),
            AdapterError::UnexpectedOutput(_) => Some(ErrorKind::Validation),
            AdapterError::MissingField(_) => Some(ErrorKind::Validation),
        }
    }
}
