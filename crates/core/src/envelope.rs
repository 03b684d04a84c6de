// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The envelope: the opaque, append-only per-item record of stage artifacts
//! (spec.md §3.2).
//!
//! The engine never interprets a section's `metadata`; it only persists the
//! envelope verbatim and enforces the one invariant spec.md §3.2 calls out:
//! appending is monotonic, a later stage never rewrites an earlier section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Completed,
    Failed,
    Skipped,
}

/// One stage's contribution to an item's envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeSection {
    /// The status this section was produced for (e.g. "ripping").
    pub stage: String,
    pub status: SectionStatus,
    #[serde(default)]
    pub assets: Vec<PathBuf>,
    /// Stage-local metadata. Opaque to the core.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope already has a section for stage {0:?} — sections are append-only")]
    SectionAlreadyPresent(String),
}

/// Append-only sequence of [`EnvelopeSection`]s carried by a work item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    sections: Vec<EnvelopeSection>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[EnvelopeSection] {
        &self.sections
    }

    /// Read the section a given stage previously appended, if any.
    pub fn section_for(&self, stage: &str) -> Option<&EnvelopeSection> {
        self.sections.iter().find(|s| s.stage == stage)
    }

    /// Append a new section. Errors if `stage` already has one, enforcing
    /// the "a later stage never rewrites an earlier section" contract.
    pub fn append_section(&mut self, section: EnvelopeSection) -> Result<(), EnvelopeError> {
        if self.section_for(&section.stage).is_some() {
            return Err(EnvelopeError::SectionAlreadyPresent(section.stage));
        }
        self.sections.push(section);
        Ok(())
    }
}
