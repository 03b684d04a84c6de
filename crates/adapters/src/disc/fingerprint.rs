// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use spindle_engine::{DiscInfo, FingerprintProvider, MonitorError};

/// A stable fingerprint derived from the disc's volume label and media
/// type. Not collision-proof against two discs sharing a label (out of
/// scope per SPEC_FULL.md §8's "disc metadata heuristics ... NOT
/// specified beyond the capability contract") — good enough to recognize
/// the same disc re-inserted.
pub struct MakemkvFingerprintProvider;

impl MakemkvFingerprintProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MakemkvFingerprintProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FingerprintProvider for MakemkvFingerprintProvider {
    async fn fingerprint(&self, disc: &DiscInfo) -> Result<String, MonitorError> {
        let mut hasher = Sha256::new();
        hasher.update(disc.label.as_bytes());
        hasher.update(b"\0");
        hasher.update(disc.media_type.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
