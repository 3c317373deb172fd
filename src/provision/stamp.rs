//! Provisioning stamp (`.provisioned.json`)
//!
//! Written last, after the tree is extracted and hashed. Its presence means
//! the bootstrap completed; its digests let later runs detect drift.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::STAMP_FILE;
use crate::error::{self, Result};
use crate::hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionStamp {
    pub url: String,
    /// Digest of the downloaded archive
    pub archive_digest: String,
    /// Digest of the extracted tree, stamp excluded
    pub tree_digest: String,
    /// Unix seconds
    pub provisioned_at: u64,
    /// Runner version that wrote the stamp
    pub version: String,
}

impl ProvisionStamp {
    pub fn new(url: impl Into<String>, archive_digest: String, tree_digest: String) -> Self {
        let provisioned_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            url: url.into(),
            archive_digest,
            tree_digest,
            provisioned_at,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Read the stamp in `dir`, `None` if there is none
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(STAMP_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| error::fs::read_failed(path.display().to_string(), e.to_string()))?;
        let stamp = serde_json::from_str(&content).map_err(|e| {
            error::asset::stamp_mismatch(format!("unreadable stamp {}: {e}", path.display()))
        })?;
        Ok(Some(stamp))
    }

    /// Write the stamp into `dir` via a temporary file and rename
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(STAMP_FILE);
        let tmp = dir.join(format!("{STAMP_FILE}.tmp"));
        let content = serde_json::to_string_pretty(self)?;

        std::fs::write(&tmp, content + "\n")
            .map_err(|e| error::fs::write_failed(tmp.display().to_string(), e.to_string()))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| error::fs::write_failed(path.display().to_string(), e.to_string()))?;
        Ok(())
    }

    /// Whether this stamp was produced from the given pin
    ///
    /// An unpinned configuration matches on URL alone.
    pub fn matches_pin(&self, url: &str, digest: Option<&str>) -> bool {
        if self.url != url {
            return false;
        }
        match digest.and_then(hash::parse_digest) {
            Some(expected) => hash::verify_hash(&expected, &self.archive_digest),
            None => true,
        }
    }
}
