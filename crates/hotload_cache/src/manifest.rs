//! Manifest of the units held by the persisted content cache.
//!
//! Artifacts are addressed by a hash of `(unit name, source text)`, so a
//! lookup never needs the manifest. It records which artifact each unit
//! currently points at, which is what garbage collection keeps alive.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest format version.
const MANIFEST_VERSION: u32 = 1;

/// Unit name to artifact mapping, stored as `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentManifest {
    /// Manifest format version. A mismatch discards the manifest.
    pub format_version: u32,

    /// Latest artifact per unit name.
    pub units: BTreeMap<String, ManifestEntry>,
}

/// The artifact a unit currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Artifact key (hex content hash).
    pub key: String,

    /// Signature checksum of the stored unit.
    pub signature_checksum: u64,
}

impl ContentManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self {
            format_version: MANIFEST_VERSION,
            units: BTreeMap::new(),
        }
    }

    /// Loads the manifest, returning `None` if it is missing, unparsable or
    /// from another format version.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(cache_dir.join(MANIFEST_FILE)).ok()?;
        let manifest: Self = serde_json::from_str(&content).ok()?;
        (manifest.format_version == MANIFEST_VERSION).then_some(manifest)
    }

    /// Saves the manifest, creating the cache directory if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::io(cache_dir, e))?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::io(path, e))
    }

    /// Parses a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::ManifestParse {
            reason: e.to_string(),
        })
    }

    /// Returns the set of artifact keys referenced by any unit.
    pub fn live_keys(&self) -> HashSet<String> {
        self.units.values().map(|entry| entry.key.clone()).collect()
    }
}

impl Default for ContentManifest {
    fn default() -> Self {
        Self::new()
    }
}
