//! The persisted content cache: transformed bytes keyed by source content.

use std::path::{Path, PathBuf};

use hotload_common::ContentHash;
use parking_lot::Mutex;

use crate::artifact::ArtifactStore;
use crate::error::CacheError;
use crate::manifest::{ContentManifest, ManifestEntry};

/// Subdirectory name for cached unit artifacts.
const UNITS_SUBDIR: &str = "units";

/// File extension for cached unit artifacts.
const UNIT_EXT: &str = "bc";

/// A unit restored from the content cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedUnit {
    /// Transformed bytes, ready to define.
    pub bytes: Vec<u8>,
    /// Signature checksum computed when the bytes were transformed.
    pub signature_checksum: u64,
}

/// Transformed bytes keyed by a hash over `(unit name, source text)`.
///
/// A hit lets the loader skip compile and transform entirely. Entries
/// survive process restarts.
pub trait ContentCache: Send + Sync {
    /// Looks up the transformed form of `name` compiled from `source_text`.
    fn get(&self, name: &str, source_text: &str) -> Option<CachedUnit>;

    /// Stores the transformed form of `name` compiled from `source_text`.
    fn put(
        &self,
        bytes: &[u8],
        signature_checksum: u64,
        name: &str,
        source_text: &str,
    ) -> Result<(), CacheError>;

    /// Persists any buffered bookkeeping.
    fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Computes the content-cache key for a unit and its source text.
pub fn content_key(name: &str, source_text: &str) -> ContentHash {
    ContentHash::from_parts(&[name.as_bytes(), source_text.as_bytes()])
}

/// A [`ContentCache`] stored under a directory on disk.
///
/// Artifacts go through the checksum-validated [`ArtifactStore`]; a
/// `manifest.json` maps each unit to its latest artifact so that
/// [`gc`](Self::gc) can delete artifacts for superseded sources. All reads
/// are fail-safe.
pub struct DiskContentCache {
    cache_dir: PathBuf,
    store: ArtifactStore,
    manifest: Mutex<ContentManifest>,
}

impl DiskContentCache {
    /// Opens the cache in `cache_dir`, starting fresh if no valid manifest exists.
    pub fn open(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            store: ArtifactStore::new(cache_dir),
            manifest: Mutex::new(ContentManifest::load(cache_dir).unwrap_or_default()),
        }
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the number of units recorded in the manifest.
    pub fn len(&self) -> usize {
        self.manifest.lock().units.len()
    }

    /// Returns `true` if the manifest records no units.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persists the manifest.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.lock().save(&self.cache_dir)
    }

    /// Deletes artifacts no manifest entry references. Returns the number removed.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let live_keys = self.manifest.lock().live_keys();
        self.store.gc(UNITS_SUBDIR, UNIT_EXT, &live_keys)
    }

    /// Removes every artifact and empties the manifest.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.clear(UNITS_SUBDIR)?;
        let mut manifest = self.manifest.lock();
        manifest.units.clear();
        manifest.save(&self.cache_dir)
    }
}

impl ContentCache for DiskContentCache {
    fn get(&self, name: &str, source_text: &str) -> Option<CachedUnit> {
        let key = content_key(name, source_text).to_string();
        let artifact = self.store.read_artifact(UNITS_SUBDIR, &key, UNIT_EXT)?;
        if artifact.unit != name {
            return None;
        }
        Some(CachedUnit {
            bytes: artifact.payload,
            signature_checksum: artifact.signature_checksum,
        })
    }

    fn put(
        &self,
        bytes: &[u8],
        signature_checksum: u64,
        name: &str,
        source_text: &str,
    ) -> Result<(), CacheError> {
        let key = self.store.write_artifact(
            UNITS_SUBDIR,
            UNIT_EXT,
            &content_key(name, source_text),
            name,
            bytes,
            signature_checksum,
        )?;
        self.manifest.lock().units.insert(
            name.to_string(),
            ManifestEntry {
                key,
                signature_checksum,
            },
        );
        Ok(())
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.save()
    }
}
