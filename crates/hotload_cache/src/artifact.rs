//! Content-addressed binary artifact storage.
//!
//! Transformed unit bytes are stored as binary files in a subdirectory of
//! the cache. Each artifact carries a header with magic bytes, a format
//! version, the unit's signature checksum and a payload checksum.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use hotload_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a hotload cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"HTLD";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every cached artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"HTLD"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Name of the unit the payload belongs to.
    pub unit: String,

    /// Structural signature checksum of the transformed unit.
    pub signature_checksum: u64,

    /// Content hash of the payload data (for integrity checks).
    pub checksum: ContentHash,
}

/// A validated artifact read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Name of the unit the payload belongs to.
    pub unit: String,
    /// Structural signature checksum recorded at write time.
    pub signature_checksum: u64,
    /// The artifact payload.
    pub payload: Vec<u8>,
}

/// Content-addressed store for binary artifacts.
///
/// Each artifact is stored at `<cache_dir>/<subdir>/<key>.<ext>` with a
/// validated binary header.
pub struct ArtifactStore {
    /// Root cache directory.
    cache_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a new artifact store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Ensures that the subdirectory for the given artifact type exists.
    pub fn ensure_dirs(&self, subdir: &str) -> Result<(), CacheError> {
        let dir = self.cache_dir.join(subdir);
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(dir, e))
    }

    /// Returns the file path for an artifact with the given key.
    pub fn artifact_path(&self, subdir: &str, key: &str, ext: &str) -> PathBuf {
        self.cache_dir.join(subdir).join(format!("{key}.{ext}"))
    }

    /// Writes an artifact under `key` and returns the key as a string.
    ///
    /// Layout: 4-byte little-endian header length, bincode header, payload.
    pub fn write_artifact(
        &self,
        subdir: &str,
        ext: &str,
        key: &ContentHash,
        unit: &str,
        data: &[u8],
        signature_checksum: u64,
    ) -> Result<String, CacheError> {
        self.ensure_dirs(subdir)?;

        let key = key.to_string();
        let path = self.artifact_path(subdir, &key, ext);

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            unit: unit.to_string(),
            signature_checksum,
            checksum: ContentHash::from_bytes(data),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        std::fs::write(&path, &output).map_err(|e| CacheError::io(path, e))?;

        Ok(key)
    }

    /// Reads an artifact from the store, validating its header.
    ///
    /// Returns `None` if the file doesn't exist, the header is invalid,
    /// the format version doesn't match, or the checksum doesn't verify.
    pub fn read_artifact(&self, subdir: &str, key: &str, ext: &str) -> Option<StoredArtifact> {
        let path = self.artifact_path(subdir, key, ext);
        let raw = std::fs::read(&path).ok()?;

        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;

        if header.magic != ARTIFACT_MAGIC || header.format_version != ARTIFACT_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        Some(StoredArtifact {
            unit: header.unit,
            signature_checksum: header.signature_checksum,
            payload: payload.to_vec(),
        })
    }

    /// Removes artifacts whose key is not in `live_keys`.
    ///
    /// Returns the number of files removed.
    pub fn gc(
        &self,
        subdir: &str,
        ext: &str,
        live_keys: &HashSet<String>,
    ) -> Result<usize, CacheError> {
        let dir = self.cache_dir.join(subdir);
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&dir).map_err(|e| CacheError::io(&dir, e))?;

        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !live_keys.contains(stem) {
                    std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    /// Removes the whole subdirectory.
    pub fn clear(&self, subdir: &str) -> Result<(), CacheError> {
        let dir = self.cache_dir.join(subdir);
        if !dir.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(&dir).map_err(|e| CacheError::io(dir, e))
    }
}
