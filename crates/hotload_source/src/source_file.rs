//! Handles to source files discovered on the search path.

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Last-modified time of a source, in nanoseconds since the Unix epoch.
///
/// `0` means "never" (unset on a record, or the file no longer exists).
pub type Timestamp = u64;

/// A reference to a concrete source file found by the [`SourceLocator`](crate::SourceLocator).
///
/// Handles compare equal when they point at the same path, which is how
/// several nested units defined by one file are recognized as siblings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    path: PathBuf,
}

impl SourceHandle {
    /// Creates a handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the filesystem path of this source.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the file still exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Returns the last-modified time of the file, or `0` if it cannot be read.
    pub fn modified(&self) -> Timestamp {
        std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_nanos() as Timestamp)
            .unwrap_or(0)
    }

    /// Reads the full text of the source file.
    pub fn read_to_string(&self) -> Result<String, io::Error> {
        std::fs::read_to_string(&self.path)
    }
}
