//! The fixed on-disk layout of precompiled units.
//!
//! A unit `a.b.C` lives at `<root>/a/b/C.<extension>`; nested units keep
//! their separator in the file name (`a/b/C$D.<extension>`). The layout is
//! read in precompiled mode and written when precompile emission is on.

use std::path::{Path, PathBuf};

use hotload_common::package_path;
use hotload_source::{SearchPath, SourceLocator};

use crate::error::CacheError;

/// Reader and writer for the precompiled artifact layout.
#[derive(Clone, Debug)]
pub struct PrecompiledStore {
    root: PathBuf,
    extension: String,
}

impl PrecompiledStore {
    /// Creates a store rooted at `root` using `extension` for artifact files.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Returns the layout root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the artifact file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the artifact path for `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut relative = package_path(name);
        let file_name = format!(
            "{}.{}",
            relative.file_name().and_then(|n| n.to_str()).unwrap_or(name),
            self.extension
        );
        relative.set_file_name(file_name);
        self.root.join(relative)
    }

    /// Reads the precompiled artifact for `name`, or `None` if there is none.
    pub fn read(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read(&path)
            .map(Some)
            .map_err(|e| CacheError::io(path, e))
    }

    /// Writes the artifact for `name`, creating parent directories.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        std::fs::write(&path, bytes).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Lists every unit name present in the layout, sorted.
    pub fn discover(&self) -> Vec<String> {
        SourceLocator::new(SearchPath::new([self.root.clone()]), self.extension.clone()).discover()
    }
}
