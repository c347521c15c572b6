//! Resource lookup: search-path roots first, then the host.

use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::loader::ModuleLoader;

impl ModuleLoader {
    /// Locates a resource, preferring the search path over the host.
    pub fn resource(&self, path: &str) -> Option<PathBuf> {
        self.locator
            .search_path()
            .find_file(relative(path))
            .or_else(|| self.host.resource(path))
    }

    /// Locates every copy of a resource: search-path matches first, then
    /// the host's, without duplicates.
    pub fn resources(&self, path: &str) -> Vec<PathBuf> {
        let mut found = self.locator.search_path().find_all_files(relative(path));
        for candidate in self.host.resources(path) {
            if !found.contains(&candidate) {
                found.push(candidate);
            }
        }
        found
    }

    /// Reads a resource, preferring the search path over the host.
    pub fn open_resource(&self, path: &str) -> Result<Option<Vec<u8>>, LoadError> {
        match self.locator.search_path().find_file(relative(path)) {
            Some(file) => std::fs::read(&file)
                .map(Some)
                .map_err(|source| LoadError::Resource { path: file, source }),
            None => Ok(self.host.open_resource(path)),
        }
    }
}

fn relative(path: &str) -> &Path {
    Path::new(path.trim_start_matches('/'))
}
