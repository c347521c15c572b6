//! Resolution of unit names to source files.

use std::path::{Path, PathBuf};

use hotload_common::{name_from_relative_path, outer_unit, package_path};

use crate::search_path::SearchPath;
use crate::source_file::SourceHandle;

/// Maps fully-qualified unit names to source files on a [`SearchPath`].
///
/// A unit `a.b.C` (or nested `a.b.C$D`) is backed by `a/b/C.<extension>`
/// under the first root that has it. A directory `a/b/C` shadows the file:
/// the name denotes a package and resolution stops without consulting later
/// roots.
#[derive(Clone, Debug)]
pub struct SourceLocator {
    search_path: SearchPath,
    extension: String,
}

impl SourceLocator {
    /// Creates a locator for sources with the given extension (without the dot).
    pub fn new(search_path: SearchPath, extension: impl Into<String>) -> Self {
        Self {
            search_path,
            extension: extension.into(),
        }
    }

    /// Returns the search path this locator walks.
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Returns the source file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolves a unit name to its backing source file.
    ///
    /// Returns `None` if no root has the file, or if the first root that has
    /// a matching directory marks the name as a package.
    pub fn resolve(&self, name: &str) -> Option<SourceHandle> {
        let outer = outer_unit(name);
        if outer.is_empty() {
            return None;
        }
        let dir_path = package_path(outer);
        let mut file_path = dir_path.clone();
        file_path.set_extension(&self.extension);

        for root in self.search_path.roots() {
            let dir = root.join(&dir_path);
            if dir.is_dir() && matches_exact_name(&dir) {
                return None;
            }
            let file = root.join(&file_path);
            if file.is_file() && matches_exact_name(&file) {
                return Some(SourceHandle::new(file));
            }
        }
        None
    }

    /// Lists every unit name discoverable on the search path, sorted and deduplicated.
    ///
    /// Hidden directories (names starting with `.`) are skipped.
    pub fn discover(&self) -> Vec<String> {
        let mut names = Vec::new();
        for root in self.search_path.roots() {
            for relative in walk_sources(root, &self.extension) {
                if let Some(name) = name_from_relative_path(&relative, &self.extension) {
                    names.push(name);
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

/// Returns `true` if the last component of `path` matches the on-disk entry exactly.
///
/// Guards against case-insensitive filesystems resolving `user.src` to `User.src`.
fn matches_exact_name(path: &Path) -> bool {
    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return false;
    };
    match std::fs::read_dir(parent) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .any(|entry| entry.file_name() == file_name),
        Err(_) => false,
    }
}

/// Collects the paths, relative to `root`, of every source file with `extension`.
///
/// The result is sorted. Unreadable directories are skipped.
pub(crate) fn walk_sources(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_dir(root, root, extension, &mut files);
    files.sort();
    files
}

fn walk_dir(root: &Path, dir: &Path, extension: &str, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let hidden = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            walk_dir(root, &path, extension, files);
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }
}
