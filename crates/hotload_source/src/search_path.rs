//! The ordered list of source roots.

use std::path::{Path, PathBuf};

/// An ordered list of root directories searched for sources and resources.
///
/// Order is significant: lookups walk the roots front to back and the first
/// match wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Creates a search path from roots in priority order.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Returns the roots in priority order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Finds the first root containing `relative` as a file.
    pub fn find_file(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }

    /// Returns every root's file at `relative`, in root order.
    pub fn find_all_files(&self, relative: &Path) -> Vec<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .filter(|candidate| candidate.is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_root_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("conf.txt"), "a").unwrap();
        std::fs::write(b.path().join("conf.txt"), "b").unwrap();

        let path = SearchPath::new([a.path().to_path_buf(), b.path().to_path_buf()]);
        assert_eq!(
            path.find_file(Path::new("conf.txt")),
            Some(a.path().join("conf.txt"))
        );
        assert_eq!(path.find_all_files(Path::new("conf.txt")).len(), 2);
    }

    #[test]
    fn missing_file() {
        let a = tempfile::tempdir().unwrap();
        let path = SearchPath::new([a.path().to_path_buf()]);
        assert!(path.find_file(Path::new("nope.txt")).is_none());
        assert!(path.find_all_files(Path::new("nope.txt")).is_empty());
    }
}
