//! Structural fingerprint of the search path.

use xxhash_rust::xxh3::Xxh3;

use crate::locator::walk_sources;
use crate::search_path::SearchPath;

/// A hash over the set of source files present on a [`SearchPath`].
///
/// Only the shape is hashed (which files exist under which root), not their
/// contents or timestamps. Adding, removing or renaming a source file
/// changes the fingerprint; editing one does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathFingerprint(u64);

impl PathFingerprint {
    /// Computes the fingerprint of every `*.<extension>` file on the search path.
    pub fn compute(search_path: &SearchPath, extension: &str) -> Self {
        let mut hasher = Xxh3::new();
        for (index, root) in search_path.roots().iter().enumerate() {
            hasher.update(&(index as u64).to_le_bytes());
            for relative in walk_sources(root, extension) {
                hasher.update(relative.to_string_lossy().as_bytes());
                hasher.update(&[0]);
            }
        }
        Self(hasher.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(dir: &std::path::Path) -> PathFingerprint {
        PathFingerprint::compute(&SearchPath::new([dir.to_path_buf()]), "src")
    }

    #[test]
    fn stable_when_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.src"), "a").unwrap();
        assert_eq!(fingerprint(dir.path()), fingerprint(dir.path()));
    }

    #[test]
    fn content_edits_do_not_change_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.src");
        std::fs::write(&file, "a").unwrap();
        let before = fingerprint(dir.path());
        std::fs::write(&file, "completely different").unwrap();
        assert_eq!(before, fingerprint(dir.path()));
    }

    #[test]
    fn added_and_removed_files_change_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.src"), "a").unwrap();
        let before = fingerprint(dir.path());

        std::fs::write(dir.path().join("B.src"), "b").unwrap();
        let added = fingerprint(dir.path());
        assert_ne!(before, added);

        std::fs::remove_file(dir.path().join("B.src")).unwrap();
        assert_eq!(before, fingerprint(dir.path()));
    }

    #[test]
    fn other_extensions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.src"), "a").unwrap();
        let before = fingerprint(dir.path());
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();
        assert_eq!(before, fingerprint(dir.path()));
    }
}
