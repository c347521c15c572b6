//! Dotted unit names and their mapping onto the filesystem.
//!
//! A unit name is a dot-separated path such as `app.models.User`. Nested
//! units append the [`NESTING_SEPARATOR`] and live in the same source file
//! as their outer unit (`app.models.User$Address` is defined by
//! `app/models/User.<ext>`). The package of a unit is everything before the
//! last dot of its outer unit.

use std::path::{Component, Path, PathBuf};

/// Separator between an outer unit and a nested unit defined in the same file.
pub const NESTING_SEPARATOR: char = '$';

/// Strips any nested-unit suffix, returning the name of the unit that owns the source file.
///
/// The suffix starts at the first occurrence of [`NESTING_SEPARATOR`].
pub fn outer_unit(name: &str) -> &str {
    match name.find(NESTING_SEPARATOR) {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Returns the package that owns `name`, or `None` for units in the root package.
///
/// The name is first truncated at the nesting separator, then at the last dot.
pub fn owning_package(name: &str) -> Option<&str> {
    let outer = outer_unit(name);
    outer.rfind('.').map(|idx| &outer[..idx])
}

/// Converts a unit name into the relative source path `a/b/C.<extension>`.
pub fn relative_path(name: &str, extension: &str) -> PathBuf {
    let mut path = package_path(outer_unit(name));
    path.set_extension(extension);
    path
}

/// Converts a dotted name into the relative directory path `a/b/C` (no extension).
pub fn package_path(name: &str) -> PathBuf {
    name.split('.').collect()
}

/// Maps a relative source path back to its unit name.
///
/// Returns `None` if the extension does not match or any component is not
/// valid UTF-8.
pub fn name_from_relative_path(relative: &Path, extension: &str) -> Option<String> {
    if relative.extension()?.to_str()? != extension {
        return None;
    }
    let stem = relative.with_extension("");
    let mut segments = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_unit_strips_nested_suffix() {
        assert_eq!(outer_unit("app.models.User$Address"), "app.models.User");
        assert_eq!(outer_unit("app.models.User$A$B"), "app.models.User");
        assert_eq!(outer_unit("app.models.User"), "app.models.User");
    }

    #[test]
    fn owning_package_of_nested_unit() {
        assert_eq!(owning_package("app.models.User"), Some("app.models"));
        assert_eq!(owning_package("app.models.User$Address"), Some("app.models"));
        assert_eq!(owning_package("Main"), None);
        assert_eq!(owning_package("Main$Inner"), None);
    }

    #[test]
    fn relative_path_uses_outer_unit() {
        assert_eq!(
            relative_path("app.models.User$Address", "src"),
            PathBuf::from("app/models/User.src")
        );
        assert_eq!(relative_path("Main", "src"), PathBuf::from("Main.src"));
    }

    #[test]
    fn package_path_has_no_extension() {
        assert_eq!(package_path("app.models"), PathBuf::from("app/models"));
    }

    #[test]
    fn name_from_path() {
        assert_eq!(
            name_from_relative_path(Path::new("app/models/User.src"), "src").as_deref(),
            Some("app.models.User")
        );
        assert!(name_from_relative_path(Path::new("app/models/User.txt"), "src").is_none());
        assert!(name_from_relative_path(Path::new("../User.src"), "src").is_none());
    }
}
