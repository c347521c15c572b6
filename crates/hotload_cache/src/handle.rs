//! Back-references into the host runtime.
//!
//! A [`HostHandle`] is what the host hands back after defining a unit. It
//! carries the capability and marker sets the unit reported when it was
//! defined, so cache queries can filter units without reflection.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

struct LoadedUnit {
    name: String,
    capabilities: BTreeSet<String>,
    markers: BTreeSet<String>,
}

/// A cheap-to-clone reference to a unit defined in the host runtime.
///
/// Identity is pointer identity: two handles are [`same_as`](Self::same_as)
/// only if they come from the same definition.
#[derive(Clone)]
pub struct HostHandle(Arc<LoadedUnit>);

impl HostHandle {
    /// Creates a handle for a unit reporting the given capabilities and markers.
    pub fn new(
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = String>,
        markers: impl IntoIterator<Item = String>,
    ) -> Self {
        Self(Arc::new(LoadedUnit {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
            markers: markers.into_iter().collect(),
        }))
    }

    /// Returns the unit name this handle was defined under.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the capabilities (supertypes) the unit reported.
    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.0.capabilities
    }

    /// Returns the markers (annotations) the unit reported.
    pub fn markers(&self) -> &BTreeSet<String> {
        &self.0.markers
    }

    /// Returns `true` if the unit is, or reports, `capability`.
    pub fn is_assignable_to(&self, capability: &str) -> bool {
        self.0.name == capability || self.0.capabilities.contains(capability)
    }

    /// Returns `true` if the unit carries `marker`.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.0.markers.contains(marker)
    }

    /// Returns `true` if both handles refer to the same definition.
    pub fn same_as(&self, other: &HostHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostHandle({})", self.0.name)
    }
}

/// Metadata attached to a package when it is defined.
///
/// Packages defined on behalf of application units get empty metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Specification or implementation title.
    pub title: Option<String>,
    /// Version string.
    pub version: Option<String>,
    /// Vendor name.
    pub vendor: Option<String>,
}

struct PackageInfo {
    name: String,
    metadata: PackageMetadata,
}

/// A reference to a package (enclosing namespace) defined in the host runtime.
#[derive(Clone)]
pub struct PackageHandle(Arc<PackageInfo>);

impl PackageHandle {
    /// Creates a handle for a package.
    pub fn new(name: impl Into<String>, metadata: PackageMetadata) -> Self {
        Self(Arc::new(PackageInfo {
            name: name.into(),
            metadata,
        }))
    }

    /// Returns the package name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the package metadata.
    pub fn metadata(&self) -> &PackageMetadata {
        &self.0.metadata
    }
}

impl fmt::Debug for PackageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageHandle({})", self.0.name)
    }
}
