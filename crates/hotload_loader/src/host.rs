//! The host runtime contract.
//!
//! The host is the process-level module system that actually executes
//! units. The loader defines application units into it and falls back to
//! its own ("parent") resolution for everything else.

use std::path::PathBuf;

use hotload_cache::{HostHandle, PackageHandle, PackageMetadata};

/// The protection scope a unit is defined under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefineScope {
    /// Compiled from source by this loader.
    Application,
    /// Read from the precompiled layout.
    Precompiled,
}

/// The host refused a definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    /// Why the definition was refused.
    pub message: String,
}

impl HostError {
    /// Creates a host error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The module system of the running process.
///
/// Definitions are serialized by the loader; implementations only need to
/// be safe to share between threads.
pub trait HostRuntime: Send + Sync {
    /// Returns the unit already defined under `name` by this loader, if any.
    fn find_loaded(&self, name: &str) -> Option<HostHandle>;

    /// Defines a unit from its transformed bytes.
    fn define(&self, name: &str, bytes: &[u8], scope: DefineScope)
        -> Result<HostHandle, HostError>;

    /// Defines a package, or returns the existing definition.
    fn define_package(
        &self,
        name: &str,
        metadata: &PackageMetadata,
    ) -> Result<PackageHandle, HostError>;

    /// Resolves a name that is not an application unit.
    fn parent_resolve(&self, name: &str) -> Option<HostHandle>;

    /// Locates a resource known to the host itself.
    fn resource(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    /// Locates every copy of a resource known to the host itself.
    fn resources(&self, _path: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Reads a resource known to the host itself.
    fn open_resource(&self, _path: &str) -> Option<Vec<u8>> {
        None
    }
}
