//! Errors raised by the module loader.

use std::path::PathBuf;

use hotload_cache::CacheError;

use crate::host::HostError;
use crate::pipeline::{HotSwapRefused, TransformError};

/// A failure while resolving or defining a single unit.
///
/// A missing source or a compile failure is not an error: both make the
/// resolution return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A transformation rejected the unit.
    #[error("transformation of '{unit}' failed: {source}")]
    Transform {
        /// The unit being transformed.
        unit: String,
        /// The error reported by the transformation pipeline.
        #[source]
        source: TransformError,
    },

    /// The host runtime refused a unit or package definition.
    #[error("host refused to define '{unit}': {source}")]
    Define {
        /// The unit or package being defined.
        unit: String,
        /// The error reported by the host.
        #[source]
        source: HostError,
    },

    /// A precompiled artifact exists but could not be read.
    #[error("failed to read precompiled unit '{unit}': {source}")]
    Precompiled {
        /// The unit being loaded.
        unit: String,
        /// The underlying cache error.
        #[source]
        source: CacheError,
    },

    /// A source located for the unit could not be read.
    #[error("failed to read source of '{unit}': {source}")]
    Source {
        /// The unit whose source failed.
        unit: String,
        /// The underlying cache error.
        #[source]
        source: CacheError,
    },

    /// The search path could not be scanned for units.
    #[error("failed to scan the search path: {source}")]
    Scan {
        /// The underlying cache error.
        #[source]
        source: CacheError,
    },

    /// A resource on the search path could not be read.
    #[error("failed to read resource {}: {source}", path.display())]
    Resource {
        /// The resource file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The outcome of a change-detection cycle that could not finish in place.
///
/// None of these are retried: the caller must stop serving and restart the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// The hot-swap port refused the batch of redefinitions.
    #[error("restart required: {0}")]
    RestartRequired(#[source] HotSwapRefused),

    /// A recompiled unit changed its structural signature.
    #[error("signature changed in {}", .units.join(", "))]
    SignatureChanged {
        /// Units whose signature checksum changed, in reload order.
        units: Vec<String>,
    },

    /// Files were added to or removed from the search path.
    #[error("search path changed ({} units removed)", .removed.len())]
    PathChanged {
        /// Units whose source disappeared and were dropped from the cache.
        removed: Vec<String>,
    },

    /// Units defined in the host no longer compile.
    ///
    /// The host keeps running their previous definition, so this is
    /// reported on every cycle until the process restarts.
    #[error("defined units no longer compile: {}", .units.join(", "))]
    CompileFailed {
        /// The dropped units, sorted.
        units: Vec<String>,
    },

    /// Recompiling a unit failed fatally.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ReloadError {
    /// Returns `true` if the process must restart to pick up the changes.
    pub fn requires_restart(&self) -> bool {
        match self {
            Self::RestartRequired(_)
            | Self::SignatureChanged { .. }
            | Self::PathChanged { .. }
            | Self::CompileFailed { .. }
            | Self::Load(_) => true,
        }
    }
}
