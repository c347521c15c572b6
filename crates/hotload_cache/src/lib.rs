//! Unit records and the caches that hold them.
//!
//! [`ArtifactCache`] is the in-memory registry of every application unit
//! the loader knows about, one [`UnitRecord`] per name. The persisted side
//! lives here too: the [`ContentCache`] contract with its on-disk
//! [`DiskContentCache`] (transformed bytes keyed by unit name and source
//! text, stored through the checksum-validated [`ArtifactStore`]), and the
//! [`PrecompiledStore`] layout used in precompiled mode.

#![warn(missing_docs)]

pub mod artifact;
pub mod content;
pub mod error;
pub mod handle;
pub mod manifest;
pub mod precompiled;
pub mod record;
pub mod units;

pub use artifact::{ArtifactStore, StoredArtifact};
pub use content::{content_key, CachedUnit, ContentCache, DiskContentCache};
pub use error::CacheError;
pub use handle::{HostHandle, PackageHandle, PackageMetadata};
pub use manifest::{ContentManifest, ManifestEntry};
pub use precompiled::PrecompiledStore;
pub use record::{UnitKind, UnitRecord};
pub use units::{ArtifactCache, SharedRecord};
