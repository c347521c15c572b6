//! The in-memory state of one application unit.

use hotload_source::{SourceHandle, Timestamp};

use crate::error::CacheError;
use crate::handle::{HostHandle, PackageHandle};

/// Whether a record describes a loadable unit or a package marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    /// An ordinary unit backed by a source file.
    Unit,
    /// A package marker: defined before any member unit of the package.
    PackageMarker,
}

/// One source unit: identity, source snapshot, compiled and transformed
/// bytes, and its definition in the host runtime.
///
/// Invariants:
/// - `is_compiled()` implies `compiled_bytes()` is `Some`.
/// - `loaded()` is `Some` only once the unit is compiled and transformed.
/// - `last_compiled_at()` is the source's modification time at the moment
///   the compiled bytes were set; a newer source time means the record is stale.
#[derive(Debug)]
pub struct UnitRecord {
    name: String,
    kind: UnitKind,
    source: Option<SourceHandle>,
    source_text: String,
    compiled: Option<Vec<u8>>,
    transformed: Option<Vec<u8>>,
    loaded: Option<HostHandle>,
    container: Option<PackageHandle>,
    last_compiled_at: Timestamp,
    is_compiled: bool,
    signature_checksum: u64,
}

impl UnitRecord {
    /// Creates a record backed by `source`, reading its current text.
    pub fn from_source(name: impl Into<String>, source: SourceHandle) -> Result<Self, CacheError> {
        let source_text = source
            .read_to_string()
            .map_err(|e| CacheError::io(source.path(), e))?;
        Ok(Self {
            source: Some(source),
            source_text,
            ..Self::empty(name.into(), UnitKind::Unit)
        })
    }

    /// Creates a record with no discoverable source (e.g. a precompiled-only unit).
    pub fn detached(name: impl Into<String>) -> Self {
        Self::empty(name.into(), UnitKind::Unit)
    }

    /// Creates the marker record for a package that has been defined in the host.
    pub fn package_marker(name: impl Into<String>, container: PackageHandle) -> Self {
        Self {
            container: Some(container),
            ..Self::empty(name.into(), UnitKind::PackageMarker)
        }
    }

    fn empty(name: String, kind: UnitKind) -> Self {
        Self {
            name,
            kind,
            source: None,
            source_text: String::new(),
            compiled: None,
            transformed: None,
            loaded: None,
            container: None,
            last_compiled_at: 0,
            is_compiled: false,
            signature_checksum: 0,
        }
    }

    /// Returns the fully-qualified unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this is an ordinary unit or a package marker.
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Returns `true` for ordinary (non package-marker) units.
    pub fn is_unit(&self) -> bool {
        self.kind == UnitKind::Unit
    }

    /// Returns the backing source file, if any.
    pub fn source(&self) -> Option<&SourceHandle> {
        self.source.as_ref()
    }

    /// Returns the source text snapshot taken at creation or the last refresh.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Returns the compiled bytes, if compiled.
    pub fn compiled_bytes(&self) -> Option<&[u8]> {
        self.compiled.as_deref()
    }

    /// Returns the transformed bytes, if transformed.
    pub fn transformed_bytes(&self) -> Option<&[u8]> {
        self.transformed.as_deref()
    }

    /// Returns the host definition, if the unit has been defined.
    pub fn loaded(&self) -> Option<&HostHandle> {
        self.loaded.as_ref()
    }

    /// Returns the enclosing package handle (package markers only).
    pub fn container(&self) -> Option<&PackageHandle> {
        self.container.as_ref()
    }

    /// Returns the source modification time recorded at the last successful compile.
    pub fn last_compiled_at(&self) -> Timestamp {
        self.last_compiled_at
    }

    /// Returns `true` once compiled bytes have been set by a compile.
    pub fn is_compiled(&self) -> bool {
        self.is_compiled
    }

    /// Returns the structural signature checksum (`0` when unset).
    pub fn signature_checksum(&self) -> u64 {
        self.signature_checksum
    }

    /// Sets the structural signature checksum. Called by transformations.
    pub fn set_signature_checksum(&mut self, checksum: u64) {
        self.signature_checksum = checksum;
    }

    /// Returns `true` if the backing source has been modified since the last compile.
    ///
    /// Records without a source are never stale; a deleted source reports
    /// time `0` and is not stale either (its removal is a path change).
    pub fn is_stale(&self) -> bool {
        match &self.source {
            Some(source) => self.last_compiled_at < source.modified(),
            None => false,
        }
    }

    /// Stores the result of a successful compile.
    pub fn set_compiled(&mut self, bytes: Vec<u8>) {
        self.last_compiled_at = self.source.as_ref().map_or(0, SourceHandle::modified);
        self.compiled = Some(bytes);
        self.transformed = None;
        self.is_compiled = true;
    }

    /// Stores the transformed bytes that will be defined in the host.
    pub fn set_transformed(&mut self, bytes: Vec<u8>) {
        self.transformed = Some(bytes);
    }

    /// Restores a unit from the content cache, skipping compile and transform.
    ///
    /// The cached bytes stand in for both the compiled and the transformed
    /// form, and the record counts as compiled at the current source time.
    pub fn restore(&mut self, bytes: Vec<u8>, signature_checksum: u64) {
        self.set_compiled(bytes.clone());
        self.transformed = Some(bytes);
        self.signature_checksum = signature_checksum;
    }

    /// Records the host definition of this unit.
    pub fn set_loaded(&mut self, handle: HostHandle) {
        debug_assert!(self.is_compiled && self.transformed.is_some());
        self.loaded = Some(handle);
    }

    /// Records the host definition of a precompiled unit, which has no compile step.
    pub fn set_loaded_precompiled(&mut self, bytes: Vec<u8>, handle: HostHandle) {
        self.compiled = Some(bytes.clone());
        self.transformed = Some(bytes);
        self.is_compiled = true;
        self.loaded = Some(handle);
    }

    /// Clears compiled and transformed state and re-reads the source text.
    ///
    /// The source is read first; if that fails the record is left untouched.
    /// The host definition is kept so that a later hot swap can redefine it
    /// in place.
    pub fn refresh(&mut self) -> Result<(), CacheError> {
        if let Some(source) = &self.source {
            self.source_text = source
                .read_to_string()
                .map_err(|e| CacheError::io(source.path(), e))?;
        }
        self.compiled = None;
        self.transformed = None;
        self.is_compiled = false;
        self.last_compiled_at = 0;
        Ok(())
    }
}
