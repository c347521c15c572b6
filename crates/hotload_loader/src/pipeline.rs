//! Contracts of the compile, transform and hot-swap collaborators.

use hotload_cache::{ArtifactCache, HostHandle, UnitRecord};
use hotload_diagnostics::Diagnostic;

/// A compile that rejected one or more units.
#[derive(Debug, Clone, Default)]
pub struct CompileFailure {
    /// What went wrong, per unit.
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns source units into compiled bytes.
pub trait CompilePipeline: Send + Sync {
    /// Compiles the named units.
    ///
    /// Results are written into the records of `cache` with
    /// [`UnitRecord::set_compiled`]; units left uncompiled count as failed
    /// whether or not an error is returned.
    fn compile(&self, names: &[String], cache: &ArtifactCache) -> Result<(), CompileFailure>;
}

/// A transformation rejected a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransformError {
    /// What the transformation rejected.
    pub message: String,
}

impl TransformError {
    /// Creates a transform error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The plugin-driven rewrite of compiled units into their loadable form.
///
/// Transformations are deterministic and order-sensitive.
pub trait TransformPipeline: Send + Sync {
    /// Rewrites the compiled bytes of `record` and returns the result.
    ///
    /// Must update the record's signature checksum.
    fn enhance(&self, record: &mut UnitRecord) -> Result<Vec<u8>, TransformError>;

    /// Returns cached units that depend on any of `modified`, transitively.
    fn dependents_of(&self, _modified: &[String], _cache: &ArtifactCache) -> Vec<String> {
        Vec::new()
    }

    /// Returns `true` if the pipeline compiles sources itself, in which
    /// case the loader skips its bulk compile.
    fn can_compile_sources(&self) -> bool {
        false
    }

    /// Returns `true` if `compiled` defines a plugin. Plugin units are
    /// defined untransformed.
    fn is_plugin(&self, _compiled: &[u8]) -> bool {
        false
    }

    /// Activates the plugins defined in the first phase of a bulk load.
    fn activate_plugins(&self, _plugins: &[HostHandle]) -> Result<(), TransformError> {
        Ok(())
    }
}

/// The host refused an in-place redefinition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hot swap refused: {reason}")]
pub struct HotSwapRefused {
    /// Why the batch was refused.
    pub reason: String,
}

impl HotSwapRefused {
    /// Creates a refusal with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// In-place redefinition of units that are already defined in the host.
pub trait HotSwapPort: Send + Sync {
    /// Redefines every unit of the batch, or none of them.
    fn redefine(&self, batch: &[(HostHandle, Vec<u8>)]) -> Result<(), HotSwapRefused>;
}

/// A cache holding results derived from unit definitions.
///
/// Cleared after every successful hot swap.
pub trait StaleCache: Send + Sync {
    /// Drops every derived entry.
    fn clear(&self);
}
