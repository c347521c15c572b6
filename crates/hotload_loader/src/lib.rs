//! The module loader: compile, transform, define and hot-reload application units.
//!
//! [`ModuleLoader`] turns unit names into host definitions. It finds sources
//! with a [`SourceLocator`](hotload_source::SourceLocator), keeps one
//! [`UnitRecord`](hotload_cache::UnitRecord) per unit in an
//! [`ArtifactCache`](hotload_cache::ArtifactCache), and drives the external
//! collaborators declared in [`pipeline`] and [`host`]: the compiler, the
//! transformation pipeline, the content cache, the host runtime and its
//! hot-swap port.
//!
//! Change detection ([`ModuleLoader::detect_changes`]) recompiles modified
//! units and either swaps them in place or reports a [`ReloadError`] telling
//! the caller that a full restart is required.
//!
//! The [`reference`] module provides in-process collaborators used by the
//! `hotload` command line tool and by tests.

#![warn(missing_docs)]

pub mod error;
pub mod generation;
pub mod host;
pub mod loader;
pub mod pipeline;
pub mod query;
pub mod reference;
pub mod reload;
pub mod resources;

pub use error::{LoadError, ReloadError};
pub use generation::Generation;
pub use host::{DefineScope, HostError, HostRuntime};
pub use loader::{Collaborators, LoaderOptions, ModuleLoader};
pub use pipeline::{
    CompileFailure, CompilePipeline, HotSwapPort, HotSwapRefused, StaleCache, TransformError,
    TransformPipeline,
};
