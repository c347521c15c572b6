//! Configuration types deserialized from `hotload.toml`.

use serde::Deserialize;

/// The top-level project configuration parsed from `hotload.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Source, cache and precompiled locations.
    pub paths: PathsConfig,
    /// Loading mode switches.
    #[serde(default)]
    pub mode: ModeConfig,
}

/// Core project metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Filesystem locations, relative to the project directory unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Source roots in priority order.
    pub search: Vec<String>,
    /// Extension of source files, without the dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Directory of the persisted content cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Root of the precompiled artifact layout.
    #[serde(default = "default_precompiled_dir")]
    pub precompiled_dir: String,
    /// Extension of precompiled artifact files, without the dot.
    #[serde(default = "default_precompiled_extension")]
    pub precompiled_extension: String,
}

/// Loading mode switches. Both can be overridden from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeConfig {
    /// Read precompiled artifacts instead of compiling sources.
    #[serde(default)]
    pub use_precompiled: bool,
    /// Also write every transformed unit to the precompiled layout.
    #[serde(default)]
    pub precompile: bool,
}

fn default_source_extension() -> String {
    "src".to_string()
}

fn default_cache_dir() -> String {
    ".hotload-cache".to_string()
}

fn default_precompiled_dir() -> String {
    "precompiled/units".to_string()
}

fn default_precompiled_extension() -> String {
    "unit".to_string()
}
