//! Resolution of a parsed configuration into absolute paths and final mode flags.

use std::path::{Path, PathBuf};

use crate::types::ProjectConfig;

/// Environment switch forcing precompiled mode on or off.
pub const ENV_PRECOMPILED: &str = "HOTLOAD_PRECOMPILED";

/// Environment switch forcing precompile emission on or off.
pub const ENV_PRECOMPILE: &str = "HOTLOAD_PRECOMPILE";

/// A configuration with every path made absolute and environment overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// The project directory all relative paths were resolved against.
    pub project_dir: PathBuf,
    /// Source roots in priority order.
    pub search_path: Vec<PathBuf>,
    /// Extension of source files.
    pub source_extension: String,
    /// Directory of the persisted content cache.
    pub cache_dir: PathBuf,
    /// Root of the precompiled layout.
    pub precompiled_dir: PathBuf,
    /// Extension of precompiled artifact files.
    pub precompiled_extension: String,
    /// Read precompiled artifacts instead of compiling.
    pub use_precompiled: bool,
    /// Write transformed units to the precompiled layout while loading.
    pub precompile: bool,
}

/// Resolves `config` against `project_dir` and the environment.
///
/// `env` looks up an environment variable; pass `|key| std::env::var(key).ok()`
/// in production. A set switch overrides the file's `[mode]` flag: `1`,
/// `true`, `yes` and `on` enable it, anything else disables it.
pub fn resolve_settings(
    config: &ProjectConfig,
    project_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedSettings {
    let absolute = |p: &str| project_dir.join(p);
    let switch = |key: &str, default: bool| match env(key) {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    };

    ResolvedSettings {
        project_dir: project_dir.to_path_buf(),
        search_path: config.paths.search.iter().map(|p| absolute(p)).collect(),
        source_extension: config.paths.source_extension.clone(),
        cache_dir: absolute(&config.paths.cache_dir),
        precompiled_dir: absolute(&config.paths.precompiled_dir),
        precompiled_extension: config.paths.precompiled_extension.clone(),
        use_precompiled: switch(ENV_PRECOMPILED, config.mode.use_precompiled),
        precompile: switch(ENV_PRECOMPILE, config.mode.precompile),
    }
}
