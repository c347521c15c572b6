//! Shared helpers for CLI commands.
//!
//! Contains project root resolution, settings loading, loader construction
//! over the in-process collaborators, and diagnostic rendering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotload_cache::{DiskContentCache, PrecompiledStore};
use hotload_config::{load_config, resolve_settings, ResolvedSettings, CONFIG_FILE};
use hotload_diagnostics::TerminalRenderer;
use hotload_loader::reference::{CopyCompiler, MarkerTransform, MemoryHost, MemoryHotSwap};
use hotload_loader::{Collaborators, LoaderOptions, ModuleLoader};
use hotload_source::{SearchPath, SourceLocator};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `hotload.toml`.
///
/// Returns the directory containing `hotload.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `hotload.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Loads `hotload.toml` and resolves it against the project root and the environment.
pub fn load_settings(global: &GlobalArgs) -> Result<ResolvedSettings, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = load_config(&project_dir)?;
    Ok(resolve_settings(&config, &project_dir, |key| {
        std::env::var(key).ok()
    }))
}

/// Builds a module loader over the project's search path.
///
/// Units are compiled and defined in process; transformed units persist in
/// the project's content cache.
pub fn build_loader(settings: &ResolvedSettings) -> ModuleLoader {
    let locator = SourceLocator::new(
        SearchPath::new(settings.search_path.iter().cloned()),
        settings.source_extension.clone(),
    );
    let options = LoaderOptions {
        use_precompiled: settings.use_precompiled,
        precompile: settings.precompile,
        precompiled: PrecompiledStore::new(
            settings.precompiled_dir.clone(),
            settings.precompiled_extension.clone(),
        ),
    };
    let collaborators = Collaborators {
        host: Arc::new(MemoryHost::new().with_resource_root(settings.project_dir.clone())),
        compiler: Arc::new(CopyCompiler::new()),
        transformer: Arc::new(MarkerTransform::new()),
        content_cache: Arc::new(DiskContentCache::open(&settings.cache_dir)),
        hot_swap: Arc::new(MemoryHotSwap::accepting()),
    };
    ModuleLoader::new(locator, options, collaborators)
}

/// Renders and clears the loader's compile diagnostics. Returns how many were errors.
pub fn report_diagnostics(loader: &ModuleLoader, global: &GlobalArgs) -> usize {
    let errors = loader.diagnostics().error_count();
    let renderer = TerminalRenderer::new(global.color);
    for diagnostic in loader.diagnostics().take_all() {
        eprint!("{}", renderer.render(&diagnostic));
    }
    errors
}
