//! Shared fixture: a project directory and a loader over it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use hotload_cache::{ContentCache, PrecompiledStore};
use hotload_loader::reference::{
    CopyCompiler, MarkerTransform, MemoryContentCache, MemoryHost, MemoryHotSwap,
};
use hotload_loader::{Collaborators, LoaderOptions, ModuleLoader, TransformPipeline};
use hotload_source::{SearchPath, SourceLocator};

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub host: Arc<MemoryHost>,
    pub compiler: Arc<CopyCompiler>,
    pub transform: Arc<MarkerTransform>,
    pub hot_swap: Arc<MemoryHotSwap>,
    pub content: Arc<dyn ContentCache>,
    pub use_precompiled: bool,
    pub precompile: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            host: Arc::new(MemoryHost::new()),
            compiler: Arc::new(CopyCompiler::new()),
            transform: Arc::new(MarkerTransform::new()),
            hot_swap: Arc::new(MemoryHotSwap::accepting()),
            content: Arc::new(MemoryContentCache::new()),
            use_precompiled: false,
            precompile: false,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn precompiled(&self) -> PrecompiledStore {
        PrecompiledStore::new(self.dir.path().join("precompiled"), "unit")
    }

    pub fn loader(&self) -> ModuleLoader {
        self.loader_with(self.transform.clone())
    }

    pub fn loader_with(&self, transformer: Arc<dyn TransformPipeline>) -> ModuleLoader {
        std::fs::create_dir_all(self.root()).unwrap();
        let locator = SourceLocator::new(SearchPath::new([self.root()]), "src");
        let options = LoaderOptions {
            use_precompiled: self.use_precompiled,
            precompile: self.precompile,
            precompiled: self.precompiled(),
        };
        let collaborators = Collaborators {
            host: self.host.clone(),
            compiler: self.compiler.clone(),
            transformer,
            content_cache: self.content.clone(),
            hot_swap: self.hot_swap.clone(),
        };
        ModuleLoader::new(locator, options, collaborators)
    }
}

/// Moves a file's modification time a minute forward.
pub fn touch(path: &Path) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
}

/// Rewrites a file and moves its modification time forward.
pub fn rewrite(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
    touch(path);
}
