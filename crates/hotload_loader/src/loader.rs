//! The load path: from a unit name to a host definition.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hotload_cache::{
    ArtifactCache, ContentCache, HostHandle, PackageMetadata, PrecompiledStore, SharedRecord,
    UnitRecord,
};
use hotload_common::owning_package;
use hotload_diagnostics::DiagnosticSink;
use hotload_source::{PathFingerprint, SourceLocator};
use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::generation::{Generation, GenerationCounter};
use crate::host::{DefineScope, HostRuntime};
use crate::pipeline::{CompilePipeline, HotSwapPort, StaleCache, TransformPipeline};

/// Mode switches of a loader.
#[derive(Clone, Debug)]
pub struct LoaderOptions {
    /// Read units from the precompiled layout instead of compiling sources.
    pub use_precompiled: bool,
    /// Write every defined unit to the precompiled layout.
    pub precompile: bool,
    /// The precompiled layout.
    pub precompiled: PrecompiledStore,
}

/// The external collaborators a loader drives.
#[derive(Clone)]
pub struct Collaborators {
    /// The process module system.
    pub host: Arc<dyn HostRuntime>,
    /// Source to compiled bytes.
    pub compiler: Arc<dyn CompilePipeline>,
    /// Compiled to transformed bytes.
    pub transformer: Arc<dyn TransformPipeline>,
    /// Transformed bytes persisted across runs.
    pub content_cache: Arc<dyn ContentCache>,
    /// In-place redefinition for reloads.
    pub hot_swap: Arc<dyn HotSwapPort>,
}

pub(crate) type AssignableMemo = HashMap<String, (Generation, Vec<HostHandle>)>;

/// Loads application units into the host runtime and reloads them on change.
///
/// Lookup, compile, transform and define run under one reentrant lock, so a
/// unit is never defined twice and change detection never interleaves with
/// a definition in progress. The lock is reentrant because a definition may
/// resolve other units (its package, or units a plugin needs) on the same
/// thread.
pub struct ModuleLoader {
    pub(crate) locator: SourceLocator,
    pub(crate) cache: ArtifactCache,
    pub(crate) options: LoaderOptions,
    pub(crate) host: Arc<dyn HostRuntime>,
    pub(crate) compiler: Arc<dyn CompilePipeline>,
    pub(crate) transformer: Arc<dyn TransformPipeline>,
    pub(crate) content_cache: Arc<dyn ContentCache>,
    pub(crate) hot_swap: Arc<dyn HotSwapPort>,
    pub(crate) stale_caches: Mutex<Vec<Arc<dyn StaleCache>>>,
    pub(crate) diagnostics: DiagnosticSink,
    pub(crate) generation: GenerationCounter,
    pub(crate) fingerprint: PathFingerprint,
    pub(crate) define_lock: ReentrantMutex<()>,
    pub(crate) plugins_activated: AtomicBool,
    pub(crate) all_loaded: AtomicBool,
    pub(crate) assignable_memo: Mutex<AssignableMemo>,
    /// Units still defined in the host whose source stopped compiling.
    pub(crate) failed_definitions: Mutex<BTreeSet<String>>,
}

impl ModuleLoader {
    /// Creates a loader over `locator`'s search path.
    ///
    /// The search-path fingerprint is captured here; change detection
    /// reports any later difference as a path change.
    pub fn new(locator: SourceLocator, options: LoaderOptions, collaborators: Collaborators) -> Self {
        let fingerprint = PathFingerprint::compute(locator.search_path(), locator.extension());
        Self {
            locator,
            cache: ArtifactCache::new(),
            options,
            host: collaborators.host,
            compiler: collaborators.compiler,
            transformer: collaborators.transformer,
            content_cache: collaborators.content_cache,
            hot_swap: collaborators.hot_swap,
            stale_caches: Mutex::new(Vec::new()),
            diagnostics: DiagnosticSink::new(),
            generation: GenerationCounter::default(),
            fingerprint,
            define_lock: ReentrantMutex::new(()),
            plugins_activated: AtomicBool::new(false),
            all_loaded: AtomicBool::new(false),
            assignable_memo: Mutex::new(HashMap::new()),
            failed_definitions: Mutex::new(BTreeSet::new()),
        }
    }

    /// Returns the unit records known to this loader.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Returns the source locator.
    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    /// Returns the mode switches.
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Returns the diagnostics of compiles that failed since they were last taken.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// Returns the current generation marker.
    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Registers a cache to clear after every successful hot swap.
    pub fn register_stale_cache(&self, cache: Arc<dyn StaleCache>) {
        self.stale_caches.lock().push(cache);
    }

    /// Resolves `name` the way the host expects of a module loader.
    ///
    /// Application units are defined by this loader; any other name is
    /// delegated to the host's parent resolution.
    pub fn load(&self, name: &str) -> Result<Option<HostHandle>, LoadError> {
        if let Some(handle) = self.resolve_and_define(name)? {
            return Ok(Some(handle));
        }
        Ok(self.host.parent_resolve(name))
    }

    /// Returns the host definition of application unit `name`, defining it if needed.
    ///
    /// Returns `Ok(None)` if `name` is not an application unit or if it
    /// failed to compile; in the latter case its record is dropped and the
    /// diagnostics are kept in [`diagnostics`](Self::diagnostics).
    pub fn resolve_and_define(&self, name: &str) -> Result<Option<HostHandle>, LoadError> {
        let _guard = self.define_lock.lock();
        if let Some(handle) = self.host.find_loaded(name) {
            return Ok(Some(handle));
        }
        if self.options.use_precompiled {
            return self.define_precompiled(name);
        }
        self.define_application_unit(name)
    }

    /// Loads every discoverable unit.
    ///
    /// Units are compiled first, in one batch, or one unit per call when the
    /// transformation pipeline compiles sources itself. Plugin units are then
    /// defined and activated before any other unit is transformed. Units that fail to compile are
    /// dropped. Returns the defined units sorted by name.
    pub fn load_all(&self) -> Result<Vec<HostHandle>, LoadError> {
        let _guard = self.define_lock.lock();
        let mut handles = if self.options.use_precompiled {
            self.load_all_precompiled()?
        } else {
            self.load_all_sources()?
        };
        handles.sort_by(|a, b| a.name().cmp(b.name()));
        self.flush_content_cache();
        self.all_loaded.store(true, Ordering::Release);
        info!(
            units = handles.len(),
            generation = %self.generation(),
            "load cycle complete"
        );
        Ok(handles)
    }

    /// Runs [`load_all`](Self::load_all) unless a bulk load already completed.
    pub(crate) fn ensure_all_loaded(&self) -> Result<(), LoadError> {
        if !self.all_loaded.load(Ordering::Acquire) {
            self.load_all()?;
        }
        Ok(())
    }

    fn load_all_precompiled(&self) -> Result<Vec<HostHandle>, LoadError> {
        let mut handles = Vec::new();
        for name in self.options.precompiled.discover() {
            if let Some(handle) = self.resolve_and_define(&name)? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    fn load_all_sources(&self) -> Result<Vec<HostHandle>, LoadError> {
        let names = self.locator.discover();
        self.cache
            .populate(&names, &self.locator)
            .map_err(|source| LoadError::Scan { source })?;

        let mut pending = Vec::new();
        for record in names.iter().filter_map(|name| self.cache.get(name)) {
            let compiled = record.lock().is_compiled();
            if !compiled && !self.restore_cached(&record) {
                pending.push(record.lock().name().to_string());
            }
        }
        let mut dropped = HashSet::new();
        if self.transformer.can_compile_sources() {
            // No bulk step, but plugin detection in phase 1 needs compiled bytes.
            for name in &pending {
                dropped.extend(self.compile_units(std::slice::from_ref(name)));
            }
        } else if !pending.is_empty() {
            debug!(units = pending.len(), "bulk compile");
            dropped.extend(self.compile_units(&pending));
        }

        let mut handles = Vec::new();
        let mut defined = HashSet::new();
        if !self.plugins_activated.load(Ordering::Acquire) {
            let plugins: Vec<&String> = names
                .iter()
                .filter(|name| {
                    self.cache.get(name).is_some_and(|record| {
                        record
                            .lock()
                            .compiled_bytes()
                            .is_some_and(|bytes| self.transformer.is_plugin(bytes))
                    })
                })
                .collect();
            let mut activated = Vec::new();
            for name in &plugins {
                if let Some(handle) = self.resolve_and_define(name)? {
                    activated.push(handle);
                }
            }
            self.transformer
                .activate_plugins(&activated)
                .map_err(|source| LoadError::Transform {
                    unit: activated
                        .first()
                        .map_or_else(String::new, |handle| handle.name().to_string()),
                    source,
                })?;
            self.plugins_activated.store(true, Ordering::Release);
            info!(plugins = activated.len(), "plugins activated");
            defined.extend(plugins.into_iter().cloned());
            handles.extend(activated);
        }

        for name in names
            .iter()
            .filter(|name| !defined.contains(*name) && !dropped.contains(*name))
        {
            if let Some(handle) = self.resolve_and_define(name)? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    fn define_precompiled(&self, name: &str) -> Result<Option<HostHandle>, LoadError> {
        let bytes = self
            .options
            .precompiled
            .read(name)
            .map_err(|source| LoadError::Precompiled {
                unit: name.to_string(),
                source,
            })?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        self.resolve_package(name)?;
        let handle = self
            .host
            .define(name, &bytes, DefineScope::Precompiled)
            .map_err(|source| LoadError::Define {
                unit: name.to_string(),
                source,
            })?;
        let record = match self.cache.get(name) {
            Some(record) => record,
            None => self.cache.insert(UnitRecord::detached(name)),
        };
        record.lock().set_loaded_precompiled(bytes, handle.clone());
        let generation = self.generation.bump();
        debug!(unit = name, %generation, "defined precompiled unit");
        Ok(Some(handle))
    }

    fn define_application_unit(&self, name: &str) -> Result<Option<HostHandle>, LoadError> {
        let record = self
            .cache
            .get_or_create(name, &self.locator)
            .map_err(|source| LoadError::Source {
                unit: name.to_string(),
                source,
            })?;
        let Some(record) = record else {
            return Ok(None);
        };
        if let Some(handle) = record.lock().loaded().cloned() {
            return Ok(Some(handle));
        }

        let compiled = record.lock().is_compiled();
        if !compiled
            && !self.restore_cached(&record)
            && !self.compile_units(&[name.to_string()]).is_empty()
        {
            return Ok(None);
        }

        let transformed = record.lock().transformed_bytes().is_some();
        if !transformed {
            self.transform(&record)?;
        }
        self.define(&record, name).map(Some)
    }

    /// Fills `record` from the content cache. Returns `true` on a hit.
    pub(crate) fn restore_cached(&self, record: &SharedRecord) -> bool {
        let mut record = record.lock();
        match self.content_cache.get(record.name(), record.source_text()) {
            Some(cached) => {
                debug!(unit = record.name(), "content cache hit");
                record.restore(cached.bytes, cached.signature_checksum);
                true
            }
            None => false,
        }
    }

    /// Compiles `names` in one batch and drops every unit left uncompiled.
    ///
    /// Returns the dropped units.
    pub(crate) fn compile_units(&self, names: &[String]) -> Vec<String> {
        if let Err(failure) = self.compiler.compile(names, &self.cache) {
            for diagnostic in failure.diagnostics {
                warn!(unit = %diagnostic.unit, line = ?diagnostic.line, "{}", diagnostic.message);
                self.diagnostics.emit(diagnostic);
            }
        }
        let failed: Vec<String> = names
            .iter()
            .filter(|name| {
                !self
                    .cache
                    .get(name)
                    .is_some_and(|record| record.lock().is_compiled())
            })
            .cloned()
            .collect();
        if !failed.is_empty() {
            for name in &failed {
                self.cache.remove(name);
            }
            let generation = self.generation.bump();
            warn!(units = ?failed, %generation, "dropped units that failed to compile");
        }
        failed
    }

    /// Transforms the compiled bytes of `record` and stores the result.
    ///
    /// Plugin units are kept untransformed. The result is written to the
    /// content cache; a failed write is logged and otherwise ignored.
    pub(crate) fn transform(&self, record: &SharedRecord) -> Result<Vec<u8>, LoadError> {
        let mut record = record.lock();
        let plugin = record
            .compiled_bytes()
            .is_some_and(|bytes| self.transformer.is_plugin(bytes));
        let bytes = if plugin {
            record.compiled_bytes().map(<[u8]>::to_vec).unwrap_or_default()
        } else {
            self.transformer
                .enhance(&mut record)
                .map_err(|source| LoadError::Transform {
                    unit: record.name().to_string(),
                    source,
                })?
        };
        record.set_transformed(bytes.clone());
        if let Err(err) = self.content_cache.put(
            &bytes,
            record.signature_checksum(),
            record.name(),
            record.source_text(),
        ) {
            warn!(unit = record.name(), error = %err, "content cache write failed");
        }
        debug!(unit = record.name(), plugin, "transformed");
        Ok(bytes)
    }

    fn define(&self, record: &SharedRecord, name: &str) -> Result<HostHandle, LoadError> {
        self.resolve_package(name)?;
        let bytes = record
            .lock()
            .transformed_bytes()
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        let handle = self
            .host
            .define(name, &bytes, DefineScope::Application)
            .map_err(|source| LoadError::Define {
                unit: name.to_string(),
                source,
            })?;
        record.lock().set_loaded(handle.clone());
        self.emit_precompiled(name, &bytes);
        let generation = self.generation.bump();
        debug!(unit = name, %generation, "defined");
        Ok(handle)
    }

    /// Defines the owning package of `name` once, before any of its units.
    fn resolve_package(&self, name: &str) -> Result<(), LoadError> {
        let Some(package) = owning_package(name) else {
            return Ok(());
        };
        let resolved = self
            .cache
            .get(package)
            .is_some_and(|record| !record.lock().is_unit());
        if resolved {
            return Ok(());
        }
        let container = self
            .host
            .define_package(package, &PackageMetadata::default())
            .map_err(|source| LoadError::Define {
                unit: package.to_string(),
                source,
            })?;
        self.cache.insert_package_marker(package, container);
        let generation = self.generation.bump();
        debug!(package, %generation, "defined package");
        Ok(())
    }

    /// Writes `bytes` to the precompiled layout when emission is on.
    pub(crate) fn emit_precompiled(&self, name: &str, bytes: &[u8]) {
        if !self.options.precompile {
            return;
        }
        match self.options.precompiled.write(name, bytes) {
            Ok(path) => debug!(unit = name, path = %path.display(), "precompiled"),
            Err(err) => warn!(unit = name, error = %err, "precompiled write failed"),
        }
    }

    pub(crate) fn flush_content_cache(&self) {
        if let Err(err) = self.content_cache.flush() {
            warn!(error = %err, "content cache flush failed");
        }
    }
}
