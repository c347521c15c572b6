//! In-process collaborators for the loader.
//!
//! These implement every collaborator contract over a small line-oriented
//! unit format, so the loader can run without an external compiler or
//! host runtime:
//!
//! ```text
//! @plugin              marks a plugin unit
//! @Entity              any other `@` line is a marker
//! implements Named     a capability
//! uses app.models.Tag  a dependency
//! pub name             a member that is part of the signature
//! error: message       makes the compile fail
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use hotload_cache::{
    content_key, ArtifactCache, CacheError, CachedUnit, ContentCache, HostHandle, PackageHandle,
    PackageMetadata, UnitRecord,
};
use hotload_common::ContentHash;
use hotload_diagnostics::Diagnostic;
use parking_lot::{Mutex, RwLock};
use xxhash_rust::xxh3::xxh3_64;

use crate::host::{DefineScope, HostError, HostRuntime};
use crate::pipeline::{
    CompileFailure, CompilePipeline, HotSwapPort, HotSwapRefused, TransformError,
    TransformPipeline,
};

const PLUGIN_MARKER: &str = "@plugin";

fn lines(bytes: &[u8]) -> impl Iterator<Item = &str> {
    std::str::from_utf8(bytes)
        .unwrap_or_default()
        .lines()
        .map(str::trim)
}

/// One definition made in a [`MemoryHost`], in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionEvent {
    /// A package was defined.
    Package(String),
    /// A unit was defined.
    Unit(String, DefineScope),
}

/// A host runtime kept in memory.
///
/// Capabilities come from `implements` lines and markers from `@` lines of
/// the defined bytes. Names that are not application units resolve against
/// a fixed parent table; resources resolve against a list of directories.
#[derive(Default)]
pub struct MemoryHost {
    units: RwLock<HashMap<String, HostHandle>>,
    packages: RwLock<HashMap<String, PackageHandle>>,
    log: Mutex<Vec<DefinitionEvent>>,
    parent: HashMap<String, HostHandle>,
    resource_roots: Vec<PathBuf>,
}

impl MemoryHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit the parent resolution knows about.
    pub fn with_parent_unit(mut self, name: &str) -> Self {
        self.parent
            .insert(name.to_string(), HostHandle::new(name, [], []));
        self
    }

    /// Adds a directory searched for host resources.
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_roots.push(root.into());
        self
    }

    /// Returns every definition made so far, in order.
    pub fn definitions(&self) -> Vec<DefinitionEvent> {
        self.log.lock().clone()
    }

    /// Returns the names of the defined units, sorted.
    pub fn defined_units(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns `true` if `name` has been defined as a package.
    pub fn has_package(&self, name: &str) -> bool {
        self.packages.read().contains_key(name)
    }
}

impl HostRuntime for MemoryHost {
    fn find_loaded(&self, name: &str) -> Option<HostHandle> {
        self.units.read().get(name).cloned()
    }

    fn define(
        &self,
        name: &str,
        bytes: &[u8],
        scope: DefineScope,
    ) -> Result<HostHandle, HostError> {
        let mut units = self.units.write();
        if units.contains_key(name) {
            return Err(HostError::new(format!("'{name}' is already defined")));
        }
        let mut capabilities = Vec::new();
        let mut markers = Vec::new();
        for line in lines(bytes) {
            if let Some(capability) = line.strip_prefix("implements ") {
                capabilities.push(capability.trim().to_string());
            } else if let Some(marker) = line.strip_prefix('@') {
                markers.push(marker.trim().to_string());
            }
        }
        let handle = HostHandle::new(name, capabilities, markers);
        units.insert(name.to_string(), handle.clone());
        self.log
            .lock()
            .push(DefinitionEvent::Unit(name.to_string(), scope));
        Ok(handle)
    }

    fn define_package(
        &self,
        name: &str,
        metadata: &PackageMetadata,
    ) -> Result<PackageHandle, HostError> {
        let mut packages = self.packages.write();
        if let Some(existing) = packages.get(name) {
            return Ok(existing.clone());
        }
        let handle = PackageHandle::new(name, metadata.clone());
        packages.insert(name.to_string(), handle.clone());
        self.log
            .lock()
            .push(DefinitionEvent::Package(name.to_string()));
        Ok(handle)
    }

    fn parent_resolve(&self, name: &str) -> Option<HostHandle> {
        self.parent.get(name).cloned()
    }

    fn resource(&self, path: &str) -> Option<PathBuf> {
        self.resources(path).into_iter().next()
    }

    fn resources(&self, path: &str) -> Vec<PathBuf> {
        let relative = path.trim_start_matches('/');
        self.resource_roots
            .iter()
            .map(|root| root.join(relative))
            .filter(|candidate| candidate.is_file())
            .collect()
    }

    fn open_resource(&self, path: &str) -> Option<Vec<u8>> {
        self.resource(path).and_then(|file| std::fs::read(file).ok())
    }
}

/// A compiler whose output is the source text itself.
///
/// A unit with a line starting with `error:` fails to compile.
#[derive(Default)]
pub struct CopyCompiler {
    compiled: AtomicUsize,
    calls: AtomicUsize,
}

impl CopyCompiler {
    /// Creates a compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many units have been compiled successfully.
    pub fn compiled_count(&self) -> usize {
        self.compiled.load(Ordering::Relaxed)
    }

    /// Returns how many times [`compile`](CompilePipeline::compile) was called.
    pub fn compile_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CompilePipeline for CopyCompiler {
    fn compile(&self, names: &[String], cache: &ArtifactCache) -> Result<(), CompileFailure> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut diagnostics = Vec::new();
        for name in names {
            let Some(record) = cache.get(name) else {
                diagnostics.push(Diagnostic::error(name.as_str(), "no source for unit"));
                continue;
            };
            let mut record = record.lock();
            let error = record
                .source_text()
                .lines()
                .enumerate()
                .find_map(|(idx, line)| {
                    line.trim()
                        .strip_prefix("error:")
                        .map(|message| (idx, message.trim().to_string()))
                });
            match error {
                Some((idx, message)) => {
                    let line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
                    diagnostics.push(Diagnostic::error(name.as_str(), message).at_line(line));
                }
                None => {
                    let bytes = record.source_text().as_bytes().to_vec();
                    record.set_compiled(bytes);
                    self.compiled.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(CompileFailure { diagnostics })
        }
    }
}

/// A transformation pipeline driven by unit markers.
///
/// The signature checksum covers the `pub` lines of a unit. Enhancing a
/// unit appends one `# <plugin>` line per active plugin. Dependencies are
/// read from `uses` lines.
#[derive(Default)]
pub struct MarkerTransform {
    plugins: RwLock<Vec<String>>,
    enhanced: AtomicUsize,
}

impl MarkerTransform {
    /// Creates a pipeline with no active plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many units have been enhanced.
    pub fn enhanced_count(&self) -> usize {
        self.enhanced.load(Ordering::Relaxed)
    }

    /// Returns the names of the active plugins, in activation order.
    pub fn active_plugins(&self) -> Vec<String> {
        self.plugins.read().clone()
    }
}

/// Computes the signature checksum of a unit: a hash over its `pub` lines.
pub fn signature_checksum(bytes: &[u8]) -> u64 {
    let signature: Vec<&str> = lines(bytes).filter(|line| line.starts_with("pub ")).collect();
    xxh3_64(signature.join("\n").as_bytes())
}

impl TransformPipeline for MarkerTransform {
    fn enhance(&self, record: &mut UnitRecord) -> Result<Vec<u8>, TransformError> {
        let Some(compiled) = record.compiled_bytes() else {
            return Err(TransformError::new(format!(
                "'{}' has no compiled bytes",
                record.name()
            )));
        };
        let mut bytes = compiled.to_vec();
        for plugin in self.plugins.read().iter() {
            if !bytes.is_empty() && !bytes.ends_with(b"\n") {
                bytes.push(b'\n');
            }
            bytes.extend_from_slice(format!("# {plugin}\n").as_bytes());
        }
        let checksum = signature_checksum(compiled);
        record.set_signature_checksum(checksum);
        self.enhanced.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }

    fn dependents_of(&self, modified: &[String], cache: &ArtifactCache) -> Vec<String> {
        let uses: Vec<(String, Vec<String>)> = cache
            .all()
            .iter()
            .map(|record| {
                let record = record.lock();
                let used = record
                    .source_text()
                    .lines()
                    .filter_map(|line| line.trim().strip_prefix("uses "))
                    .map(|used| used.trim().to_string())
                    .collect();
                (record.name().to_string(), used)
            })
            .collect();

        let mut affected: HashSet<String> = modified.iter().cloned().collect();
        let mut dependents = Vec::new();
        loop {
            let before = dependents.len();
            for (name, used) in &uses {
                if !affected.contains(name) && used.iter().any(|u| affected.contains(u)) {
                    affected.insert(name.clone());
                    dependents.push(name.clone());
                }
            }
            if dependents.len() == before {
                return dependents;
            }
        }
    }

    fn is_plugin(&self, compiled: &[u8]) -> bool {
        lines(compiled).any(|line| line == PLUGIN_MARKER)
    }

    fn activate_plugins(&self, plugins: &[HostHandle]) -> Result<(), TransformError> {
        let mut active = self.plugins.write();
        for plugin in plugins {
            if !active.iter().any(|name| name == plugin.name()) {
                active.push(plugin.name().to_string());
            }
        }
        Ok(())
    }
}

/// A hot-swap port that accepts or refuses every batch.
pub struct MemoryHotSwap {
    accept: bool,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MemoryHotSwap {
    /// Creates a port that accepts every batch.
    pub fn accepting() -> Self {
        Self {
            accept: true,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Creates a port that refuses every batch.
    pub fn refusing() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    /// Returns the unit names of every batch submitted so far.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

impl HotSwapPort for MemoryHotSwap {
    fn redefine(&self, batch: &[(HostHandle, Vec<u8>)]) -> Result<(), HotSwapRefused> {
        self.batches
            .lock()
            .push(batch.iter().map(|(h, _)| h.name().to_string()).collect());
        if self.accept {
            Ok(())
        } else {
            Err(HotSwapRefused::new("redefinition is not supported"))
        }
    }
}

/// A content cache that lives as long as the process.
#[derive(Default)]
pub struct MemoryContentCache {
    entries: RwLock<HashMap<ContentHash, CachedUnit>>,
}

impl MemoryContentCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached units.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ContentCache for MemoryContentCache {
    fn get(&self, name: &str, source_text: &str) -> Option<CachedUnit> {
        self.entries
            .read()
            .get(&content_key(name, source_text))
            .cloned()
    }

    fn put(
        &self,
        bytes: &[u8],
        signature_checksum: u64,
        name: &str,
        source_text: &str,
    ) -> Result<(), CacheError> {
        self.entries.write().insert(
            content_key(name, source_text),
            CachedUnit {
                bytes: bytes.to_vec(),
                signature_checksum,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotload_source::SourceHandle;

    fn compiled_record(dir: &std::path::Path, text: &str) -> UnitRecord {
        let path = dir.join("User.src");
        std::fs::write(&path, text).unwrap();
        let mut record = UnitRecord::from_source("app.User", SourceHandle::new(path)).unwrap();
        record.set_compiled(text.as_bytes().to_vec());
        record
    }

    #[test]
    fn host_reads_capabilities_and_markers() {
        let host = MemoryHost::new();
        let handle = host
            .define(
                "app.User",
                b"@Entity\nimplements Named\npub name\n",
                DefineScope::Application,
            )
            .unwrap();
        assert!(handle.is_assignable_to("Named"));
        assert!(handle.has_marker("Entity"));
        assert!(host.find_loaded("app.User").unwrap().same_as(&handle));
    }

    #[test]
    fn host_rejects_duplicate_definitions() {
        let host = MemoryHost::new();
        host.define("app.User", b"", DefineScope::Application)
            .unwrap();
        let err = host
            .define("app.User", b"", DefineScope::Application)
            .unwrap_err();
        assert!(err.message.contains("already defined"));
    }

    #[test]
    fn host_defines_packages_once() {
        let host = MemoryHost::new();
        let first = host
            .define_package("app", &PackageMetadata::default())
            .unwrap();
        let second = host
            .define_package("app", &PackageMetadata::default())
            .unwrap();
        assert_eq!(first.name(), second.name());
        assert_eq!(host.definitions(), vec![DefinitionEvent::Package("app".into())]);
    }

    #[test]
    fn host_parent_table() {
        let host = MemoryHost::new().with_parent_unit("std.String");
        assert!(host.parent_resolve("std.String").is_some());
        assert!(host.parent_resolve("std.Vec").is_none());
    }

    #[test]
    fn compiler_reports_error_lines() {
        let cache = ArtifactCache::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bad.src");
        std::fs::write(&path, "pub name\nerror: missing type\n").unwrap();
        cache.insert(UnitRecord::from_source("app.Bad", SourceHandle::new(path)).unwrap());

        let compiler = CopyCompiler::new();
        let failure = compiler
            .compile(&["app.Bad".to_string()], &cache)
            .unwrap_err();
        assert_eq!(failure.diagnostics.len(), 1);
        assert_eq!(failure.diagnostics[0].line, Some(2));
        assert_eq!(failure.diagnostics[0].message, "missing type");
        assert!(!cache.get("app.Bad").unwrap().lock().is_compiled());
        assert_eq!(compiler.compiled_count(), 0);
        assert_eq!(compiler.compile_calls(), 1);
    }

    #[test]
    fn enhance_sets_checksum_and_appends_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = compiled_record(dir.path(), "pub name\nlet x");
        let transform = MarkerTransform::new();
        transform
            .activate_plugins(&[HostHandle::new("app.plugins.Audit", [], [])])
            .unwrap();

        let bytes = transform.enhance(&mut record).unwrap();
        assert_eq!(bytes, b"pub name\nlet x\n# app.plugins.Audit\n");
        assert_eq!(record.signature_checksum(), signature_checksum(b"pub name"));
        assert_eq!(transform.enhanced_count(), 1);
    }

    #[test]
    fn checksum_ignores_non_signature_lines() {
        assert_eq!(
            signature_checksum(b"pub name\nlet x = 1"),
            signature_checksum(b"pub name\nlet x = 2")
        );
        assert_ne!(
            signature_checksum(b"pub name"),
            signature_checksum(b"pub name\npub age")
        );
    }

    #[test]
    fn plugin_detection() {
        let transform = MarkerTransform::new();
        assert!(transform.is_plugin(b"@plugin\npub run"));
        assert!(!transform.is_plugin(b"@plugins\npub run"));
    }

    #[test]
    fn dependents_are_transitive() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new();
        for (name, text) in [
            ("Tag", "pub label"),
            ("Post", "uses app.Tag"),
            ("Feed", "uses app.Post"),
            ("Other", "pub x"),
        ] {
            let path = dir.path().join(format!("{name}.src"));
            std::fs::write(&path, text).unwrap();
            cache.insert(
                UnitRecord::from_source(format!("app.{name}"), SourceHandle::new(path)).unwrap(),
            );
        }

        let mut dependents = MarkerTransform::new().dependents_of(&["app.Tag".into()], &cache);
        dependents.sort();
        assert_eq!(dependents, vec!["app.Feed", "app.Post"]);
    }

    #[test]
    fn hot_swap_records_batches() {
        let port = MemoryHotSwap::refusing();
        let batch = vec![(HostHandle::new("app.User", [], []), b"x".to_vec())];
        assert!(port.redefine(&batch).is_err());
        assert_eq!(port.batches(), vec![vec!["app.User".to_string()]]);
    }

    #[test]
    fn memory_content_cache_keys_on_source() {
        let cache = MemoryContentCache::new();
        cache.put(b"bytes", 7, "app.User", "pub name").unwrap();
        let hit = cache.get("app.User", "pub name").unwrap();
        assert_eq!(hit.bytes, b"bytes");
        assert_eq!(hit.signature_checksum, 7);
        assert!(cache.get("app.User", "pub age").is_none());
        assert_eq!(cache.len(), 1);
    }
}
