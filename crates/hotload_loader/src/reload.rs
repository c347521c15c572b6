//! Change detection and in-place reload.

use std::collections::HashSet;
use std::path::PathBuf;

use hotload_cache::HostHandle;
use hotload_source::PathFingerprint;
use tracing::{debug, info, warn};

use crate::error::{LoadError, ReloadError};
use crate::loader::ModuleLoader;

impl ModuleLoader {
    /// Reloads every unit whose source changed since it was compiled.
    ///
    /// Modified units and the cached units depending on them are
    /// recompiled and transformed again, then swapped into the host as one
    /// batch. A unit that no longer compiles is dropped. Returns `Ok(())`
    /// when nothing changed or the batch was swapped in place; any other
    /// outcome requires a restart:
    ///
    /// - a changed signature checksum fails with
    ///   [`ReloadError::SignatureChanged`], whatever the hot swap did;
    /// - a refused hot swap fails with [`ReloadError::RestartRequired`];
    /// - a changed set of files on the search path drops the units whose
    ///   source is gone and fails with [`ReloadError::PathChanged`];
    /// - a defined unit that no longer compiles fails with
    ///   [`ReloadError::CompileFailed`], on this and every later cycle, since
    ///   the host keeps its previous definition.
    ///
    /// Running it twice without touching any file is a no-op the second time.
    pub fn detect_changes(&self) -> Result<(), ReloadError> {
        if self.options.use_precompiled {
            return Ok(());
        }
        let _guard = self.define_lock.lock();

        let modified = self.refresh_modified()?;
        if !modified.is_empty() {
            let outcome = self.reload(&modified);
            self.flush_content_cache();
            outcome?;
        }

        let fingerprint = PathFingerprint::compute(self.locator.search_path(), self.locator.extension());
        if fingerprint != self.fingerprint {
            let removed = self.prune_missing_sources();
            let generation = self.generation.bump();
            warn!(removed = ?removed, %generation, "search path changed");
            return Err(ReloadError::PathChanged { removed });
        }

        let failed = self.failed_definitions.lock();
        if !failed.is_empty() {
            return Err(ReloadError::CompileFailed {
                units: failed.iter().cloned().collect(),
            });
        }
        Ok(())
    }

    /// Refreshes stale units and the units depending on them.
    ///
    /// Returns the refreshed names, stale units first.
    fn refresh_modified(&self) -> Result<Vec<String>, LoadError> {
        let mut modified = Vec::new();
        for record in self.cache.all() {
            let mut record = record.lock();
            if record.is_unit() && record.is_stale() {
                record.refresh().map_err(|source| LoadError::Source {
                    unit: record.name().to_string(),
                    source,
                })?;
                modified.push(record.name().to_string());
            }
        }
        if modified.is_empty() {
            return Ok(modified);
        }

        let mut seen: HashSet<String> = modified.iter().cloned().collect();
        for name in self.transformer.dependents_of(&modified, &self.cache) {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(record) = self.cache.get(&name) else {
                continue;
            };
            record.lock().refresh().map_err(|source| LoadError::Source {
                unit: name.clone(),
                source,
            })?;
            modified.push(name);
        }
        debug!(units = ?modified, "modified units");
        Ok(modified)
    }

    /// Recompiles, transforms and hot-swaps the refreshed units.
    fn reload(&self, modified: &[String]) -> Result<(), ReloadError> {
        let mut batch: Vec<(HostHandle, Vec<u8>)> = Vec::new();
        let mut signature_changed = Vec::new();
        let mut recompiled = 0usize;

        for name in modified {
            let was_defined = self
                .cache
                .get(name)
                .is_some_and(|record| record.lock().loaded().is_some());
            if !self.compile_units(std::slice::from_ref(name)).is_empty() {
                if was_defined {
                    warn!(unit = %name, "defined unit no longer compiles");
                    self.failed_definitions.lock().insert(name.clone());
                }
                continue;
            }
            let Some(record) = self.cache.get(name) else {
                continue;
            };
            let previous = record.lock().signature_checksum();
            let bytes = self.transform(&record)?;
            self.emit_precompiled(name, &bytes);
            let (checksum, loaded) = {
                let record = record.lock();
                (record.signature_checksum(), record.loaded().cloned())
            };
            if checksum != previous {
                signature_changed.push(name.clone());
            }
            if let Some(handle) = loaded {
                batch.push((handle, bytes));
            }
            recompiled += 1;
            self.generation.bump();
        }

        if !batch.is_empty() {
            let swapped = self.hot_swap.redefine(&batch);
            if let Err(refused) = swapped {
                if !signature_changed.is_empty() {
                    return Err(ReloadError::SignatureChanged {
                        units: signature_changed,
                    });
                }
                return Err(ReloadError::RestartRequired(refused));
            }
            self.invalidate_derived_caches();
        }
        if !signature_changed.is_empty() {
            return Err(ReloadError::SignatureChanged {
                units: signature_changed,
            });
        }
        info!(
            recompiled,
            swapped = batch.len(),
            generation = %self.generation(),
            "reloaded"
        );
        Ok(())
    }

    fn invalidate_derived_caches(&self) {
        self.assignable_memo.lock().clear();
        for cache in self.stale_caches.lock().iter() {
            cache.clear();
        }
    }

    /// Drops every record whose source file no longer exists, together with
    /// every other record backed by the same file.
    fn prune_missing_sources(&self) -> Vec<String> {
        let mut missing: HashSet<PathBuf> = HashSet::new();
        let mut backed = Vec::new();
        for record in self.cache.all() {
            let record = record.lock();
            if let Some(source) = record.source() {
                if !source.exists() {
                    missing.insert(source.path().to_path_buf());
                }
                backed.push((record.name().to_string(), source.path().to_path_buf()));
            }
        }

        let mut removed = Vec::new();
        for (name, path) in backed {
            if missing.contains(&path) {
                self.cache.remove(&name);
                removed.push(name);
            }
        }
        removed
    }
}
