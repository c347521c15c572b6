//! The in-memory registry of application units.

use std::collections::HashMap;
use std::sync::Arc;

use hotload_source::SourceLocator;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::error::CacheError;
use crate::handle::{HostHandle, PackageHandle};
use crate::record::UnitRecord;

/// A unit record shared between the cache, the loader and collaborators.
pub type SharedRecord = Arc<Mutex<UnitRecord>>;

/// Mapping from unit name to [`UnitRecord`].
///
/// The map is read-heavy: lookups and bulk queries take the read lock,
/// inserts and removals the write lock. Bulk queries work on a snapshot so
/// they never observe a half-updated mapping. The cache does no I/O of its
/// own except reading a source when [`get_or_create`](Self::get_or_create)
/// creates a record.
#[derive(Default)]
pub struct ArtifactCache {
    records: RwLock<HashMap<String, SharedRecord>>,
}

impl ArtifactCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached record for `name` without triggering discovery.
    pub fn get(&self, name: &str) -> Option<SharedRecord> {
        self.records.read().get(name).cloned()
    }

    /// Returns the cached record for `name`, creating it if a source exists.
    ///
    /// A new record has its source text loaded and no bytes. Returns
    /// `Ok(None)` when the locator finds no source, which means `name` is
    /// not an application unit.
    pub fn get_or_create(
        &self,
        name: &str,
        locator: &SourceLocator,
    ) -> Result<Option<SharedRecord>, CacheError> {
        if let Some(record) = self.get(name) {
            return Ok(Some(record));
        }
        let Some(source) = locator.resolve(name) else {
            return Ok(None);
        };
        let record = UnitRecord::from_source(name, source)?;
        let mut records = self.records.write();
        let shared = records
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(record)));
        Ok(Some(Arc::clone(shared)))
    }

    /// Creates records for every name that has a source, reading sources in parallel.
    ///
    /// Returns the number of names that resolved to a record.
    pub fn populate(&self, names: &[String], locator: &SourceLocator) -> Result<usize, CacheError> {
        let found = names
            .par_iter()
            .map(|name| self.get_or_create(name, locator))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(found.into_iter().flatten().count())
    }

    /// Inserts a record, replacing any record with the same name.
    pub fn insert(&self, record: UnitRecord) -> SharedRecord {
        let name = record.name().to_string();
        let shared = Arc::new(Mutex::new(record));
        self.records.write().insert(name, Arc::clone(&shared));
        shared
    }

    /// Inserts the marker record for a package defined in the host.
    pub fn insert_package_marker(&self, name: &str, container: PackageHandle) -> SharedRecord {
        self.insert(UnitRecord::package_marker(name, container))
    }

    /// Removes the record for `name`.
    pub fn remove(&self, name: &str) -> Option<SharedRecord> {
        self.records.write().remove(name)
    }

    /// Removes every record.
    pub fn clear(&self) {
        *self.records.write() = HashMap::new();
    }

    /// Returns `true` if a record for `name` is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.records.read().contains_key(name)
    }

    /// Returns the number of cached records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no records are cached.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns the cached unit names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns a snapshot of every cached record, sorted by name.
    pub fn all(&self) -> Vec<SharedRecord> {
        let mut entries: Vec<(String, SharedRecord)> = self
            .records
            .read()
            .iter()
            .map(|(name, record)| (name.clone(), Arc::clone(record)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, record)| record).collect()
    }

    /// Returns every unit whose host definition is assignable to `capability`.
    ///
    /// Units never loaded are loaded through `resolve` first; a resolve
    /// error aborts the query. Package markers and the capability unit
    /// itself are excluded.
    pub fn assignable_to<E>(
        &self,
        capability: &str,
        resolve: impl FnMut(&str) -> Result<Option<HostHandle>, E>,
    ) -> Result<Vec<HostHandle>, E> {
        self.query(resolve, |handle| {
            handle.name() != capability && handle.is_assignable_to(capability)
        })
    }

    /// Returns every unit whose host definition carries `marker`.
    ///
    /// Units never loaded are loaded through `resolve` first.
    pub fn annotated_with<E>(
        &self,
        marker: &str,
        resolve: impl FnMut(&str) -> Result<Option<HostHandle>, E>,
    ) -> Result<Vec<HostHandle>, E> {
        self.query(resolve, |handle| handle.has_marker(marker))
    }

    fn query<E>(
        &self,
        mut resolve: impl FnMut(&str) -> Result<Option<HostHandle>, E>,
        matches: impl Fn(&HostHandle) -> bool,
    ) -> Result<Vec<HostHandle>, E> {
        let mut results = Vec::new();
        for record in self.all() {
            let (name, loaded) = {
                let record = record.lock();
                if !record.is_unit() {
                    continue;
                }
                (record.name().to_string(), record.loaded().cloned())
            };
            let handle = match loaded {
                Some(handle) => Some(handle),
                None => resolve(&name)?,
            };
            if let Some(handle) = handle.filter(|h| matches(h)) {
                results.push(handle);
            }
        }
        Ok(results)
    }
}
