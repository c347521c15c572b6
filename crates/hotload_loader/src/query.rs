//! Bulk queries and lookups over the loaded units.

use hotload_cache::HostHandle;

use crate::error::LoadError;
use crate::loader::ModuleLoader;

impl ModuleLoader {
    /// Returns every application unit assignable to `capability`.
    ///
    /// The first query of a loader runs [`load_all`](Self::load_all), unless
    /// one already ran; cached units not loaded yet are loaded too. Results
    /// are memoized per capability until the generation changes.
    pub fn assignable_to(&self, capability: &str) -> Result<Vec<HostHandle>, LoadError> {
        self.ensure_all_loaded()?;
        let generation = self.generation();
        if let Some((at, handles)) = self.assignable_memo.lock().get(capability) {
            if *at == generation {
                return Ok(handles.clone());
            }
        }
        let handles = self
            .cache
            .assignable_to(capability, |name| self.resolve_and_define(name))?;
        self.assignable_memo
            .lock()
            .insert(capability.to_string(), (self.generation(), handles.clone()));
        Ok(handles)
    }

    /// Returns every application unit carrying `marker`, loading units as needed.
    pub fn annotated_with(&self, marker: &str) -> Result<Vec<HostHandle>, LoadError> {
        self.ensure_all_loaded()?;
        self.cache
            .annotated_with(marker, |name| self.resolve_and_define(name))
    }

    /// Loads the unit whose name equals `name` ignoring ASCII case.
    ///
    /// Runs a bulk load first like the other queries. Cached units are
    /// searched first, then every discoverable unit. A nested unit also
    /// matches when `$` is spelled as `.`.
    pub fn load_ignore_case(&self, name: &str) -> Result<Option<HostHandle>, LoadError> {
        self.ensure_all_loaded()?;
        let matches = |candidate: &String| {
            candidate.eq_ignore_ascii_case(name)
                || candidate.replace('$', ".").eq_ignore_ascii_case(name)
        };
        let found = self.cache.names().into_iter().find(matches).or_else(|| {
            let discovered = if self.options.use_precompiled {
                self.options.precompiled.discover()
            } else {
                self.locator.discover()
            };
            discovered.into_iter().find(matches)
        });
        match found {
            Some(found) => self.load(&found),
            None => Ok(None),
        }
    }

    /// Returns the bytes defining `name`.
    ///
    /// For an application unit these are its transformed bytes (or its
    /// compiled bytes before transformation). Anything else is looked up as
    /// the host resource `a/b/C.<precompiled extension>`.
    pub fn unit_definition(&self, name: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let name = name.replace(['/', '\\'], ".");
        if self.options.use_precompiled {
            let precompiled = self
                .options
                .precompiled
                .read(&name)
                .map_err(|source| LoadError::Precompiled {
                    unit: name.clone(),
                    source,
                })?;
            if precompiled.is_some() {
                return Ok(precompiled);
            }
        } else if let Some(record) = self.cache.get(&name) {
            let record = record.lock();
            if let Some(bytes) = record.transformed_bytes().or(record.compiled_bytes()) {
                return Ok(Some(bytes.to_vec()));
            }
        }
        let resource = format!(
            "{}.{}",
            name.replace('.', "/"),
            self.options.precompiled.extension()
        );
        Ok(self.host.open_resource(&resource))
    }
}
