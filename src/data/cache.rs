use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::loader::load_dataset;
use super::model::Dataset;
use crate::config::DataSources;
use crate::error::Result;

/// Memoised [`load_dataset`], keyed on the source identifiers.
///
/// Sources are static files, so entries are never invalidated. A failed
/// load is not cached and will be retried on the next call.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<DataSources, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `sources`, reading storage only on the
    /// first request.
    pub fn get_or_load(&self, sources: &DataSources) -> Result<Arc<Dataset>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = entries.get(sources) {
            log::debug!("dataset cache hit for {}", sources.facilities.display());
            return Ok(Arc::clone(hit));
        }

        log::info!("dataset cache miss, loading from {}", sources.facilities.display());
        let dataset = Arc::new(load_dataset(sources)?);
        entries.insert(sources.clone(), Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
