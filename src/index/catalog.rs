//! Index Catalog
//!
//! Maps index locators to backends. A locator is either the name of an index
//! held by this node, or an `http(s)://host:port/<name>` address of an index
//! served by another node.

use super::IndexBackend;
use super::memory::MemoryIndex;
use super::remote::{DEFAULT_ATTEMPTS, DEFAULT_TIMEOUT, RemoteIndex};
use crate::error::{Result, SearchError};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct IndexCatalog {
    backends: DashMap<String, Arc<dyn IndexBackend>>,
    locals: DashMap<String, Arc<MemoryIndex>>,
    remote_timeout: Duration,
    remote_attempts: usize,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::with_remote_policy(DEFAULT_TIMEOUT, DEFAULT_ATTEMPTS)
    }

    /// Catalog whose remote indexes use the given per-attempt timeout and attempt count.
    pub fn with_remote_policy(remote_timeout: Duration, remote_attempts: usize) -> Self {
        Self {
            backends: DashMap::new(),
            locals: DashMap::new(),
            remote_timeout,
            remote_attempts,
        }
    }

    /// Registers an arbitrary backend under `locator`, replacing any previous one.
    pub fn register(&self, locator: &str, backend: Arc<dyn IndexBackend>) {
        self.backends.insert(locator.to_string(), backend);
        tracing::info!("Registered index backend: {}", locator);
    }

    /// Returns the local index called `name`, creating it if needed.
    pub fn local_or_create(&self, name: &str) -> Arc<MemoryIndex> {
        self.locals
            .entry(name.to_string())
            .or_insert_with(|| {
                let index = Arc::new(MemoryIndex::new(name));
                self.backends
                    .insert(name.to_string(), index.clone() as Arc<dyn IndexBackend>);
                tracing::info!("Created local index: {}", name);
                index
            })
            .clone()
    }

    pub fn local(&self, name: &str) -> Option<Arc<MemoryIndex>> {
        self.locals.get(name).map(|entry| entry.value().clone())
    }

    pub fn resolve(&self, locator: &str) -> Result<Arc<dyn IndexBackend>> {
        if let Some(backend) = self.backends.get(locator) {
            return Ok(backend.value().clone());
        }

        if locator.starts_with("http://") || locator.starts_with("https://") {
            let backend = self
                .backends
                .entry(locator.to_string())
                .or_try_insert_with(|| {
                    RemoteIndex::new(locator, self.remote_timeout, self.remote_attempts)
                        .map(|remote| Arc::new(remote) as Arc<dyn IndexBackend>)
                })?
                .clone();
            tracing::debug!("Resolved remote index: {}", locator);
            return Ok(backend);
        }

        Err(SearchError::UnknownIndex(locator.to_string()))
    }

    /// Locators of every backend known so far, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut locators: Vec<String> = self
            .backends
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        locators.sort();
        locators
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self::new()
    }
}
