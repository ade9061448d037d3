//! Search Registry
//!
//! Deduplicates equivalent in-flight searches. Every root search is stored
//! under its canonical subject (`query@locators`) and under the hash of that
//! subject; a node removes itself once its result has been taken, after
//! which an identical query starts over with a fresh tree.
//!
//! Both tables are always locked in the same order (subject first, then
//! hash), for inserts and evictions alike.

use super::node::{SearchNode, make_subject, subject_hash};
use super::parser::{QueryParser, join_locators, normalize_query, split_locators};
use crate::error::Result;
use crate::index::catalog::IndexCatalog;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

pub struct SearchRegistry {
    catalog: Arc<IndexCatalog>,
    searches: DashMap<String, Arc<SearchNode>>,
    search_hashes: DashMap<u64, Arc<SearchNode>>,
}

impl SearchRegistry {
    /// Creates an empty registry resolving index locators through `catalog`.
    pub fn new(catalog: Arc<IndexCatalog>) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            searches: DashMap::new(),
            search_hashes: DashMap::new(),
        })
    }

    pub fn catalog(&self) -> &Arc<IndexCatalog> {
        &self.catalog
    }

    /// A parser whose nodes evict themselves from this registry.
    pub fn parser(self: &Arc<Self>) -> QueryParser {
        QueryParser::with_registry(self.catalog.clone(), Arc::downgrade(self))
    }

    /// Returns the live search for this query and locators, starting one if
    /// there is none.
    ///
    /// Two concurrent calls for the same canonical subject get the same node;
    /// the tree is parsed (and its lookups dispatched) once.
    pub fn start_search(self: &Arc<Self>, query: &str, index_locators: &str) -> Result<Arc<SearchNode>> {
        let query = normalize_query(query);
        let locators = split_locators(index_locators);
        let subject = make_subject(&query, &join_locators(&locators));

        match self.searches.entry(subject) {
            Entry::Occupied(existing) => {
                tracing::debug!("Reusing live search {}", existing.key());
                Ok(existing.get().clone())
            }
            Entry::Vacant(slot) => {
                tracing::info!("Starting new search for {}", slot.key());
                let node = self.parser().parse_locators(&query, &locators)?;
                self.index_hash(node.hash_code(), &node);
                slot.insert(node.clone());
                Ok(node)
            }
        }
    }

    /// Files `node` under `hash` unless a different live search already holds
    /// it; the first holder stays reachable by hash.
    pub(crate) fn index_hash(&self, hash: u64, node: &Arc<SearchNode>) -> bool {
        match self.search_hashes.entry(hash) {
            Entry::Occupied(taken) => {
                if Arc::ptr_eq(taken.get(), node) {
                    return true;
                }
                tracing::warn!(
                    "Hash {} of {} is held by live search {}; {} is only reachable by subject",
                    hash,
                    node.subject(),
                    taken.get().subject(),
                    node.subject()
                );
                false
            }
            Entry::Vacant(free) => {
                free.insert(node.clone());
                true
            }
        }
    }

    /// Evicts `node` if it is the one registered under its subject.
    ///
    /// A different live node with the same subject is left alone.
    pub fn remove(&self, node: &SearchNode) {
        let removed = self
            .searches
            .remove_if(node.subject(), |_, live| {
                if !std::ptr::eq(Arc::as_ptr(live), node) {
                    return false;
                }
                self.search_hashes
                    .remove_if(&node.hash_code(), |_, hashed| std::ptr::eq(Arc::as_ptr(hashed), node));
                true
            })
            .is_some();

        if removed {
            tracing::debug!("Evicted search {}", node.subject());
        }
    }

    /// Live search for a raw query and locator string, normalized the same
    /// way [`SearchRegistry::start_search`] does.
    pub fn lookup(&self, query: &str, index_locators: &str) -> Option<Arc<SearchNode>> {
        let subject = make_subject(
            &normalize_query(query),
            &join_locators(&split_locators(index_locators)),
        );
        self.lookup_by_key(&subject)
    }

    pub fn lookup_by_key(&self, subject: &str) -> Option<Arc<SearchNode>> {
        self.searches.get(subject).map(|entry| entry.value().clone())
    }

    pub fn lookup_by_hash(&self, hash: u64) -> Option<Arc<SearchNode>> {
        self.search_hashes.get(&hash).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, query: &str, index_locators: &str) -> bool {
        self.lookup(query, index_locators).is_some()
    }

    /// Every live search, ordered by subject.
    pub fn list_all(&self) -> Vec<Arc<SearchNode>> {
        let mut all: Vec<Arc<SearchNode>> = self
            .searches
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.subject().cmp(b.subject()));
        all
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    /// Drops every live search. Used at shutdown.
    pub fn clear(&self) {
        let count = self.searches.len();
        self.searches.clear();
        self.search_hashes.clear();
        tracing::info!("Cleared {} live search(es)", count);
    }
}

/// Hash under which a raw query and locator string would be registered.
pub fn search_hash(query: &str, index_locators: &str) -> u64 {
    subject_hash(&make_subject(
        &normalize_query(query),
        &join_locators(&split_locators(index_locators)),
    ))
}
