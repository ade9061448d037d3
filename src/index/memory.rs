use super::IndexBackend;
use super::request::Request;
use super::tokenizer::tokenize_positions;
use super::types::{TermEntry, UriEntry};

use dashmap::DashMap;

/// Positional inverted index held in process memory.
///
/// Structure: `term -> uri -> TermEntry`, plus `uri -> UriEntry` for document
/// metadata. Lookups resolve immediately, on any thread, but hand back the
/// same asynchronous handle a remote index would.
pub struct MemoryIndex {
    locator: String,
    terms: DashMap<String, DashMap<String, TermEntry>>,
    documents: DashMap<String, UriEntry>,
}

impl MemoryIndex {
    pub fn new(locator: &str) -> Self {
        Self {
            locator: locator.to_string(),
            terms: DashMap::new(),
            documents: DashMap::new(),
        }
    }

    /// Indexes `text` under `uri`, replacing any earlier version of the document.
    pub fn add_document(&self, uri: &str, title: Option<&str>, text: &str) -> UriEntry {
        if self.documents.contains_key(uri) {
            self.remove_postings(uri);
        }

        let positions = tokenize_positions(text);
        let word_count = positions.values().map(Vec::len).sum();
        let unique_words = positions.len();

        for (word, offsets) in positions {
            let entry = TermEntry::new(&word, uri, offsets);
            self.terms
                .entry(word)
                .or_insert_with(DashMap::new)
                .insert(uri.to_string(), entry);
        }

        let meta = UriEntry {
            uri: uri.to_string(),
            title: title.map(str::to_string),
            word_count,
            unique_words,
        };
        self.documents.insert(uri.to_string(), meta.clone());

        tracing::debug!(
            "Indexed {} in '{}' ({} words, {} unique)",
            uri,
            self.locator,
            word_count,
            unique_words
        );
        meta
    }

    pub fn remove_document(&self, uri: &str) -> bool {
        if self.documents.remove(uri).is_none() {
            return false;
        }
        self.remove_postings(uri);
        true
    }

    fn remove_postings(&self, uri: &str) {
        for postings in self.terms.iter() {
            postings.value().remove(uri);
        }
        self.terms.retain(|_, postings| !postings.is_empty());
    }

    /// Entries for `term`, ordered by uri.
    pub fn lookup_terms(&self, term: &str) -> Vec<TermEntry> {
        lookup(&self.terms, term)
    }

    pub fn lookup_uri(&self, uri: &str) -> Option<UriEntry> {
        self.documents.get(uri).map(|entry| entry.value().clone())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

fn lookup(terms: &DashMap<String, DashMap<String, TermEntry>>, term: &str) -> Vec<TermEntry> {
    let mut entries: Vec<TermEntry> = terms
        .get(term)
        .map(|postings| {
            postings
                .iter()
                .map(|entry| entry.value().clone())
                .collect()
        })
        .unwrap_or_default();
    entries.sort_by(|a, b| a.uri.cmp(&b.uri));
    entries
}

impl IndexBackend for MemoryIndex {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn term_entries(&self, term: &str) -> Request<Vec<TermEntry>> {
        Request::ready(term, self.lookup_terms(term))
    }

    fn uri_entry(&self, uri: &str) -> Request<Option<UriEntry>> {
        Request::ready(uri, self.lookup_uri(uri))
    }
}
