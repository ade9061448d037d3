//! Index Backend Module
//!
//! The term-index layer the search engine runs against. Searches never touch
//! storage directly: they ask an [`IndexBackend`] for the entries of one term
//! (or the metadata of one document) and get back a [`request::Request`]
//! that resolves asynchronously.
//!
//! ## Submodules
//! - **`request`**: The asynchronous lookup handle and its completion side.
//! - **`memory`**: An in-process positional inverted index.
//! - **`remote`**: A client for an index served by another node over HTTP.
//! - **`catalog`**: Resolves index locators to backends.
//! - **`tokenizer`** / **`ingest`**: Document text processing and bulk loading.
//! - **`handlers`** / **`protocol`**: HTTP endpoints exposing local indexes.
//! - **`types`**: Entry records exchanged with backends.

pub mod catalog;
pub mod handlers;
pub mod ingest;
pub mod memory;
pub mod protocol;
pub mod remote;
pub mod request;
pub mod tokenizer;
pub mod types;


use request::Request;
use types::{TermEntry, UriEntry};

/// Resolves a single term or a single document against one index.
///
/// Both lookups return immediately; retries and transport concerns belong to
/// the implementation, not to callers.
pub trait IndexBackend: Send + Sync {
    /// The locator this backend was resolved from.
    fn locator(&self) -> &str;

    fn term_entries(&self, term: &str) -> Request<Vec<TermEntry>>;

    fn uri_entry(&self, uri: &str) -> Request<Option<UriEntry>>;
}
