//! Index Network Protocol
//!
//! Endpoints and DTOs used to serve a node's local indexes to remote peers,
//! and to feed documents into them.

use super::types::{TermEntry, UriEntry};
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Internal endpoints serving a local index: `/{name}/terms/{term}` and `/{name}/uri`.
pub const ENDPOINT_INDEX_INTERNAL: &str = "/internal/index";

pub fn term_path(index: &str, term: &str) -> String {
    format!("{}/{}/terms/{}", ENDPOINT_INDEX_INTERNAL, index, term)
}

pub fn uri_path(index: &str) -> String {
    format!("{}/{}/uri", ENDPOINT_INDEX_INTERNAL, index)
}

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct TermEntriesResponse {
    pub term: String,
    pub entries: Vec<TermEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UriQuery {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UriEntryResponse {
    /// `None` when the index holds no such document.
    pub entry: Option<UriEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddDocumentRequest {
    pub uri: String,
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddDocumentResponse {
    pub index: String,
    pub entry: UriEntry,
    pub document_count: usize,
}
