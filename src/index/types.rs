use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One match record: a term (or a combined sub-query) occurring in one document.
///
/// `positions` are word offsets inside the document, which is what phrase
/// adjacency checks run on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermEntry {
    pub subject: String,
    pub uri: String,
    #[serde(default)]
    pub positions: BTreeSet<u32>,
}

impl TermEntry {
    pub fn new(subject: &str, uri: &str, positions: impl IntoIterator<Item = u32>) -> Self {
        Self {
            subject: subject.to_string(),
            uri: uri.to_string(),
            positions: positions.into_iter().collect(),
        }
    }
}

/// Metadata describing one indexed document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UriEntry {
    pub uri: String,
    pub title: Option<String>,
    pub word_count: usize,
    pub unique_words: usize,
}
