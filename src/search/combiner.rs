//! Result combination.
//!
//! A node's result is computed from the completed results of its children,
//! in child order, according to its [`Operation`]. Every result set is keyed
//! by document uri, one entry per document.

use super::types::Operation;
use crate::error::Result;
use crate::index::types::TermEntry;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The documents matched by one search node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResultSet {
    pub subject: String,
    entries: BTreeMap<String, TermEntry>,
}

impl ResultSet {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Builds a set from raw backend entries; entries for the same uri are merged.
    pub fn from_entries(subject: &str, entries: impl IntoIterator<Item = TermEntry>) -> Self {
        let mut set = Self::new(subject);
        for entry in entries {
            set.merge(entry);
        }
        set
    }

    fn merge(&mut self, entry: TermEntry) {
        match self.entries.get_mut(&entry.uri) {
            Some(existing) => existing.positions.extend(entry.positions),
            None => {
                self.entries.insert(entry.uri.clone(), entry);
            }
        }
    }

    fn insert_combined(&mut self, uri: &str, positions: BTreeSet<u32>) {
        let entry = TermEntry {
            subject: self.subject.clone(),
            uri: uri.to_string(),
            positions,
        };
        self.entries.insert(uri.to_string(), entry);
    }

    pub fn get(&self, uri: &str) -> Option<&TermEntry> {
        self.entries.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    /// Matching document uris in sorted order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Combines completed child results under `operation`.
///
/// The first aborted child short-circuits with its abort; nothing partial is
/// ever produced. Child counts are checked when nodes are built, so a wrong
/// count here is a bug and panics.
pub fn combine<I>(operation: Operation, subject: &str, child_results: I) -> Result<ResultSet>
where
    I: IntoIterator<Item = Result<Arc<ResultSet>>>,
{
    let children = child_results.into_iter().collect::<Result<Vec<_>>>()?;

    let combined = match operation {
        Operation::Term => {
            assert_eq!(children.len(), 1, "Term combines exactly one backend result");
            let mut set = children[0].as_ref().clone();
            set.subject = subject.to_string();
            set
        }
        Operation::Phrase => {
            assert!(children.len() >= 2, "Phrase needs at least two words");
            phrase(subject, &children)
        }
        Operation::Intersection => {
            assert!(children.len() >= 2, "Intersection needs at least two operands");
            intersection(subject, &children)
        }
        Operation::Union | Operation::MultiIndexMerge => {
            assert!(children.len() >= 2, "{} needs at least two operands", operation);
            union(subject, &children)
        }
        Operation::Difference => {
            assert_eq!(children.len(), 2, "Difference needs exactly two operands");
            difference(subject, &children[0], &children[1])
        }
    };

    tracing::debug!(
        "Combined {} child result(s) with {} into {} document(s) for {}",
        children.len(),
        operation,
        combined.len(),
        subject
    );
    Ok(combined)
}

fn union(subject: &str, children: &[Arc<ResultSet>]) -> ResultSet {
    let mut set = ResultSet::new(subject);
    for child in children {
        for entry in child.iter() {
            let mut positions = entry.positions.clone();
            if let Some(existing) = set.get(&entry.uri) {
                positions.extend(existing.positions.iter().copied());
            }
            set.insert_combined(&entry.uri, positions);
        }
    }
    set
}

fn intersection(subject: &str, children: &[Arc<ResultSet>]) -> ResultSet {
    let mut set = ResultSet::new(subject);
    let (first, rest) = children.split_first().expect("intersection of no children");
    for entry in first.iter() {
        if !rest.iter().all(|child| child.contains(&entry.uri)) {
            continue;
        }
        let mut positions = entry.positions.clone();
        for child in rest {
            if let Some(other) = child.get(&entry.uri) {
                positions.extend(other.positions.iter().copied());
            }
        }
        set.insert_combined(&entry.uri, positions);
    }
    set
}

fn difference(subject: &str, minuend: &ResultSet, subtrahend: &ResultSet) -> ResultSet {
    let mut set = ResultSet::new(subject);
    for entry in minuend.iter() {
        if !subtrahend.contains(&entry.uri) {
            set.insert_combined(&entry.uri, entry.positions.clone());
        }
    }
    set
}

/// Keeps documents where the i-th word occurs at `start + i` for some `start`;
/// the surviving positions are those phrase starts.
fn phrase(subject: &str, children: &[Arc<ResultSet>]) -> ResultSet {
    let mut set = ResultSet::new(subject);
    let (first, rest) = children.split_first().expect("phrase of no words");

    for entry in first.iter() {
        let followers: Option<Vec<&TermEntry>> =
            rest.iter().map(|child| child.get(&entry.uri)).collect();
        let Some(followers) = followers else {
            continue;
        };

        let starts: BTreeSet<u32> = entry
            .positions
            .iter()
            .copied()
            .filter(|&start| {
                followers.iter().enumerate().all(|(i, follower)| {
                    start
                        .checked_add(i as u32 + 1)
                        .is_some_and(|pos| follower.positions.contains(&pos))
                })
            })
            .collect();

        if !starts.is_empty() {
            set.insert_combined(&entry.uri, starts);
        }
    }
    set
}
