//! Search node state machine.
//!
//! A [`SearchNode`] is one node of a parsed query tree: either a leaf
//! wrapping a single backend term lookup, or a composite combining the
//! results of its children. Nodes move `Busy -> Ready -> Combining -> Done`
//! and never back. The result is combined at most once; every later caller
//! gets the same outcome.

use super::combiner::{ResultSet, combine};
use super::progress::{Progress, aggregate};
use super::registry::SearchRegistry;
use super::types::{Operation, ProgressParts, SearchStatus};
use crate::error::{Result, SearchError};
use crate::index::request::Request;
use crate::index::types::TermEntry;

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

pub type TermRequest = Request<Vec<TermEntry>>;

pub enum NodeKind {
    Leaf(TermRequest),
    Composite {
        operation: Operation,
        children: Vec<Arc<SearchNode>>,
    },
}

struct NodeState {
    status: SearchStatus,
    outcome: Option<Result<Arc<ResultSet>>>,
}

pub struct SearchNode {
    query: String,
    index_locators: String,
    subject: String,
    kind: NodeKind,
    state: Mutex<NodeState>,
    registry: Weak<SearchRegistry>,
}

/// Canonical identity of a search: `query@locators`.
pub fn make_subject(query: &str, index_locators: &str) -> String {
    format!("{}@{}", query, index_locators)
}

/// Hash of a canonical subject, used as the registry's secondary key.
pub fn subject_hash(subject: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    subject.hash(&mut hasher);
    hasher.finish()
}

impl SearchNode {
    pub(crate) fn leaf(
        query: &str,
        index_locator: &str,
        request: TermRequest,
        registry: Weak<SearchRegistry>,
    ) -> Arc<Self> {
        let node = Self::build(query, index_locator, NodeKind::Leaf(request), registry);
        tracing::debug!("Created {}", node);
        Arc::new(node)
    }

    pub(crate) fn composite(
        query: &str,
        index_locators: &str,
        operation: Operation,
        children: Vec<Arc<SearchNode>>,
        registry: Weak<SearchRegistry>,
    ) -> Result<Arc<Self>> {
        if operation == Operation::Term {
            return Err(SearchError::parse("Term nodes wrap a lookup, not children"));
        }
        operation
            .check_arity(children.len())
            .map_err(SearchError::Parse)?;

        let node = Self::build(
            query,
            index_locators,
            NodeKind::Composite {
                operation,
                children,
            },
            registry,
        );
        tracing::debug!("Created {}", node);
        Ok(Arc::new(node))
    }

    fn build(
        query: &str,
        index_locators: &str,
        kind: NodeKind,
        registry: Weak<SearchRegistry>,
    ) -> Self {
        Self {
            query: query.to_string(),
            index_locators: index_locators.to_string(),
            subject: make_subject(query, index_locators),
            kind,
            state: Mutex::new(NodeState {
                status: SearchStatus::Busy,
                outcome: None,
            }),
            registry,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn index_locators(&self) -> &str {
        &self.index_locators
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn hash_code(&self) -> u64 {
        subject_hash(&self.subject)
    }

    pub fn operation(&self) -> Operation {
        match &self.kind {
            NodeKind::Leaf(_) => Operation::Term,
            NodeKind::Composite { operation, .. } => *operation,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child nodes in order; empty for a leaf.
    pub fn children(&self) -> &[Arc<SearchNode>] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Composite { children, .. } => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// True once everything this node depends on has completed.
    ///
    /// Never blocks. An abort anywhere below is returned as the error.
    pub fn is_done(&self) -> Result<bool> {
        match &self.kind {
            NodeKind::Leaf(request) => request.is_done(),
            NodeKind::Composite { children, .. } => {
                for child in children {
                    if !child.is_done()? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// The progress providers this node reports on.
    ///
    /// A multi-index merge exposes its per-index children as they are.
    /// Every other composite lifts its composite children's sub-progress up
    /// one level, so the boolean structure of one query stays hidden. A leaf
    /// reports itself.
    pub fn sub_progress(self: &Arc<Self>) -> Vec<Arc<SearchNode>> {
        match &self.kind {
            NodeKind::Leaf(_) => vec![self.clone()],
            NodeKind::Composite {
                operation: Operation::MultiIndexMerge,
                children,
            } => children.clone(),
            NodeKind::Composite { children, .. } => Self::flatten(children),
        }
    }

    fn flatten(children: &[Arc<SearchNode>]) -> Vec<Arc<SearchNode>> {
        let mut progresses = Vec::with_capacity(children.len());
        for child in children {
            if child.is_leaf() {
                progresses.push(child.clone());
                continue;
            }
            let nested = child.sub_progress();
            if nested.is_empty() {
                progresses.push(child.clone());
            } else {
                progresses.extend(nested);
            }
        }
        progresses
    }

    /// Aggregated counters over [`SearchNode::sub_progress`].
    pub fn parts(&self) -> Result<ProgressParts> {
        match &self.kind {
            NodeKind::Leaf(request) => request.parts(),
            NodeKind::Composite {
                operation: Operation::MultiIndexMerge,
                children,
            } => aggregate(children.iter().map(|child| &**child)),
            NodeKind::Composite { children, .. } => {
                let progresses = Self::flatten(children);
                aggregate(progresses.iter().map(|child| &**child))
            }
        }
    }

    /// Current status. Promotes `Busy` to `Ready` when all children turn out
    /// to be done; an aborted child leaves the status where it was.
    pub fn status(&self) -> SearchStatus {
        let mut state = self.state.lock();
        if state.status < SearchStatus::Ready && matches!(self.is_done(), Ok(true)) {
            state.status = SearchStatus::Ready;
        }
        state.status
    }

    /// The combined result, or `None` while children are still running.
    ///
    /// The first call after completion combines the children and evicts this
    /// node from the registry. Concurrent callers wait for that call and then
    /// receive its outcome. An abort leaves the node in `Combining`.
    pub fn result(&self) -> Result<Option<Arc<ResultSet>>> {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.outcome {
            return outcome.clone().map(Some);
        }

        let ready = match self.is_done() {
            Ok(false) => return Ok(None),
            Ok(true) => Ok(()),
            Err(abort) => Err(abort),
        };

        state.status = SearchStatus::Combining;
        self.evict();

        let outcome = ready.and_then(|_| self.combine()).map(Arc::new);
        match &outcome {
            Ok(set) => {
                state.status = SearchStatus::Done;
                tracing::debug!("Search {} done with {} result(s)", self.subject, set.len());
            }
            Err(e) => {
                tracing::warn!("Search {} failed: {}", self.subject, e);
            }
        }
        state.outcome = Some(outcome.clone());
        outcome.map(Some)
    }

    fn combine(&self) -> Result<ResultSet> {
        match &self.kind {
            NodeKind::Leaf(request) => {
                let entries = completed(request.result()?, &self.subject);
                let set = ResultSet::from_entries(&self.subject, entries.iter().cloned());
                combine(Operation::Term, &self.subject, [Ok(Arc::new(set))])
            }
            NodeKind::Composite {
                operation,
                children,
            } => combine(
                *operation,
                &self.subject,
                children
                    .iter()
                    .map(|child| child.result().map(|set| completed(set, child.subject()))),
            ),
        }
    }

    fn evict(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self);
        }
    }

    /// Waits until every lookup below this node has completed or aborted.
    pub async fn wait(&self) -> Result<()> {
        for request in self.leaves() {
            request.wait().await?;
        }
        Ok(())
    }

    fn leaves(&self) -> Vec<TermRequest> {
        let mut leaves = Vec::new();
        let mut stack: Vec<&SearchNode> = vec![self];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(request) => leaves.push(request.clone()),
                NodeKind::Composite { children, .. } => {
                    stack.extend(children.iter().rev().map(|child| &**child));
                }
            }
        }
        leaves
    }
}

/// Unwraps the result of something that already reported done.
fn completed<T>(value: Option<T>, subject: &str) -> T {
    match value {
        Some(value) => value,
        None => panic!("{} reported done but has no result", subject),
    }
}

impl Progress for SearchNode {
    fn subject(&self) -> String {
        self.subject.clone()
    }

    fn parts(&self) -> Result<ProgressParts> {
        SearchNode::parts(self)
    }
}

impl fmt::Display for SearchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<&str> = self.children().iter().map(|c| c.subject()).collect();
        write!(
            f,
            "Search: {} : {} : {:?}",
            self.operation(),
            self.subject,
            children
        )
    }
}

impl fmt::Debug for SearchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchNode")
            .field("operation", &self.operation())
            .field("subject", &self.subject)
            .field("children", &self.children())
            .finish()
    }
}
