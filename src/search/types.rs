use serde::{Deserialize, Serialize};
use std::fmt;

/// How a search node derives its result from its children.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Leaf: a single term looked up in one index.
    Term,
    /// Words that must appear consecutively in one document.
    Phrase,
    Intersection,
    Union,
    /// First child minus second child.
    Difference,
    /// The same query resolved against several indexes, merged.
    MultiIndexMerge,
}

impl Operation {
    /// Checks the child count this operation requires.
    pub fn check_arity(self, children: usize) -> Result<(), String> {
        let ok = match self {
            Operation::Term => children == 0,
            Operation::Difference => children == 2,
            Operation::Phrase
            | Operation::Intersection
            | Operation::Union
            | Operation::MultiIndexMerge => children >= 2,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("{} cannot be built from {} operand(s)", self, children))
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Term => "Term",
            Operation::Phrase => "Phrase",
            Operation::Intersection => "Intersection",
            Operation::Union => "Union",
            Operation::Difference => "Difference",
            Operation::MultiIndexMerge => "MultiIndexMerge",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a search node. Declaration order is the only allowed
/// direction of travel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchStatus {
    Unstarted,
    Busy,
    Ready,
    Combining,
    Done,
}

impl SearchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchStatus::Unstarted => "Unstarted",
            SearchStatus::Busy => "Busy",
            SearchStatus::Ready => "Ready",
            SearchStatus::Combining => "Combining",
            SearchStatus::Done => "Done",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion counters of one progress provider, or of several summed up.
///
/// When `total_final` is false, `total` is an estimate that may still grow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProgressParts {
    pub done: u32,
    pub total: u32,
    pub total_final: bool,
}

impl ProgressParts {
    pub fn new(done: u32, total: u32, total_final: bool) -> Self {
        Self {
            done,
            total,
            total_final,
        }
    }

    /// One part, not yet done, with a known total.
    pub fn single_pending() -> Self {
        Self::new(0, 1, true)
    }

    pub fn is_complete(&self) -> bool {
        self.total_final && self.done >= self.total
    }
}
