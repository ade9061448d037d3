//! Search Service Module
//!
//! Resolves boolean full-text queries against one or more term indexes,
//! asynchronously, combining partial results with set algebra.
//!
//! ## Overview
//! A query is parsed into a tree of [`node::SearchNode`]s. Leaves are single
//! term lookups dispatched to an index backend as soon as they are built;
//! composites combine their children's results once every lookup below them
//! has completed. Callers poll status and progress, then take the result
//! exactly once. Identical queries started while one is still live share the
//! same tree through the [`registry::SearchRegistry`].
//!
//! ## Query language
//! - `cat`: a single term.
//! - `"big cat"`: the words next to each other, in order (phrase).
//! - `cat dog`: both terms (intersection).
//! - `cat or dog`: either term (union).
//! - `cat not dog`, `cat -dog`: the first without the second (difference).
//! - Several index locators (`idxA idxB` or `idxA;idxB`) run the whole query
//!   on every index and merge the per-index results.
//!
//! ## Submodules
//! - **`lexer`**: Query text to connective-explicit token stream.
//! - **`parser`**: Token stream to search tree.
//! - **`node`**: The per-node state machine.
//! - **`combiner`**: Set algebra over child results.
//! - **`progress`**: Progress reporting and aggregation.
//! - **`registry`**: Deduplication of live searches.
//! - **`handlers`** / **`protocol`**: HTTP API for the node binary.
//! - **`types`**: Operation, status and progress value types.

pub mod combiner;
pub mod handlers;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod progress;
pub mod protocol;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;
