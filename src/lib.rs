//! Composite Search Library
//!
//! Asynchronous boolean full-text search over pluggable term indexes.
//! The binary (`main.rs`) wraps it in an HTTP node.
//!
//! ## Modules
//! - **`index`**: The term-index layer: the `IndexBackend` trait, asynchronous
//!   lookup handles, an in-memory positional index, a remote HTTP index
//!   client and the catalog that resolves index locators.
//! - **`search`**: Query parsing, the per-node search state machine, result
//!   combination, progress aggregation and the registry deduplicating live
//!   searches.
//! - **`server`**: The HTTP router tying both together.
//! - **`config`**: Command-line / environment configuration of a node.
//! - **`error`**: Errors shared by all of the above.

pub mod config;
pub mod error;
pub mod index;
pub mod search;
pub mod server;

pub use error::SearchError;
pub use index::IndexBackend;
pub use search::node::SearchNode;
pub use search::registry::SearchRegistry;
