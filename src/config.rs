//! Node configuration.
//!
//! Every option can be given as a flag or through the matching environment
//! variable; flags win.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "composite-search",
    about = "Boolean full-text search node over local and remote term indexes"
)]
pub struct NodeConfig {
    /// Address the HTTP API listens on.
    #[arg(long, env = "SEARCH_BIND", default_value = "127.0.0.1:6000")]
    pub bind: SocketAddr,

    /// Local index to create, as NAME=DIR; every *.txt file in DIR is loaded.
    #[arg(long = "index", env = "SEARCH_INDEXES", value_delimiter = ',')]
    pub indexes: Vec<IndexSpec>,

    /// Default log filter when RUST_LOG is not set.
    #[arg(long, env = "SEARCH_LOG", default_value = "info")]
    pub log_level: String,

    /// Per-attempt timeout for remote index lookups, in milliseconds.
    #[arg(long, env = "SEARCH_REMOTE_TIMEOUT_MS", default_value_t = 500)]
    pub remote_timeout_ms: u64,

    /// Attempts per remote index lookup before it aborts.
    #[arg(long, env = "SEARCH_REMOTE_ATTEMPTS", default_value_t = 3)]
    pub remote_attempts: usize,
}

impl NodeConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

/// A local index to load at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dir: PathBuf,
}

impl FromStr for IndexSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, dir) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=DIR, got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() || name.contains([' ', ';', '/']) {
            return Err(format!("invalid index name '{}'", name));
        }
        if dir.trim().is_empty() {
            return Err(format!("missing directory for index '{}'", name));
        }
        Ok(Self {
            name: name.to_string(),
            dir: PathBuf::from(dir.trim()),
        })
    }
}
