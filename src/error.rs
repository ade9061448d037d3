//! Error types shared by the index and search layers.

/// Failures surfaced by query parsing and by asynchronous lookups.
///
/// `Clone` so a node can cache a failed outcome and hand the same error to
/// every caller that asks for its result afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The query or the locator list could not be turned into a search tree.
    #[error("invalid search: {0}")]
    Parse(String),

    /// No backend is known for the given index locator.
    #[error("unknown index: {0}")]
    UnknownIndex(String),

    /// A lookup failed somewhere below the node reporting it.
    #[error("search aborted ({subject}): {reason}")]
    Abort { subject: String, reason: String },
}

impl SearchError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn abort(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Abort {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// True for failures reported synchronously while building a search tree.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnknownIndex(_))
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
