//! Asynchronous lookup handles.
//!
//! A [`Request`] is what an index backend hands back for a term or uri lookup.
//! It never blocks: callers poll [`Request::is_done`] / [`Request::parts`] or
//! await [`Request::wait`], while the matching [`Responder`] is driven by
//! whatever actually performs the lookup.

use crate::error::{Result, SearchError};
use crate::search::types::ProgressParts;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
enum Outcome<T> {
    Pending,
    Complete(Arc<T>),
    Aborted(String),
}

#[derive(Debug)]
struct RequestState<T> {
    parts: ProgressParts,
    outcome: Outcome<T>,
}

/// Read side of a lookup. Cheap to clone; all clones observe the same outcome.
pub struct Request<T> {
    subject: String,
    state: watch::Receiver<RequestState<T>>,
}

/// Write side of a lookup. Dropping it before completion aborts the request.
pub struct Responder<T> {
    subject: String,
    state: watch::Sender<RequestState<T>>,
}

impl<T> Request<T> {
    /// Creates an unresolved request together with the handle that resolves it.
    pub fn pending(subject: &str) -> (Self, Responder<T>) {
        let (tx, rx) = watch::channel(RequestState {
            parts: ProgressParts::single_pending(),
            outcome: Outcome::Pending,
        });
        (
            Self {
                subject: subject.to_string(),
                state: rx,
            },
            Responder {
                subject: subject.to_string(),
                state: tx,
            },
        )
    }

    /// Creates a request that is already complete.
    pub fn ready(subject: &str, value: T) -> Self {
        let (request, responder) = Self::pending(subject);
        responder.complete(value);
        request
    }

    /// Runs `lookup` on the current tokio runtime and resolves the request with
    /// its output. Without a runtime the request is aborted straight away.
    pub fn spawn<F>(subject: &str, lookup: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let (request, responder) = Self::pending(subject);
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Lookup for '{}' started outside a runtime: {}", subject, e);
                responder.abort(format!("no async runtime: {}", e));
                return request;
            }
        };
        runtime.spawn(async move {
            match lookup.await {
                Ok(value) => responder.complete(value),
                Err(e) => {
                    tracing::warn!("Lookup for '{}' failed: {}", responder.subject, e);
                    responder.abort(e.to_string());
                }
            }
        });
        request
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `Ok(true)` once the lookup completed, the abort if it failed.
    pub fn is_done(&self) -> Result<bool> {
        match &self.state.borrow().outcome {
            Outcome::Pending => Ok(false),
            Outcome::Complete(_) => Ok(true),
            Outcome::Aborted(reason) => Err(SearchError::abort(&self.subject, reason)),
        }
    }

    /// The looked-up value, or `None` while still pending.
    pub fn result(&self) -> Result<Option<Arc<T>>> {
        match &self.state.borrow().outcome {
            Outcome::Pending => Ok(None),
            Outcome::Complete(value) => Ok(Some(value.clone())),
            Outcome::Aborted(reason) => Err(SearchError::abort(&self.subject, reason)),
        }
    }

    pub fn parts(&self) -> Result<ProgressParts> {
        let state = self.state.borrow();
        match &state.outcome {
            Outcome::Aborted(reason) => Err(SearchError::abort(&self.subject, reason)),
            _ => Ok(state.parts),
        }
    }

    /// Waits until the lookup either completes or aborts.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.state.clone();
        rx.wait_for(|state| !matches!(state.outcome, Outcome::Pending))
            .await
            .map_err(|_| SearchError::abort(&self.subject, "lookup dropped before completing"))?;
        self.is_done().map(|_| ())
    }
}

impl<T> Clone for Request<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state.borrow().outcome {
            Outcome::Pending => "pending",
            Outcome::Complete(_) => "complete",
            Outcome::Aborted(_) => "aborted",
        };
        f.debug_struct("Request")
            .field("subject", &self.subject)
            .field("state", &state)
            .finish()
    }
}

impl<T> Responder<T> {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Publishes intermediate progress. Ignored once the request has resolved.
    pub fn report(&self, parts: ProgressParts) {
        self.state.send_modify(|state| {
            if matches!(state.outcome, Outcome::Pending) {
                state.parts = parts;
            }
        });
    }

    pub fn complete(self, value: T) {
        self.state.send_modify(|state| {
            state.parts = ProgressParts::new(state.parts.total, state.parts.total, true);
            state.outcome = Outcome::Complete(Arc::new(value));
        });
    }

    pub fn abort(self, reason: impl Into<String>) {
        let reason = reason.into();
        self.state.send_modify(|state| {
            state.outcome = Outcome::Aborted(reason);
        });
    }
}

impl<T> Drop for Responder<T> {
    fn drop(&mut self) {
        self.state.send_modify(|state| {
            if matches!(state.outcome, Outcome::Pending) {
                state.outcome = Outcome::Aborted("lookup dropped before completing".to_string());
            }
        });
    }
}
