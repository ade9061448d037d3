//! Remote Index Client
//!
//! Fetches term and document entries from an index served by another node
//! (see [`super::handlers`]). Transport failures are retried here with
//! exponential back-off and jitter; whatever still fails resolves the
//! request as aborted.

use super::IndexBackend;
use super::protocol::{TermEntriesResponse, UriEntryResponse, term_path, uri_path};
use super::request::Request;
use super::types::{TermEntry, UriEntry};
use crate::error::SearchError;

use anyhow::Result;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_ATTEMPTS: usize = 3;

#[derive(Clone)]
struct RemoteClient {
    http_client: reqwest::Client,
    timeout: Duration,
    attempts: usize,
}

impl RemoteClient {
    async fn get_with_retry(&self, url: reqwest::Url) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..self.attempts {
            let response = self
                .http_client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    tracing::debug!("GET {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

/// An index living on another node, addressed as `http://host:port/<index name>`.
pub struct RemoteIndex {
    locator: String,
    base_url: reqwest::Url,
    index_name: String,
    client: RemoteClient,
}

impl RemoteIndex {
    pub fn new(locator: &str, timeout: Duration, attempts: usize) -> Result<Self, SearchError> {
        let url = reqwest::Url::parse(locator)
            .map_err(|e| SearchError::UnknownIndex(format!("{}: {}", locator, e)))?;
        let index_name = url.path().trim_matches('/').to_string();
        if index_name.is_empty() || index_name.contains('/') {
            return Err(SearchError::UnknownIndex(format!(
                "{}: expected http://host:port/<index>",
                locator
            )));
        }
        let base_url = reqwest::Url::parse(&url.origin().ascii_serialization())
            .map_err(|e| SearchError::UnknownIndex(format!("{}: {}", locator, e)))?;

        Ok(Self {
            locator: locator.to_string(),
            base_url,
            index_name,
            client: RemoteClient {
                http_client: reqwest::Client::new(),
                timeout,
                attempts: attempts.max(1),
            },
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl IndexBackend for RemoteIndex {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn term_entries(&self, term: &str) -> Request<Vec<TermEntry>> {
        let client = self.client.clone();
        let url = self.endpoint(&term_path(&self.index_name, term));

        Request::spawn(term, async move {
            let response = client.get_with_retry(url?).await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(anyhow::anyhow!("Remote index not found"));
            }
            if !response.status().is_success() {
                return Err(anyhow::anyhow!("Term lookup failed {}", response.status()));
            }
            let body: TermEntriesResponse = response.json().await?;
            Ok(body.entries)
        })
    }

    fn uri_entry(&self, uri: &str) -> Request<Option<UriEntry>> {
        let client = self.client.clone();
        let url = self
            .endpoint(&uri_path(&self.index_name))
            .and_then(|base| Ok(reqwest::Url::parse_with_params(base.as_str(), &[("uri", uri)])?));

        Request::spawn(uri, async move {
            let response = client.get_with_retry(url?).await?;
            if !response.status().is_success() {
                return Err(anyhow::anyhow!("Uri lookup failed {}", response.status()));
            }
            let body: UriEntryResponse = response.json().await?;
            Ok(body.entry)
        })
    }
}
