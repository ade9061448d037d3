//! Search API Protocol
//!
//! Endpoints and DTOs of the public search API: start a search, poll its
//! progress, collect its result.

use super::types::{Operation, ProgressParts};
use serde::{Deserialize, Serialize};

/// Status string reported when a lookup below the search aborted.
pub const STATUS_ERROR: &str = "Error";

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSearchRequest {
    pub query: String,
    /// One or more index locators separated by spaces or semicolons.
    pub indexes: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSearchResponse {
    pub subject: String,
    pub hash: Option<u64>,
    pub operation: Option<Operation>,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubProgressItem {
    pub subject: String,
    pub status: String,
    pub parts: Option<ProgressParts>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchStatusResponse {
    pub subject: String,
    pub hash: u64,
    pub status: String,
    pub parts: Option<ProgressParts>,
    pub sub_progress: Vec<SubProgressItem>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Wait for outstanding lookups instead of answering 202 straight away.
    pub wait: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub uri: String,
    pub title: Option<String>,
    pub word_count: Option<usize>,
    pub positions: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultResponse {
    pub subject: String,
    pub status: String,
    pub total_count: usize,
    pub count: usize,
    pub results: Vec<SearchResultItem>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchSummary {
    pub subject: String,
    pub hash: u64,
    pub operation: Operation,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    pub count: usize,
    pub searches: Vec<SearchSummary>,
}
