use super::combiner::ResultSet;
use super::node::SearchNode;
use super::parser::split_locators;
use super::protocol::*;
use super::registry::SearchRegistry;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

/// Status string for a node, `"Error"` once a lookup below it aborted.
fn status_of(node: &SearchNode) -> (String, Option<String>) {
    match node.is_done() {
        Err(e) => (STATUS_ERROR.to_string(), Some(e.to_string())),
        Ok(_) => (node.status().to_string(), None),
    }
}

pub async fn handle_start_search(
    Extension(registry): Extension<Arc<SearchRegistry>>,
    Json(req): Json<StartSearchRequest>,
) -> (StatusCode, Json<StartSearchResponse>) {
    match registry.start_search(&req.query, &req.indexes) {
        Ok(node) => {
            let (status, error) = status_of(&node);
            (
                StatusCode::OK,
                Json(StartSearchResponse {
                    subject: node.subject().to_string(),
                    hash: Some(node.hash_code()),
                    operation: Some(node.operation()),
                    status,
                    error,
                }),
            )
        }
        Err(e) => {
            tracing::info!("Rejected search '{}' in '{}': {}", req.query, req.indexes, e);
            (
                StatusCode::BAD_REQUEST,
                Json(StartSearchResponse {
                    subject: format!("{}@{}", req.query, req.indexes),
                    hash: None,
                    operation: None,
                    status: STATUS_ERROR.to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_search_status(
    Extension(registry): Extension<Arc<SearchRegistry>>,
    Path(hash): Path<u64>,
) -> (StatusCode, Json<Option<SearchStatusResponse>>) {
    let Some(node) = registry.lookup_by_hash(hash) else {
        tracing::debug!("Search not found: {}", hash);
        return (StatusCode::NOT_FOUND, Json(None));
    };

    let (status, error) = status_of(&node);
    let sub_progress = node
        .sub_progress()
        .iter()
        .map(|progress| SubProgressItem {
            subject: progress.subject().to_string(),
            status: status_of(progress).0,
            parts: progress.parts().ok(),
        })
        .collect();

    (
        StatusCode::OK,
        Json(Some(SearchStatusResponse {
            subject: node.subject().to_string(),
            hash,
            status,
            parts: node.parts().ok(),
            sub_progress,
            error,
        })),
    )
}

/// Collects the result of a finished search. Taking the result retires the
/// search: afterwards its hash is no longer known.
pub async fn handle_search_result(
    Extension(registry): Extension<Arc<SearchRegistry>>,
    Path(hash): Path<u64>,
    Query(params): Query<ResultParams>,
) -> (StatusCode, Json<Option<SearchResultResponse>>) {
    let Some(node) = registry.lookup_by_hash(hash) else {
        return (StatusCode::NOT_FOUND, Json(None));
    };

    if params.wait.unwrap_or(false)
        && let Err(e) = node.wait().await
    {
        tracing::debug!("Search {} finished with an abort: {}", node.subject(), e);
    }

    let empty = |status: String, error: Option<String>| SearchResultResponse {
        subject: node.subject().to_string(),
        status,
        total_count: 0,
        count: 0,
        results: Vec::new(),
        error,
    };

    match node.result() {
        Ok(None) => (
            StatusCode::ACCEPTED,
            Json(Some(empty(node.status().to_string(), None))),
        ),
        Err(e) => {
            tracing::warn!("Search {} aborted: {}", node.subject(), e);
            (
                StatusCode::BAD_GATEWAY,
                Json(Some(empty(STATUS_ERROR.to_string(), Some(e.to_string())))),
            )
        }
        Ok(Some(set)) => {
            let limit = params.limit.unwrap_or(10);
            let offset = params.offset.unwrap_or(0);
            let results = hydrate(&registry, &node, &set, offset, limit).await;

            (
                StatusCode::OK,
                Json(Some(SearchResultResponse {
                    subject: node.subject().to_string(),
                    status: node.status().to_string(),
                    total_count: set.len(),
                    count: results.len(),
                    results,
                    error: None,
                })),
            )
        }
    }
}

/// Attaches document metadata to one page of results, asking each index the
/// search ran against in turn.
async fn hydrate(
    registry: &SearchRegistry,
    node: &SearchNode,
    set: &ResultSet,
    offset: usize,
    limit: usize,
) -> Vec<SearchResultItem> {
    let backends: Vec<_> = split_locators(node.index_locators())
        .iter()
        .filter_map(|locator| registry.catalog().resolve(locator).ok())
        .collect();

    let mut results = Vec::new();
    for entry in set.iter().skip(offset).take(limit) {
        let mut item = SearchResultItem {
            uri: entry.uri.clone(),
            title: None,
            word_count: None,
            positions: entry.positions.iter().copied().collect(),
        };

        for backend in &backends {
            let request = backend.uri_entry(&entry.uri);
            if let Err(e) = request.wait().await {
                tracing::warn!("Metadata lookup for {} failed: {}", entry.uri, e);
                continue;
            }
            if let Ok(Some(meta)) = request.result()
                && let Some(meta) = &*meta
            {
                item.title = meta.title.clone();
                item.word_count = Some(meta.word_count);
                break;
            }
        }
        results.push(item);
    }
    results
}

pub async fn handle_list_searches(
    Extension(registry): Extension<Arc<SearchRegistry>>,
) -> Json<SearchListResponse> {
    let searches: Vec<SearchSummary> = registry
        .list_all()
        .iter()
        .map(|node| SearchSummary {
            subject: node.subject().to_string(),
            hash: node.hash_code(),
            operation: node.operation(),
            status: status_of(node).0,
        })
        .collect();

    Json(SearchListResponse {
        count: searches.len(),
        searches,
    })
}
