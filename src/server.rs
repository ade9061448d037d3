//! HTTP router of a search node.

use crate::index::catalog::IndexCatalog;
use crate::index::handlers::{handle_add_document, handle_get_terms_internal, handle_get_uri_internal};
use crate::search::handlers::{
    handle_list_searches, handle_search_result, handle_search_status, handle_start_search,
};
use crate::search::registry::SearchRegistry;

use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

pub fn build_router(catalog: Arc<IndexCatalog>, registry: Arc<SearchRegistry>) -> Router {
    Router::new()
        .route("/search", post(handle_start_search))
        .route("/search/:hash/status", get(handle_search_status))
        .route("/search/:hash/result", get(handle_search_result))
        .route("/searches", get(handle_list_searches))
        .route("/index/:name/documents", post(handle_add_document))
        .route(
            "/internal/index/:name/terms/:term",
            get(handle_get_terms_internal),
        )
        .route("/internal/index/:name/uri", get(handle_get_uri_internal))
        .layer(Extension(catalog))
        .layer(Extension(registry))
}
