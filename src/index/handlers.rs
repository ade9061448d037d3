use super::catalog::IndexCatalog;
use super::protocol::*;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_add_document(
    Extension(catalog): Extension<Arc<IndexCatalog>>,
    Path(index): Path<String>,
    Json(req): Json<AddDocumentRequest>,
) -> (StatusCode, Json<Option<AddDocumentResponse>>) {
    if req.uri.trim().is_empty() {
        tracing::warn!("Rejected document without uri for index {}", index);
        return (StatusCode::BAD_REQUEST, Json(None));
    }

    let local = catalog.local_or_create(&index);
    let entry = local.add_document(req.uri.trim(), req.title.as_deref(), &req.text);

    (
        StatusCode::CREATED,
        Json(Some(AddDocumentResponse {
            index,
            entry,
            document_count: local.document_count(),
        })),
    )
}

pub async fn handle_get_terms_internal(
    Extension(catalog): Extension<Arc<IndexCatalog>>,
    Path((index, term)): Path<(String, String)>,
) -> (StatusCode, Json<TermEntriesResponse>) {
    let term = term.to_lowercase();
    match catalog.local(&index) {
        Some(local) => {
            let entries = local.lookup_terms(&term);
            tracing::debug!("Served {} entries for '{}' from {}", entries.len(), term, index);
            (StatusCode::OK, Json(TermEntriesResponse { term, entries }))
        }
        None => {
            tracing::debug!("Term lookup for unknown index {}", index);
            (
                StatusCode::NOT_FOUND,
                Json(TermEntriesResponse {
                    term,
                    entries: Vec::new(),
                }),
            )
        }
    }
}

pub async fn handle_get_uri_internal(
    Extension(catalog): Extension<Arc<IndexCatalog>>,
    Path(index): Path<String>,
    Query(params): Query<UriQuery>,
) -> (StatusCode, Json<UriEntryResponse>) {
    match catalog.local(&index) {
        Some(local) => (
            StatusCode::OK,
            Json(UriEntryResponse {
                entry: local.lookup_uri(&params.uri),
            }),
        ),
        None => (StatusCode::NOT_FOUND, Json(UriEntryResponse { entry: None })),
    }
}
