// src/http/error.rs
//
// =============================================================================
// RENDER-MANAGER: HTTP ERROR TAXONOMY (v 0.1)
// =============================================================================
//
// A small `thiserror` enum at the API boundary, grounded on the
// `handler/error/http_error.rs` pattern from the server stack this crate
// borrows axum from: one enum per status-code family, `IntoResponse`
// implemented once, handlers return `Result<Json<T>, HttpError>` and `?`
// does the rest. Scaled down from that pattern's builder API since this
// API only ever needs three statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            HttpError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            HttpError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
