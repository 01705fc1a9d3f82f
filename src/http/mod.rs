// src/http/mod.rs
//
// =============================================================================
// RENDER-MANAGER: DISPATCH API (v 0.1)
// =============================================================================
//
// Routes wired with axum/tower, borrowed wholesale from the HTTP stack of
// the server in the enrichment pack since the teacher itself has no web
// layer. CORS is wide open (`Access-Control-Allow-Origin: *`) to match the
// original single-box deployment, where worker and dashboard clients could
// be served from anywhere on the local network.

pub mod dashboard;
pub mod error;
pub mod handlers;

use crate::state::SharedState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde_json::json;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// A panicking handler is the only "exception" this API can raise - every
/// other failure path already returns a `Result`/`HttpError`. Caught here so
/// a single bad request degrades to a 500 instead of dropping the
/// connection, per the "handler exceptions are caught and reported as 500"
/// error-handling policy.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    log::error!("handler panicked: {message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::index))
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/job", get(handlers::get_job))
        .route("/set_job", post(handlers::set_job))
        .route("/history", get(handlers::history))
        .route("/logs", get(handlers::logs))
        .route("/alerts", get(handlers::alerts))
        .route("/queue", get(handlers::queue))
        .route("/preview", get(handlers::preview_list))
        .route("/preview/:filename", get(handlers::preview_file))
        .route("/preview_history", get(handlers::preview_history))
        .route("/worker_config", get(handlers::worker_config))
        .route("/report_error", post(handlers::report_error))
        .route("/open-browser", post(handlers::open_browser))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
