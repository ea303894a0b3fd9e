//! Mark-down endpoint.
//!
//! Lets an operator or orchestrator begin a graceful drain over HTTP. The
//! route lives on the probe surface next to the health and ready paths.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::on,
    Router,
};

use crate::config::{markdown_method_filter, MarkdownConfig};
use crate::lifecycle::{ShutdownCause, ShutdownHandle};

async fn mark_down(State(handle): State<ShutdownHandle>) -> Response {
    if handle.trigger(Some(ShutdownCause::MarkedDown)) {
        tracing::info!("Marked down over HTTP");
    }
    (StatusCode::OK, "Marked down").into_response()
}

/// Route for the configured mark-down path and method.
///
/// Returns `None` when the method cannot be routed; validation rejects such
/// configs before `open()` succeeds.
pub fn markdown_router(config: &MarkdownConfig, handle: ShutdownHandle) -> Option<Router> {
    let filter = markdown_method_filter(&config.method)?;
    Some(
        Router::new()
            .route(&config.path, on(filter, mark_down))
            .with_state(handle),
    )
}
