//! Request gate.
//! Admits primary-surface requests only while the scaffold is listening.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::lifecycle::DrainCoordinator;

/// Wraps the delegate: 503 when not accepting, otherwise hold an in-flight
/// slot for the delegate's whole run.
///
/// The slot is a drop guard, so it is released even if the delegate
/// future is cancelled or unwinds. An abandoned drain cancels the delegate
/// and answers 503.
pub async fn request_gate(
    State(drain): State<Arc<DrainCoordinator>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let _slot = match drain.enter() {
        Ok(slot) => slot,
        Err(_) => return unavailable(),
    };

    tokio::select! {
        response = next.run(request) => response,
        () = drain.abandoned() => unavailable(),
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
}
