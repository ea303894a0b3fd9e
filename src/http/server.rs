//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the primary router: probe routes first, gated delegate as fallback
//! - Assemble the management router: probe routes only, 404 for anything else
//! - Wire up middleware (tracing, request ID, panic capture)
//! - Run each bound surface until the scaffold stops

use std::sync::Arc;

use axum::{middleware, Router};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::middleware::request_gate;
use crate::lifecycle::{DrainCoordinator, ShutdownCause, ShutdownHandle};
use crate::net::BoundListener;

/// Primary surface router.
///
/// When `control` is present (no separate management surface) its exact
/// paths take precedence over the delegate and are not gated.
pub fn primary_router(
    delegate: Router,
    drain: Arc<DrainCoordinator>,
    control: Option<Router>,
) -> Router {
    let gated = delegate
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(drain, request_gate));

    let app = match control {
        Some(control) => control.fallback_service(gated),
        None => gated,
    };

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Management surface router. Unknown paths fall through to axum's 404.
pub fn management_router(control: Router) -> Router {
    control.layer(TraceLayer::new_for_http())
}

/// Serve `app` on `listener` until the scaffold reaches `Stopped`.
///
/// A server failure begins draining with [`ShutdownCause::ServeFailed`] so
/// `listen()` still returns exactly once.
pub fn spawn_server(
    listener: BoundListener,
    app: Router,
    handle: ShutdownHandle,
) -> JoinHandle<()> {
    let surface = listener.surface();
    let address = listener.address().clone();

    tokio::spawn(async move {
        tracing::info!(surface = %surface, address = %address, "HTTP server starting");

        let stopped = handle.clone();
        let result = axum::serve(listener.into_inner(), app)
            .with_graceful_shutdown(async move { stopped.stopped().await })
            .await;

        match result {
            Ok(()) => tracing::info!(surface = %surface, "HTTP server stopped"),
            Err(e) => {
                tracing::error!(surface = %surface, error = %e, "HTTP server failed");
                handle.trigger(Some(ShutdownCause::ServeFailed(format!("{surface} surface: {e}"))));
            }
        }
    })
}
