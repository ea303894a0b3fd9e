//! OS signal handling.
//!
//! SIGTERM and SIGINT both begin a graceful drain with
//! [`ShutdownCause::Signal`]. The watcher task exits once the scaffold stops.

use tokio::task::JoinHandle;

use crate::lifecycle::{ShutdownCause, ShutdownHandle};

/// Spawn a task that turns the first termination signal into a shutdown request.
pub fn spawn_signal_watcher(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            name = termination_signal() => {
                tracing::info!(signal = name, "Shutdown signal received");
                handle.trigger(Some(ShutdownCause::Signal(name)));
            }
            _ = handle.stopped() => {}
        }
    })
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            return interrupt().await;
        }
    };

    tokio::select! {
        _ = term.recv() => "SIGTERM",
        name = interrupt() => name,
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    interrupt().await
}

async fn interrupt() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
