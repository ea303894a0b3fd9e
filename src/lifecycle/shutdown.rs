//! Shutdown causes and the cloneable shutdown handle.

use std::sync::Arc;

use thiserror::Error;

use crate::lifecycle::drain::DrainCoordinator;
use crate::lifecycle::ServiceState;

/// Why a scaffold stopped serving. Returned from `listen()` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShutdownCause {
    /// Stopped without a specific reason (`shutdown(None)`).
    #[error("manual stop")]
    ManualStop,

    /// An OS signal was caught.
    #[error("caught signal {0}")]
    Signal(&'static str),

    /// An operator hit the mark-down endpoint.
    #[error("marked down")]
    MarkedDown,

    /// An accept loop failed.
    #[error("server failed: {0}")]
    ServeFailed(String),

    /// Caller-supplied reason.
    #[error("{0}")]
    Reason(String),
}

impl ShutdownCause {
    /// Normalize an absent cause to [`ShutdownCause::ManualStop`].
    pub fn or_manual(cause: Option<ShutdownCause>) -> Self {
        cause.unwrap_or(ShutdownCause::ManualStop)
    }
}

impl From<&str> for ShutdownCause {
    fn from(reason: &str) -> Self {
        ShutdownCause::Reason(reason.to_string())
    }
}

impl From<String> for ShutdownCause {
    fn from(reason: String) -> Self {
        ShutdownCause::Reason(reason)
    }
}

/// Cloneable handle that can stop a scaffold from any task or thread.
///
/// Triggering is non-blocking and idempotent: only the first cause is kept.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    drain: Arc<DrainCoordinator>,
}

impl ShutdownHandle {
    pub(crate) fn new(drain: Arc<DrainCoordinator>) -> Self {
        Self { drain }
    }

    /// Request graceful termination. Returns whether this call started the drain.
    pub fn trigger(&self, cause: Option<ShutdownCause>) -> bool {
        self.drain.begin_drain(ShutdownCause::or_manual(cause))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.drain.state()
    }

    /// Wait until the scaffold reaches `Stopped`.
    pub async fn stopped(&self) {
        self.drain.wait_for_state(ServiceState::Stopped).await;
    }
}
