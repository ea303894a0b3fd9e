//! Error types for the scaffold lifecycle.

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::ServiceState;
use crate::net::Surface;

/// Errors surfaced by [`Scaffold`](crate::lifecycle::Scaffold) lifecycle operations.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A listening socket could not be bound during `open()`.
    #[error("failed to bind {surface} surface on {address}: {source}")]
    Bind {
        surface: Surface,
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration failed validation during `open()`.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `listen()` was called before a successful `open()`.
    #[error("scaffold is not open")]
    NotOpen,

    /// `open()` was called more than once.
    #[error("scaffold already opened (state: {0})")]
    AlreadyOpened(ServiceState),

    /// `listen()` was called more than once.
    #[error("scaffold is already listening")]
    AlreadyListening,

    /// The scaffold is shutting down or has stopped and cannot be reused.
    #[error("scaffold is shutting down or stopped")]
    Stopped,
}

/// Returned by the drain coordinator when a request arrives outside `Listening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request rejected while service is {0}")]
pub struct Rejected(pub ServiceState);

/// Result type for scaffold lifecycle operations.
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;
