//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Scaffold::new(config)         Created
//!     → open()                  Open       (sockets bound)
//!     → listen(delegate)        Listening  (blocks until Stopped)
//!     → shutdown(cause)         Draining   (new requests get 503)
//!     → idle or drain timeout   Stopped    (listen returns cause)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown(Signal)
//! ```
//!
//! # Design Decisions
//! - One drain coordinator per scaffold; no process-wide state
//! - Shutdown is fire-and-forget and idempotent
//! - Drain is bounded: a stuck request cannot keep the process alive

pub mod controller;
pub mod drain;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::Scaffold;
pub use drain::{DrainCoordinator, InFlightGuard};
pub use shutdown::{ShutdownCause, ShutdownHandle};
pub use state::ServiceState;
