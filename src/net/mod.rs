//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Scaffold::open()
//!     → listener.rs (bind primary, then management if configured)
//!     → BoundAddress resolved (ephemeral ports included)
//!     → Scaffold::listen() hands the sockets to axum::serve
//! ```
//!
//! # Design Decisions
//! - Binding happens before serving so callers can learn ports early
//! - A failed bind leaves nothing half-open

pub mod listener;

pub use listener::{BoundAddress, BoundListener, Surface};
