//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Primary surface:
//!     server.rs (request ID, tracing)
//!     → probe routes (only when no management surface)
//!     → middleware/gate.rs (503 unless listening; in-flight slot)
//!     → delegate router
//!
//! Management surface:
//!     server.rs (tracing)
//!     → probe routes, mark-down route
//!     → 404 for everything else
//! ```

pub mod markdown;
pub mod middleware;
pub mod server;

pub use markdown::markdown_router;
pub use server::{management_router, primary_router, spawn_server};
