//! Health and readiness subsystem.
//!
//! # Data Flow
//! ```text
//! GET <health_path> / <ready_path>
//!     → probe.rs (negotiate Accept, render)
//!     → registry.rs (run health check, merge drain state)
//!         → caller's HealthCheck
//!         → DrainCoordinator::state()
//! ```
//!
//! # Design Decisions
//! - Liveness reflects only the health check
//! - Readiness also reports unavailable while draining or stopped
//! - Any non-OK status maps to 503; the body tells them apart

pub mod probe;
pub mod registry;
pub mod status;

pub use probe::{probe_router, ResponseFormat};
pub use registry::{HealthCheck, HealthRegistry, ProbeKind};
pub use status::{HealthReport, HealthStatus};
