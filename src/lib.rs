//! Service scaffold: a reusable front-end for network services running
//! under an orchestrator.
//!
//! A [`Scaffold`] owns the listening sockets, serves liveness and readiness
//! probes (on the primary surface or a separate management surface), gates
//! application traffic on the lifecycle state, and drains in-flight
//! requests on shutdown within a bounded window.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ScaffoldConfig;
pub use error::{Rejected, ScaffoldError, ScaffoldResult};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use lifecycle::{Scaffold, ServiceState, ShutdownCause, ShutdownHandle};
pub use net::BoundAddress;
