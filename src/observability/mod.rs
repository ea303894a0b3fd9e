//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle, drain and probe events:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
