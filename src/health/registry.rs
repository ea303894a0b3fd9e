//! Liveness and readiness evaluation.
//!
//! # Responsibilities
//! - Invoke the caller-supplied health check on every probe (no caching)
//! - Merge the check result with the scaffold's drain state for readiness
//!
//! # Design Decisions
//! - Liveness ignores drain state entirely and fails only on `Failed`
//! - Readiness is the worse of liveness and `NotReady` while shutting down

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::health::{HealthReport, HealthStatus};
use crate::lifecycle::DrainCoordinator;

/// Caller-supplied health predicate. Must be cheap and non-blocking.
pub trait HealthCheck: Send + Sync + 'static {
    /// Current status plus an optional reason overriding the status name.
    fn check_health(&self) -> (HealthStatus, Option<String>);
}

impl<F> HealthCheck for F
where
    F: Fn() -> (HealthStatus, Option<String>) + Send + Sync + 'static,
{
    fn check_health(&self) -> (HealthStatus, Option<String>) {
        self()
    }
}

/// Which probe is being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Liveness,
    Readiness,
}

impl ProbeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeKind::Liveness => "liveness",
            ProbeKind::Readiness => "readiness",
        }
    }

    /// Response code for `status` on this probe. A `NotReady` service is
    /// still alive, so only readiness turns it into a 503.
    pub fn status_code(self, status: HealthStatus) -> StatusCode {
        match (self, status) {
            (_, HealthStatus::Ok) | (ProbeKind::Liveness, HealthStatus::NotReady) => StatusCode::OK,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Per-scaffold health state shared with the probe endpoint.
pub struct HealthRegistry {
    check: Option<Arc<dyn HealthCheck>>,
    drain: Arc<DrainCoordinator>,
}

impl HealthRegistry {
    pub fn new(check: Option<Arc<dyn HealthCheck>>, drain: Arc<DrainCoordinator>) -> Self {
        Self { check, drain }
    }

    pub fn report(&self, kind: ProbeKind) -> HealthReport {
        match kind {
            ProbeKind::Liveness => self.liveness(),
            ProbeKind::Readiness => self.readiness(),
        }
    }

    fn liveness(&self) -> HealthReport {
        match &self.check {
            Some(check) => {
                let (status, reason) = check.check_health();
                HealthReport::new(status, reason)
            }
            None => HealthReport::new(HealthStatus::Ok, None),
        }
    }

    fn readiness(&self) -> HealthReport {
        let live = self.liveness();
        let state = self.drain.state();
        if state.is_shutting_down() {
            let status = live.status.max(HealthStatus::NotReady);
            return HealthReport::new(status, Some(format!("Service is {state}")));
        }
        live
    }
}

impl fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("has_check", &self.check.is_some())
            .field("state", &self.drain.state())
            .finish()
    }
}
