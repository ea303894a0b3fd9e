//! Health status and report types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of the service, ordered by severity: `Ok < NotReady < Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "OK")]
    Ok,
    NotReady,
    Failed,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Ok => "OK",
            HealthStatus::NotReady => "NotReady",
            HealthStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a liveness or readiness evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub reason: String,
}

impl HealthReport {
    /// Build a report; a missing reason defaults to the status name.
    pub fn new(status: HealthStatus, reason: Option<String>) -> Self {
        let reason = reason.unwrap_or_else(|| status.as_str().to_string());
        Self { status, reason }
    }
}
