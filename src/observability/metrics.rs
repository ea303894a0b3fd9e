//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scaffold_requests_total` (counter): admissions by outcome (accepted, rejected)
//! - `scaffold_in_flight_requests` (gauge): requests currently holding a slot
//! - `scaffold_probe_requests_total` (counter): probe answers by probe, status
//! - `scaffold_state` (gauge): lifecycle state as 0 (Created) ..= 4 (Stopped)
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op without a recorder
//! - The Prometheus exporter is installed only by the binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::{HealthStatus, ProbeKind};
use crate::lifecycle::ServiceState;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_admission(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    ::metrics::counter!("scaffold_requests_total", "outcome" => outcome).increment(1);
}

pub fn set_in_flight(count: u64) {
    ::metrics::gauge!("scaffold_in_flight_requests").set(count as f64);
}

pub fn record_probe(kind: ProbeKind, status: HealthStatus) {
    ::metrics::counter!(
        "scaffold_probe_requests_total",
        "probe" => kind.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
}

pub fn record_state(state: ServiceState) {
    ::metrics::gauge!("scaffold_state").set(f64::from(state as u8));
}
