//! Probe endpoint: serves liveness and readiness reports over HTTP.
//!
//! The body format follows the request's `Accept` header. `text/plain`
//! yields the bare reason; JSON (or no preference) yields
//! `{"status": ..., "reason": ...}`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::config::ProbeConfig;
use crate::health::{HealthRegistry, HealthReport, ProbeKind};
use crate::observability::metrics;

/// Negotiated body format for a probe response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

impl ResponseFormat {
    /// Pick a format from an `Accept` header value.
    ///
    /// Each candidate takes the quality of its most specific matching
    /// range. Text wins only with a strictly higher quality than JSON.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return ResponseFormat::Json;
        };

        let mut text: Option<(u8, f32)> = None;
        let mut json: Option<(u8, f32)> = None;

        for range in accept.split(',') {
            let mut params = range.split(';');
            let media = params.next().unwrap_or("").trim().to_ascii_lowercase();
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            let (text_rank, json_rank) = match media.as_str() {
                "text/plain" => (Some(2), None),
                "text/*" => (Some(1), None),
                "application/json" => (None, Some(2)),
                "application/*" => (None, Some(1)),
                "*/*" => (Some(0), Some(0)),
                _ => (None, None),
            };
            if let Some(rank) = text_rank {
                text = more_specific(text, rank, quality);
            }
            if let Some(rank) = json_rank {
                json = more_specific(json, rank, quality);
            }
        }

        let text_q = text.map_or(0.0, |(_, q)| q);
        let json_q = json.map_or(0.0, |(_, q)| q);
        if text_q > json_q {
            ResponseFormat::Text
        } else {
            ResponseFormat::Json
        }
    }

    fn from_headers(headers: &HeaderMap) -> Self {
        Self::negotiate(headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()))
    }
}

fn more_specific(current: Option<(u8, f32)>, rank: u8, quality: f32) -> Option<(u8, f32)> {
    match current {
        Some((s, q)) if s > rank || (s == rank && q >= quality) => Some((s, q)),
        _ => Some((rank, quality)),
    }
}

/// Render a report with the status code `kind` assigns to its health status.
pub fn render(report: HealthReport, kind: ProbeKind, format: ResponseFormat) -> Response {
    let code = kind.status_code(report.status);
    match format {
        ResponseFormat::Text => (code, report.reason).into_response(),
        ResponseFormat::Json => (code, Json(report)).into_response(),
    }
}

fn serve_probe(registry: &HealthRegistry, kind: ProbeKind, headers: &HeaderMap) -> Response {
    let report = registry.report(kind);
    metrics::record_probe(kind, report.status);
    if kind.status_code(report.status).is_server_error() {
        tracing::debug!(
            probe = kind.as_str(),
            status = %report.status,
            reason = %report.reason,
            "Probe unhealthy"
        );
    }
    render(report, kind, ResponseFormat::from_headers(headers))
}

pub async fn liveness(
    State(registry): State<Arc<HealthRegistry>>,
    headers: HeaderMap,
) -> Response {
    serve_probe(&registry, ProbeKind::Liveness, &headers)
}

pub async fn readiness(
    State(registry): State<Arc<HealthRegistry>>,
    headers: HeaderMap,
) -> Response {
    serve_probe(&registry, ProbeKind::Readiness, &headers)
}

/// Routes for the configured health and ready paths.
pub fn probe_router(config: &ProbeConfig, registry: Arc<HealthRegistry>) -> Router {
    Router::new()
        .route(&config.health_path, get(liveness))
        .route(&config.ready_path, get(readiness))
        .with_state(registry)
}
