//! Service scaffold demo server.
//!
//! Serves a small delegate behind the scaffold so the lifecycle, probes and
//! drain behavior can be exercised by hand or by an orchestrator:
//!
//! - `GET /` answers 200 after an optional `?delay=<duration>` (`250ms`, `1s`)
//! - an unparsable delay answers 400
//!
//! SIGTERM/SIGINT trigger a graceful drain.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use clap::Parser;

use service_scaffold::config::{load_config, ScaffoldConfig};
use service_scaffold::observability::{logging, metrics};
use service_scaffold::Scaffold;

#[derive(Parser)]
#[command(name = "service-scaffold")]
#[command(about = "Demo server running behind the service scaffold", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScaffoldConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("service-scaffold v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        primary = %config.listener.bind_address(),
        management = ?config.management.as_ref().map(|m| m.bind_address()),
        drain_timeout_ms = config.drain.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let scaffold = Scaffold::new(config);
    scaffold.open().await?;

    tracing::info!(
        primary = ?scaffold.primary_address().map(|a| a.to_string()),
        management = ?scaffold.management_address().map(|a| a.to_string()),
        "Listening for connections"
    );

    scaffold.catch_signals();
    let cause = scaffold.listen(demo_router()).await?;

    tracing::info!(cause = %cause, "Shutdown complete");
    Ok(())
}

fn demo_router() -> Router {
    Router::new().fallback(demo_handler)
}

async fn demo_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    let delay = match params.get("delay").map(|d| parse_delay(d)) {
        Some(Some(delay)) => delay,
        Some(None) => return StatusCode::BAD_REQUEST.into_response(),
        None => Duration::ZERO,
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    StatusCode::OK.into_response()
}

/// Parse `<n>ms`, `<n>s` or `<n>m`.
fn parse_delay(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.find(|c: char| !c.is_ascii_digit())?);
    let n: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => Some(Duration::from_secs(n * 60)),
        _ => None,
    }
}
