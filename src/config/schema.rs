//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a scaffold.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Primary (application traffic) surface.
    pub listener: SurfaceConfig,

    /// Separate management surface for probes. `None` serves probes on the primary surface.
    pub management: Option<SurfaceConfig>,

    /// Probe paths.
    pub probes: ProbeConfig,

    /// Drain window settings.
    pub drain: DrainConfig,

    /// Optional mark-down endpoint.
    pub markdown: Option<MarkdownConfig>,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Bind settings for one HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port; 0 picks an ephemeral port.
    pub port: u16,
}

impl SurfaceConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
        }
    }
}

/// Probe endpoint paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Liveness path.
    pub health_path: String,

    /// Readiness path.
    pub ready_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            ready_path: "/ready".to_string(),
        }
    }
}

/// Drain window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Maximum time to wait for in-flight requests after shutdown, in milliseconds.
    pub timeout_ms: u64,

    /// Time allowed for servers to close connections after `Stopped`, in milliseconds.
    pub close_grace_ms: u64,
}

impl DrainConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            close_grace_ms: 500,
        }
    }
}

/// Mark-down endpoint: an HTTP request that begins a graceful drain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub path: String,

    /// HTTP method that triggers the mark-down.
    pub method: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            path: "/markdown".to_string(),
            method: "POST".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
