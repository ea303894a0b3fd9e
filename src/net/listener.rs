//! Socket binding for the primary and management surfaces.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - Resolve the actual address (ephemeral ports included)
//! - Map bind failures to [`ScaffoldError::Bind`]

use std::fmt;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::SurfaceConfig;
use crate::error::ScaffoldError;

/// Which inbound surface a socket serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Primary,
    Management,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Primary => f.write_str("primary"),
            Surface::Management => f.write_str("management"),
        }
    }
}

/// Address a surface is actually bound to, after ephemeral port resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundAddress {
    pub host: String,
    pub port: u16,
}

impl From<SocketAddr> for BoundAddress {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for BoundAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A bound, not yet serving, listening socket.
#[derive(Debug)]
pub struct BoundListener {
    inner: TcpListener,
    surface: Surface,
    address: BoundAddress,
}

impl BoundListener {
    /// Bind `surface` to the configured address.
    pub async fn bind(surface: Surface, config: &SurfaceConfig) -> Result<Self, ScaffoldError> {
        let requested = config.bind_address();
        let bind_error = |source| ScaffoldError::Bind {
            surface,
            address: requested.clone(),
            source,
        };

        let inner = TcpListener::bind(requested.as_str())
            .await
            .map_err(bind_error)?;
        let address = BoundAddress::from(inner.local_addr().map_err(bind_error)?);

        tracing::info!(
            surface = %surface,
            requested = %requested,
            address = %address,
            "Listener bound"
        );

        Ok(Self {
            inner,
            surface,
            address,
        })
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn address(&self) -> &BoundAddress {
        &self.address
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ephemeral_port_is_resolved() {
        let bound = BoundListener::bind(Surface::Primary, &SurfaceConfig::new("127.0.0.1", 0))
            .await
            .unwrap();
        assert_eq!(bound.address().host, "127.0.0.1");
        assert_ne!(bound.address().port, 0);
        assert_eq!(bound.address().to_string(), format!("127.0.0.1:{}", bound.address().port));
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let first = BoundListener::bind(Surface::Primary, &SurfaceConfig::new("127.0.0.1", 0))
            .await
            .unwrap();
        let taken = SurfaceConfig::new("127.0.0.1", first.address().port);

        let err = BoundListener::bind(Surface::Management, &taken).await.unwrap_err();
        match err {
            ScaffoldError::Bind { surface, address, .. } => {
                assert_eq!(surface, Surface::Management);
                assert_eq!(address, taken.bind_address());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ipv6_display_is_bracketed() {
        let addr: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(BoundAddress::from(addr).to_string(), "[::1]:8080");
    }
}
