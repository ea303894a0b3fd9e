//! Lifecycle controller.
//!
//! # Responsibilities
//! - Own the configuration, health check and drain coordinator
//! - Bind the primary and (optional) management sockets on `open()`
//! - Serve both surfaces on `listen()` until the drain completes
//! - Accept shutdown requests from any thread
//!
//! # Design Decisions
//! - Binding is split from serving so callers can learn ephemeral ports
//! - `listen()` drives the drain to completion; `shutdown()` only starts it
//! - After `Stopped`, servers get a short close grace, then stuck requests
//!   are abandoned and the servers aborted

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use tokio::task::JoinHandle;

use crate::config::{validate_config, ConfigError, ScaffoldConfig};
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::health::{probe_router, HealthCheck, HealthRegistry};
use crate::http::{management_router, markdown_router, primary_router, spawn_server};
use crate::lifecycle::signals::spawn_signal_watcher;
use crate::lifecycle::{DrainCoordinator, ServiceState, ShutdownCause, ShutdownHandle};
use crate::net::{BoundAddress, BoundListener, Surface};

struct BoundSurfaces {
    primary: BoundListener,
    management: Option<BoundListener>,
}

/// Front-end for a network service: owns its sockets, probes and drain.
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use service_scaffold::{Scaffold, ScaffoldConfig};
///
/// # async fn run() -> Result<(), service_scaffold::ScaffoldError> {
/// let scaffold = Scaffold::new(ScaffoldConfig::default());
/// scaffold.open().await?;
/// scaffold.catch_signals();
/// let cause = scaffold.listen(Router::new().route("/", get(|| async { "hi" }))).await?;
/// println!("stopped: {cause}");
/// # Ok(())
/// # }
/// ```
pub struct Scaffold {
    config: ScaffoldConfig,
    health_check: Option<Arc<dyn HealthCheck>>,
    drain: Arc<DrainCoordinator>,
    surfaces: Mutex<Option<BoundSurfaces>>,
    primary_address: Mutex<Option<BoundAddress>>,
    management_address: Mutex<Option<BoundAddress>>,
}

impl Scaffold {
    pub fn new(config: ScaffoldConfig) -> Self {
        let drain = Arc::new(DrainCoordinator::new(config.drain.timeout()));
        Self {
            config,
            health_check: None,
            drain,
            surfaces: Mutex::new(None),
            primary_address: Mutex::new(None),
            management_address: Mutex::new(None),
        }
    }

    /// Install the health predicate consulted by both probes.
    pub fn with_health_check(mut self, check: impl HealthCheck) -> Self {
        self.health_check = Some(Arc::new(check));
        self
    }

    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceState {
        self.drain.state()
    }

    /// Requests currently holding an in-flight slot.
    pub fn in_flight(&self) -> u64 {
        self.drain.in_flight()
    }

    /// Bind the primary and, if configured, management sockets.
    ///
    /// On failure nothing stays bound and the state remains `Created`.
    pub async fn open(&self) -> ScaffoldResult<()> {
        match self.state() {
            ServiceState::Created => {}
            ServiceState::Draining | ServiceState::Stopped => return Err(ScaffoldError::Stopped),
            other => return Err(ScaffoldError::AlreadyOpened(other)),
        }

        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let primary = BoundListener::bind(Surface::Primary, &self.config.listener).await?;
        let management = match &self.config.management {
            Some(config) => Some(BoundListener::bind(Surface::Management, config).await?),
            None => None,
        };

        let primary_address = primary.address().clone();
        let management_address = management.as_ref().map(|m| m.address().clone());

        // A concurrent shutdown may have moved us to Draining; keep the sockets
        // either way so listen() can complete the drain.
        if let Err(state) = self.drain.advance(ServiceState::Open) {
            if state != ServiceState::Draining {
                return Err(ScaffoldError::AlreadyOpened(state));
            }
        }

        *lock(&self.primary_address) = Some(primary_address);
        *lock(&self.management_address) = management_address;
        *lock(&self.surfaces) = Some(BoundSurfaces { primary, management });
        Ok(())
    }

    /// Address of the primary surface. `None` before `open()`.
    pub fn primary_address(&self) -> Option<BoundAddress> {
        lock(&self.primary_address).clone()
    }

    /// Address of the management surface. `None` before `open()` or when not configured.
    pub fn management_address(&self) -> Option<BoundAddress> {
        lock(&self.management_address).clone()
    }

    /// Serve `delegate` on the primary surface (and probes on the management
    /// surface, if any) until the scaffold stops. Returns the shutdown cause.
    pub async fn listen(&self, delegate: Router) -> ScaffoldResult<ShutdownCause> {
        let surfaces = lock(&self.surfaces).take().ok_or_else(|| match self.state() {
            ServiceState::Created => ScaffoldError::NotOpen,
            ServiceState::Open | ServiceState::Listening => ScaffoldError::AlreadyListening,
            ServiceState::Draining | ServiceState::Stopped => ScaffoldError::Stopped,
        })?;

        if let Err(state) = self.drain.advance(ServiceState::Listening) {
            tracing::info!(state = %state, "Shutdown requested before serving began");
        }

        let handle = self.shutdown_handle();
        let control = self.control_router(&handle);

        let mut servers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
        match surfaces.management {
            Some(management) => {
                servers.push(spawn_server(management, management_router(control), handle.clone()));
                let app = primary_router(delegate, Arc::clone(&self.drain), None);
                servers.push(spawn_server(surfaces.primary, app, handle.clone()));
            }
            None => {
                let app = primary_router(delegate, Arc::clone(&self.drain), Some(control));
                servers.push(spawn_server(surfaces.primary, app, handle.clone()));
            }
        }

        let cause = self.drain.drain().await;
        self.close_servers(servers).await;

        tracing::info!(cause = %cause, "Scaffold stopped");
        Ok(cause)
    }

    /// Begin graceful termination. Non-blocking and idempotent; `None` means
    /// [`ShutdownCause::ManualStop`].
    pub fn shutdown(&self, cause: Option<ShutdownCause>) {
        self.drain.begin_drain(ShutdownCause::or_manual(cause));
    }

    /// Cloneable handle for stopping the scaffold from other tasks.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.drain))
    }

    /// Shut down on SIGTERM or SIGINT. Requires a Tokio runtime.
    pub fn catch_signals(&self) -> JoinHandle<()> {
        spawn_signal_watcher(self.shutdown_handle())
    }

    fn control_router(&self, handle: &ShutdownHandle) -> Router {
        let registry = Arc::new(HealthRegistry::new(
            self.health_check.clone(),
            Arc::clone(&self.drain),
        ));
        let mut control = probe_router(&self.config.probes, registry);
        if let Some(markdown) = &self.config.markdown {
            if let Some(route) = markdown_router(markdown, handle.clone()) {
                control = control.merge(route);
            }
        }
        control
    }

    /// Wait up to the close grace for the servers to finish. Past it, requests
    /// still running are abandoned so their connection tasks can end, and the
    /// accept loops are aborted.
    async fn close_servers(&self, servers: Vec<JoinHandle<()>>) {
        let deadline = tokio::time::Instant::now() + self.config.drain.close_grace();
        for mut server in servers {
            if tokio::time::timeout_at(deadline, &mut server).await.is_err() {
                tracing::warn!("Server did not close within grace period, aborting");
                self.drain.abandon();
                server.abort();
                let _ = server.await;
            }
        }
    }
}

impl fmt::Debug for Scaffold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scaffold")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .field("primary_address", &self.primary_address())
            .field("management_address", &self.management_address())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
