//! Service lifecycle state machine.
//!
//! # States
//! - Created: configured, nothing bound
//! - Open: sockets bound, not serving
//! - Listening: serving application traffic
//! - Draining: rejecting new work, finishing in-flight work
//! - Stopped: terminal
//!
//! # State Transitions
//! ```text
//! Created → Open → Listening → Draining → Stopped
//!     └───────┴────────┴──→ Draining (shutdown before serving)
//! ```
//!
//! Transitions only move forward; no state is ever revisited.

use std::fmt;

/// Current lifecycle phase of a scaffold.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Created = 0,
    Open = 1,
    Listening = 2,
    Draining = 3,
    Stopped = 4,
}

impl ServiceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Created => "Created",
            ServiceState::Open => "Open",
            ServiceState::Listening => "Listening",
            ServiceState::Draining => "Draining",
            ServiceState::Stopped => "Stopped",
        }
    }

    /// Whether new application requests may be admitted.
    pub fn accepts_requests(self) -> bool {
        self == ServiceState::Listening
    }

    /// Draining or stopped: readiness must report unavailable.
    pub fn is_shutting_down(self) -> bool {
        self >= ServiceState::Draining
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_advance_to(self, next: ServiceState) -> bool {
        match (self, next) {
            (ServiceState::Created, ServiceState::Open) => true,
            (ServiceState::Open, ServiceState::Listening) => true,
            (
                ServiceState::Created | ServiceState::Open | ServiceState::Listening,
                ServiceState::Draining,
            ) => true,
            (ServiceState::Draining, ServiceState::Stopped) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
