//! Graceful-drain coordination.
//!
//! # Responsibilities
//! - Admit or reject each inbound request based on lifecycle state
//! - Count in-flight requests with a guard released on every exit path
//! - Drive Draining → Stopped once idle or once the drain window elapses
//!
//! State, in-flight count and the pending cause share one `watch` cell, so
//! the `Listening` check and the increment in [`DrainCoordinator::enter`] are
//! one step with respect to [`DrainCoordinator::begin_drain`]. No request is
//! admitted after draining has begun.
//!
//! Requests still running when the servers' close grace runs out are
//! abandoned: [`DrainCoordinator::abandon`] wakes every gate, which drops
//! the delegate future and answers 503 so the connection can close.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::Rejected;
use crate::lifecycle::{ServiceState, ShutdownCause};
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct DrainSnapshot {
    state: ServiceState,
    in_flight: u64,
    cause: Option<ShutdownCause>,
    abandoned: bool,
}

/// Tracks in-flight requests and drives the lifecycle state machine.
#[derive(Debug)]
pub struct DrainCoordinator {
    cell: watch::Sender<DrainSnapshot>,
    max_drain: Duration,
}

impl DrainCoordinator {
    /// Create a coordinator in `Created` with the given maximum drain window.
    pub fn new(max_drain: Duration) -> Self {
        let (cell, _) = watch::channel(DrainSnapshot {
            state: ServiceState::Created,
            in_flight: 0,
            cause: None,
            abandoned: false,
        });
        Self { cell, max_drain }
    }

    pub fn state(&self) -> ServiceState {
        self.cell.borrow().state
    }

    pub fn in_flight(&self) -> u64 {
        self.cell.borrow().in_flight
    }

    pub fn max_drain(&self) -> Duration {
        self.max_drain
    }

    /// The cause recorded by the first `begin_drain`, if any.
    pub fn cause(&self) -> Option<ShutdownCause> {
        self.cell.borrow().cause.clone()
    }

    /// Move forward to `next`. Fails with the current state if the transition is illegal.
    pub fn advance(&self, next: ServiceState) -> Result<(), ServiceState> {
        let mut current = next;
        let changed = self.cell.send_if_modified(|snapshot| {
            current = snapshot.state;
            if snapshot.state.can_advance_to(next) {
                snapshot.state = next;
                true
            } else {
                false
            }
        });

        if changed {
            tracing::info!(from = %current, to = %next, "Service state changed");
            metrics::record_state(next);
            Ok(())
        } else {
            Err(current)
        }
    }

    /// Admit a request. Only succeeds while `Listening`.
    ///
    /// The returned guard holds the in-flight slot until dropped.
    pub fn enter(self: &Arc<Self>) -> Result<InFlightGuard, Rejected> {
        let mut outcome = Ok(());
        // Increments don't wake anyone; only the drop to zero matters to waiters.
        self.cell.send_if_modified(|snapshot| {
            if snapshot.state.accepts_requests() {
                snapshot.in_flight += 1;
                // Inside the cell lock so racing updates land in order.
                metrics::set_in_flight(snapshot.in_flight);
                outcome = Ok(());
            } else {
                outcome = Err(Rejected(snapshot.state));
            }
            false
        });

        match outcome {
            Ok(()) => {
                metrics::record_admission(true);
                Ok(InFlightGuard {
                    drain: Arc::clone(self),
                })
            }
            Err(rejected) => {
                metrics::record_admission(false);
                tracing::debug!(state = %rejected.0, "Request rejected");
                Err(rejected)
            }
        }
    }

    /// Release one in-flight slot. Called from [`InFlightGuard`]'s `Drop`.
    fn leave(&self) {
        let mut remaining = None;
        self.cell.send_if_modified(|snapshot| match snapshot.in_flight.checked_sub(1) {
            Some(n) => {
                snapshot.in_flight = n;
                metrics::set_in_flight(n);
                remaining = Some(n);
                n == 0
            }
            None => false,
        });

        if remaining.is_none() {
            tracing::error!("In-flight counter released below zero");
        }
    }

    /// Begin draining with `cause`. Returns `false` if a drain was already requested.
    ///
    /// Legal from any non-terminal state, including before `listen()`.
    pub fn begin_drain(&self, cause: ShutdownCause) -> bool {
        let mut previous = ServiceState::Draining;
        let mut in_flight = 0;
        let started = self.cell.send_if_modified(|snapshot| {
            previous = snapshot.state;
            in_flight = snapshot.in_flight;
            if snapshot.state.can_advance_to(ServiceState::Draining) {
                snapshot.state = ServiceState::Draining;
                snapshot.cause = Some(cause);
                true
            } else {
                false
            }
        });

        if started {
            tracing::info!(
                from = %previous,
                in_flight,
                cause = ?self.cause(),
                "Drain started"
            );
            metrics::record_state(ServiceState::Draining);
        } else {
            tracing::debug!(state = %previous, "Shutdown already requested, ignoring");
        }
        started
    }

    /// Wait for draining to begin, then for the in-flight count to reach
    /// zero or the drain window to elapse, whichever comes first. Moves to
    /// `Stopped` and returns the recorded cause.
    pub async fn drain(&self) -> ShutdownCause {
        let mut rx = self.cell.subscribe();
        let _ = rx.wait_for(|s| s.state.is_shutting_down()).await;

        let idle = tokio::time::timeout(self.max_drain, rx.wait_for(|s| s.in_flight == 0))
            .await
            .is_ok();
        if !idle {
            tracing::warn!(
                in_flight = self.in_flight(),
                max_drain_ms = self.max_drain.as_millis() as u64,
                "Drain window elapsed with requests in flight, forcing stop"
            );
        }

        let _ = self.advance(ServiceState::Stopped);
        ShutdownCause::or_manual(self.cause())
    }

    /// Cancel every request still holding a slot. Only takes effect once `Stopped`.
    pub fn abandon(&self) -> bool {
        let mut in_flight = 0;
        let abandoned = self.cell.send_if_modified(|snapshot| {
            in_flight = snapshot.in_flight;
            if snapshot.state == ServiceState::Stopped && !snapshot.abandoned {
                snapshot.abandoned = true;
                true
            } else {
                false
            }
        });
        if abandoned {
            tracing::warn!(in_flight, "Abandoning requests still in flight");
        }
        abandoned
    }

    /// Resolves once [`abandon`](Self::abandon) has been called.
    pub async fn abandoned(&self) {
        let mut rx = self.cell.subscribe();
        let _ = rx.wait_for(|s| s.abandoned).await;
    }

    /// Wait until the state is at or beyond `target`.
    pub async fn wait_for_state(&self, target: ServiceState) {
        let mut rx = self.cell.subscribe();
        let _ = rx.wait_for(|s| s.state >= target).await;
    }
}

/// Holds one in-flight slot; releases it when dropped, including on unwind.
#[derive(Debug)]
pub struct InFlightGuard {
    drain: Arc<DrainCoordinator>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.drain.leave();
        tracing::trace!("In-flight slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, SharedString, Unit};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    fn listening(max_drain: Duration) -> Arc<DrainCoordinator> {
        let drain = Arc::new(DrainCoordinator::new(max_drain));
        drain.advance(ServiceState::Open).unwrap();
        drain.advance(ServiceState::Listening).unwrap();
        drain
    }

    /// Records only the in-flight gauge, shared across threads.
    #[derive(Clone, Default)]
    struct InFlightGauge(Arc<AtomicU64>);

    impl ::metrics::GaugeFn for InFlightGauge {
        fn increment(&self, _: f64) {}
        fn decrement(&self, _: f64) {}
        fn set(&self, value: f64) {
            self.0.store(value as u64, Ordering::SeqCst);
        }
    }

    impl ::metrics::Recorder for InFlightGauge {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            if key.name() == "scaffold_in_flight_requests" {
                Gauge::from_arc(Arc::new(self.clone()))
            } else {
                Gauge::noop()
            }
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn rejects_until_listening() {
        let drain = Arc::new(DrainCoordinator::new(Duration::from_secs(1)));
        assert_eq!(drain.enter().unwrap_err(), Rejected(ServiceState::Created));
        drain.advance(ServiceState::Open).unwrap();
        assert_eq!(drain.enter().unwrap_err(), Rejected(ServiceState::Open));
        drain.advance(ServiceState::Listening).unwrap();
        assert!(drain.enter().is_ok());
    }

    #[test]
    fn guards_track_in_flight() {
        let drain = listening(Duration::from_secs(1));
        let g1 = drain.enter().unwrap();
        let g2 = drain.enter().unwrap();
        assert_eq!(drain.in_flight(), 2);
        drop(g1);
        assert_eq!(drain.in_flight(), 1);
        drop(g2);
        assert_eq!(drain.in_flight(), 0);
    }

    #[test]
    fn panic_releases_slot() {
        let drain = listening(Duration::from_secs(1));
        let inner = Arc::clone(&drain);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.enter().unwrap();
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(drain.in_flight(), 0);
    }

    #[test]
    fn first_cause_wins() {
        let drain = listening(Duration::from_secs(1));
        assert!(drain.begin_drain("first".into()));
        assert!(!drain.begin_drain("second".into()));
        assert_eq!(drain.cause(), Some(ShutdownCause::Reason("first".into())));
        assert_eq!(drain.enter().unwrap_err(), Rejected(ServiceState::Draining));
        assert_eq!(drain.advance(ServiceState::Listening), Err(ServiceState::Draining));
    }

    #[test]
    fn no_admission_after_drain_begins() {
        let drain = listening(Duration::from_secs(1));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let drain = Arc::clone(&drain);
                std::thread::spawn(move || {
                    let mut held = Vec::new();
                    for _ in 0..500 {
                        match drain.enter() {
                            Ok(guard) => held.push(guard),
                            Err(_) => break,
                        }
                    }
                    held
                })
            })
            .collect();

        drain.begin_drain(ShutdownCause::ManualStop);
        let after = drain.in_flight();
        assert!(drain.enter().is_err());

        let held: usize = workers.into_iter().map(|w| w.join().unwrap().len()).sum();
        assert_eq!(drain.in_flight(), held as u64);
        assert!(held as u64 >= after);
    }

    #[test]
    fn in_flight_gauge_settles_on_the_final_count() {
        let drain = listening(Duration::from_secs(1));
        let gauge = InFlightGauge::default();
        gauge.0.store(u64::MAX, Ordering::SeqCst);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let drain = Arc::clone(&drain);
                let recorder = gauge.clone();
                std::thread::spawn(move || {
                    ::metrics::with_local_recorder(&recorder, || {
                        for _ in 0..500 {
                            let slot = drain.enter().unwrap();
                            drop(slot);
                        }
                    })
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(drain.in_flight(), 0);
        assert_eq!(gauge.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn abandon_wakes_waiters_only_after_stop() {
        let drain = listening(Duration::from_millis(50));
        let slot = drain.enter().unwrap();

        let waiter = {
            let drain = Arc::clone(&drain);
            tokio::spawn(async move { drain.abandoned().await })
        };
        assert!(!drain.abandon());

        drain.begin_drain(ShutdownCause::ManualStop);
        drain.drain().await;
        assert!(drain.abandon());
        assert!(!drain.abandon());

        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        drop(slot);
        assert_eq!(drain.in_flight(), 0);
    }

    #[tokio::test]
    async fn drain_completes_immediately_when_idle() {
        let drain = listening(Duration::from_secs(5));
        drain.begin_drain("Stop".into());
        let started = Instant::now();
        let cause = drain.drain().await;
        assert_eq!(cause, ShutdownCause::Reason("Stop".into()));
        assert_eq!(drain.state(), ServiceState::Stopped);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight() {
        let drain = listening(Duration::from_secs(5));
        let guard = drain.enter().unwrap();
        drain.begin_drain(ShutdownCause::ManualStop);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(guard);
        });

        let started = Instant::now();
        let cause = drain.drain().await;
        assert_eq!(cause, ShutdownCause::ManualStop);
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(drain.in_flight(), 0);
    }

    #[tokio::test]
    async fn stuck_request_cannot_block_stop() {
        let drain = listening(Duration::from_millis(150));
        let _stuck = drain.enter().unwrap();
        drain.begin_drain(ShutdownCause::ManualStop);

        let started = Instant::now();
        drain.drain().await;
        assert_eq!(drain.state(), ServiceState::Stopped);
        assert_eq!(drain.in_flight(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn drain_waits_for_shutdown_request() {
        let drain = listening(Duration::from_secs(1));
        let waiter = {
            let drain = Arc::clone(&drain);
            tokio::spawn(async move { drain.drain().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(drain.state(), ServiceState::Listening);

        drain.begin_drain("later".into());
        let cause = waiter.await.unwrap();
        assert_eq!(cause, ShutdownCause::Reason("later".into()));
    }
}
