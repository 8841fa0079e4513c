//! Single-flight state: the in-progress flag and its waiter queue.
//!
//! Only [`FlightState::acquire`] and [`FlightGuard::complete`] touch the
//! queue. The flag is `Some(queue)` while a refresh runs, so "queue empty
//! unless in progress" holds by construction, and clearing the flag and
//! taking the queue happen under one lock.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::error::RefreshFailure;

/// Outcome fanned out to every waiter of one refresh.
pub type RefreshOutcome = Result<String, RefreshFailure>;

/// Receiving end for one waiter.
pub type Waiter = oneshot::Receiver<RefreshOutcome>;

/// Result of joining the flight.
#[derive(Debug)]
pub enum Ticket {
    /// No refresh was running: the caller must start one and resolve
    /// it through the guard.
    Leader(FlightGuard, Waiter),
    /// A refresh is already running: wait for its outcome.
    Follower(Waiter),
}

/// In-progress flag plus waiter queue.
#[derive(Debug, Default)]
pub struct FlightState {
    queue: Mutex<Option<Vec<oneshot::Sender<RefreshOutcome>>>>,
}

impl FlightState {
    /// Creates an idle flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the caller and reports whether it must lead the refresh.
    ///
    /// The check and the enqueue happen under one lock, with no await.
    pub fn acquire(self: &Arc<Self>) -> Ticket {
        let (tx, rx) = oneshot::channel();
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(waiters) = queue.as_mut() {
            waiters.push(tx);
            Ticket::Follower(rx)
        } else {
            *queue = Some(vec![tx]);
            Ticket::Leader(
                FlightGuard {
                    flight: Some(self.clone()),
                },
                rx,
            )
        }
    }

    /// Returns true while a refresh is running.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Clears the flag and resolves every waiter, in arrival order, with
    /// the same outcome. Returns how many waiters were resolved.
    fn drain(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose caller went away is simply skipped.
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

/// Held by the leader for the duration of one refresh.
///
/// Dropping it without calling [`FlightGuard::complete`] drains the queue
/// with [`RefreshFailure::Aborted`], so waiters never hang.
#[derive(Debug)]
pub struct FlightGuard {
    flight: Option<Arc<FlightState>>,
}

impl FlightGuard {
    /// Ends the flight with `outcome`. Returns how many waiters were resolved.
    pub fn complete(mut self, outcome: &RefreshOutcome) -> usize {
        self.flight
            .take()
            .map_or(0, |flight| flight.drain(outcome))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Some(flight) = self.flight.take() {
            flight.drain(&Err(RefreshFailure::Aborted));
        }
    }
}
