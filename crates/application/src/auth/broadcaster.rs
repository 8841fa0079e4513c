//! Session-expired notifications.
//!
//! The coordinator publishes here when a session dies; UI code subscribes
//! to redirect to its login surface. Neither side knows about the other.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::info;

/// Event delivered to listeners when the session can no longer be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    /// Why the session ended, e.g. "refresh token expired".
    pub reason: String,
}

type Listener = Arc<dyn Fn(&SessionExpired) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Publish/subscribe hub for [`SessionExpired`] events.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone, Default)]
pub struct SessionBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for SessionBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl SessionBroadcaster {
    /// Creates a hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`. Keep the returned [`Subscription`] to
    /// unsubscribe later; dropping it leaves the handler registered.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionExpired) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(handler)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invokes every current listener with `reason`, in registration order.
    ///
    /// Listeners run outside the registry lock, so a handler may
    /// subscribe or unsubscribe while being notified.
    pub fn notify(&self, reason: &str) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        info!(reason, subscribers = listeners.len(), "session expired");

        let event = SessionExpired {
            reason: reason.to_string(),
        };
        for listener in listeners {
            listener(&event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

/// Handle returned by [`SessionBroadcaster::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the handler. A no-op once the hub is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}
