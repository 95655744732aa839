//! Listener registry for external identity changes.

use crate::state::ExternalIdentity;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Callback invoked with the provider's current identity.
pub type IdentityListener = Box<dyn Fn(Option<ExternalIdentity>) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    current: Option<ExternalIdentity>,
    listeners: Vec<(u64, IdentityListener)>,
    next_id: u64,
}

/// Holds the current external identity and fans changes out to listeners.
///
/// Provider adapters embed a hub and call [`IdentityHub::publish`] whenever
/// their signed-in identity changes (sign-in, sign-out, token refresh).
/// New listeners are replayed the current identity immediately.
///
/// Listeners run while the hub is locked, which keeps deliveries in
/// publication order. They must not call back into the hub.
#[derive(Clone, Default)]
pub struct IdentityHub {
    inner: Arc<Mutex<HubInner>>,
}

impl IdentityHub {
    /// Create an empty hub (no identity, no listeners).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current identity.
    #[must_use]
    pub fn current(&self) -> Option<ExternalIdentity> {
        self.lock().current.clone()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Register `listener` and replay the current identity to it.
    pub fn subscribe(&self, listener: IdentityListener) -> Subscription {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        listener(inner.current.clone());
        inner.listeners.push((id, listener));

        tracing::debug!(listener_id = id, "Identity listener registered");

        Subscription {
            hub: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Record `identity` as current and notify every listener.
    ///
    /// Listeners are notified even when the identity is unchanged; provider
    /// token refreshes re-deliver the same identity.
    pub fn publish(&self, identity: Option<ExternalIdentity>) {
        let mut inner = self.lock();
        inner.current = identity;

        for (_, listener) in &inner.listeners {
            listener(inner.current.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for IdentityHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("IdentityHub")
            .field("current", &inner.current)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Unsubscribe handle returned by [`IdentityHub::subscribe`].
///
/// The listener stays registered until the handle is dropped or
/// [`Subscription::unsubscribe`] is called.
#[derive(Debug)]
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    hub: Weak<Mutex<HubInner>>,
    id: Option<u64>,
}

impl Subscription {
    /// Unregister the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(hub) = self.hub.upgrade() {
            let mut inner = hub.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(listener_id, _)| *listener_id != id);
            tracing::debug!(listener_id = id, "Identity listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
