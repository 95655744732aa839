//! Mock external identity provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::{IdentityHub, IdentityListener, IdentityProvider, Subscription};
use crate::state::ExternalIdentity;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Mock OAuth popup provider.
///
/// Popup outcomes are scripted and consumed in order; with nothing scripted
/// the popup is "closed" ([`AuthError::PopupCancelled`]). A successful
/// popup and [`IdentityProvider::sign_out`] are published to subscribers
/// like a real provider would. [`MockIdentityProvider::emit`] simulates
/// provider-initiated changes (token refresh, session expiry).
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    hub: IdentityHub,
    popups: Arc<Mutex<VecDeque<Result<ExternalIdentity>>>>,
    sign_outs: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    /// Create a provider with no signed-in identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that already has `identity` signed in (as after a
    /// page reload).
    #[must_use]
    pub fn signed_in(identity: ExternalIdentity) -> Self {
        let provider = Self::new();
        provider.hub.publish(Some(identity));
        provider
    }

    /// Queue the outcome of the next popup.
    #[must_use]
    pub fn on_sign_in(self, outcome: Result<ExternalIdentity>) -> Self {
        self.popups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
        self
    }

    /// Report an identity change to subscribers.
    pub fn emit(&self, identity: Option<ExternalIdentity>) {
        self.hub.publish(identity);
    }

    /// Identity the provider currently reports.
    #[must_use]
    pub fn current(&self) -> Option<ExternalIdentity> {
        self.hub.current()
    }

    /// Number of `sign_out` calls received.
    #[must_use]
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.hub.listener_count()
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn sign_in(&self) -> impl Future<Output = Result<ExternalIdentity>> + Send {
        let outcome = self
            .popups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(AuthError::PopupCancelled));
        let hub = self.hub.clone();

        async move {
            if let Ok(identity) = &outcome {
                hub.publish(Some(identity.clone()));
            }
            outcome
        }
    }

    fn sign_out(&self) -> impl Future<Output = ()> + Send {
        let hub = self.hub.clone();
        let sign_outs = Arc::clone(&self.sign_outs);

        async move {
            sign_outs.fetch_add(1, Ordering::SeqCst);
            hub.publish(None);
        }
    }

    fn subscribe(&self, listener: IdentityListener) -> Subscription {
        self.hub.subscribe(listener)
    }
}
