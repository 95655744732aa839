//! Identity environment.
//!
//! This module defines the environment type for dependency injection
//! in the identity reducer.

use crate::config::IdentityConfig;
use crate::providers::{BackendAuthClient, HttpBackendClient, IdentityProvider, SessionStore};
use crate::stores::{FallbackSessionStore, FileSessionStore};

/// Identity environment.
///
/// Contains all external dependencies needed by the identity reducer.
///
/// # Type Parameters
///
/// - `B`: Backend auth client
/// - `P`: External identity provider
/// - `S`: Durable session store
pub struct IdentityEnvironment<B, P, S>
where
    B: BackendAuthClient + Clone,
    P: IdentityProvider + Clone,
    S: SessionStore,
{
    /// Backend auth client (HTTP in production).
    pub backend: B,

    /// External identity provider (OAuth popup).
    pub provider: P,

    /// Session store, already wrapped in the degrading facade.
    pub sessions: FallbackSessionStore<S>,
}

impl<B, P, S> IdentityEnvironment<B, P, S>
where
    B: BackendAuthClient + Clone,
    P: IdentityProvider + Clone,
    S: SessionStore,
{
    /// Create a new identity environment around a durable session store.
    #[must_use]
    pub fn new(backend: B, provider: P, sessions: S) -> Self {
        Self {
            backend,
            provider,
            sessions: FallbackSessionStore::new(sessions),
        }
    }
}

impl<P> IdentityEnvironment<HttpBackendClient, P, FileSessionStore>
where
    P: IdentityProvider + Clone,
{
    /// Production wiring: HTTP backend and session file named by `config`.
    #[must_use]
    pub fn from_config(provider: P, config: &IdentityConfig) -> Self {
        Self::new(
            HttpBackendClient::new(config),
            provider,
            FileSessionStore::new(config.session_file.clone()),
        )
    }
}

impl<B, P, S> Clone for IdentityEnvironment<B, P, S>
where
    B: BackendAuthClient + Clone,
    P: IdentityProvider + Clone,
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            provider: self.provider.clone(),
            sessions: self.sessions.clone(),
        }
    }
}
