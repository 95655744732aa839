//! Identity providers.
//!
//! This module defines traits for the external collaborators of the identity
//! layer. The reducer depends on these traits and the application injects
//! concrete implementations through [`crate::IdentityEnvironment`].
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, scripted, deterministic)
//! - **Production**: Use the HTTP backend, the session file and a real
//!   OAuth popup adapter

use crate::error::Result;
use crate::state::{Account, ExternalIdentity, Session, SignupProfile};
use std::future::Future;

pub mod http_backend;
pub mod identity_hub;

pub use http_backend::HttpBackendClient;
pub use identity_hub::{IdentityHub, IdentityListener, Subscription};

/// Durable storage for exactly one [`Session`].
///
/// Calls are synchronous and have no network or timing side effects.
/// Implementations report failures as [`crate::AuthError::StorageUnavailable`];
/// [`crate::stores::FallbackSessionStore`] turns those into "absent".
pub trait SessionStore: Send + Sync {
    /// Read the stored session.
    ///
    /// # Returns
    ///
    /// `None` when nothing (or only half a session) is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the storage cannot be read.
    fn load(&self) -> Result<Option<Session>>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the storage cannot be written.
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the storage cannot be written.
    fn clear(&self) -> Result<()>;
}

/// Backend account API.
///
/// Stateless: implementations never touch a [`SessionStore`].
pub trait BackendAuthClient: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The backend rejects the pair → `AuthError::InvalidCredentials`
    /// - The request fails → `AuthError::NetworkError`
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session>> + Send;

    /// Register a backend account.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email or username is taken → `AuthError::AlreadyRegistered`
    /// - The backend rejects the input → `AuthError::ValidationError`
    /// - Anything else → `AuthError::NetworkError`
    fn signup(&self, profile: &SignupProfile) -> impl Future<Output = Result<Account>> + Send;
}

/// External (OAuth popup) identity provider adapter.
pub trait IdentityProvider: Send + Sync {
    /// Run the popup sign-in flow.
    ///
    /// Suspends until the popup completes or is dismissed. A successful
    /// sign-in is also reported to subscribers.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The user closes the popup → `AuthError::PopupCancelled`
    /// - The provider fails → `AuthError::ProviderError`
    fn sign_in(&self) -> impl Future<Output = Result<ExternalIdentity>> + Send;

    /// Sign out of the provider. Best effort; never fails to the caller.
    fn sign_out(&self) -> impl Future<Output = ()> + Send;

    /// Register a listener for identity changes.
    ///
    /// The listener is invoked once immediately with the current identity
    /// (or `None`) and again on every change. Dropping the returned
    /// [`Subscription`] unregisters it.
    fn subscribe(&self, listener: IdentityListener) -> Subscription;
}
