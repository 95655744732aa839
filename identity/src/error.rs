//! Error types for identity operations.

use agriguard_runtime::StoreError;
use thiserror::Error;

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the identity layer.
///
/// Errors travel inside actions, so they are `Clone + PartialEq`. Every
/// variant except [`AuthError::PopupCancelled`] carries the text shown to
/// the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════

    /// The backend rejected the username/password pair.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The email or username is already taken by a backend account.
    #[error("{0}")]
    AlreadyRegistered(String),

    /// Input was rejected before or by the backend.
    #[error("{0}")]
    ValidationError(String),

    // ═══════════════════════════════════════════════════════════
    // Transport Errors
    // ═══════════════════════════════════════════════════════════

    /// The request did not complete, or the backend failed unexpectedly.
    #[error("{0}")]
    NetworkError(String),

    // ═══════════════════════════════════════════════════════════
    // External Identity Provider
    // ═══════════════════════════════════════════════════════════

    /// The user dismissed the sign-in popup.
    #[error("Sign-in popup was closed")]
    PopupCancelled,

    /// The external identity provider reported a failure.
    #[error("{0}")]
    ProviderError(String),

    // ═══════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════

    /// The durable session store could not be read or written.
    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AuthError {
    /// Returns `true` if the user can fix this error by re-entering data.
    ///
    /// # Examples
    ///
    /// ```
    /// # use agriguard_identity::AuthError;
    /// assert!(AuthError::ValidationError("Passwords do not match".into()).is_user_error());
    /// assert!(!AuthError::NetworkError("timeout".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials(_) | Self::AlreadyRegistered(_) | Self::ValidationError(_)
        )
    }

    /// Returns `true` if repeating the same action may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use agriguard_identity::AuthError;
    /// assert!(AuthError::NetworkError("connection refused".into()).is_transient());
    /// assert!(!AuthError::PopupCancelled.is_transient());
    /// ```
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ProviderError(_))
    }
}

/// Errors surfaced by [`crate::IdentityController`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The requested operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The underlying store rejected the action.
    #[error("Identity store error: {0}")]
    Store(#[from] StoreError),
}
