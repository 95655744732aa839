//! Identity state types.
//!
//! This module defines the composite state owned by the identity store and
//! the values it is built from. All types are `Clone` to support the
//! functional architecture pattern.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Session & Identity Values
// ═══════════════════════════════════════════════════════════════════════

/// Backend session: the bearer token plus the username it was issued for.
///
/// Persisted as a unit under the keys `authToken` and `username`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token issued by the backend.
    #[serde(rename = "authToken")]
    pub token: String,

    /// Username the token was issued for.
    pub username: String,
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    /// Returns `true` when both halves are present.
    ///
    /// Incomplete sessions are never written and read back as absent.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.username.is_empty()
    }

    /// Value of the `Authorization` header for backend calls.
    ///
    /// # Examples
    ///
    /// ```
    /// # use agriguard_identity::Session;
    /// let session = Session::new("tok-123", "farmer1");
    /// assert_eq!(session.bearer_header(), "Bearer tok-123");
    /// ```
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Identity asserted by the external (OAuth popup) provider.
///
/// Owned by the provider adapter; the identity layer keeps an immutable copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Identifier assigned by the provider. Stable across token refreshes.
    pub provider_user_id: String,

    /// Email address asserted by the provider.
    pub email: String,

    /// Display name, when the provider supplies one.
    pub display_name: Option<String>,
}

impl ExternalIdentity {
    /// Create an identity.
    #[must_use]
    pub fn new(
        provider_user_id: impl Into<String>,
        email: impl Into<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            provider_user_id: provider_user_id.into(),
            email: email.into(),
            display_name,
        }
    }

    /// Name to greet the user with: display name, falling back to email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Account record returned by a successful signup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Backend username.
    #[serde(default)]
    pub username: String,

    /// Registered email.
    #[serde(default)]
    pub email: String,

    /// Full name on the account.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Registration payload sent to the backend.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupProfile {
    /// Email address.
    pub email: String,

    /// Desired username.
    pub username: String,

    /// Full name.
    pub full_name: String,

    /// Phone number (may be empty).
    pub phone: String,

    /// Password.
    pub password: String,
}

impl std::fmt::Debug for SignupProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupProfile")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Core State Types
// ═══════════════════════════════════════════════════════════════════════

/// How the account linking form submits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LinkingMode {
    /// Register a backend account, then log in.
    #[default]
    Signup,

    /// An account already exists: log in only.
    Login,
}

/// Classification of [`AuthState`]. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    /// No session and no external identity.
    SignedOut,

    /// External identity present, no session, linking not skipped.
    LinkingPending,

    /// Backend session present (with or without an external identity).
    Authenticated,

    /// External identity present, no session, linking skipped.
    GuestAuthenticated,
}

impl AuthStatus {
    /// Returns `true` for the two signed-in states.
    #[must_use]
    pub const fn is_signed_in(self) -> bool {
        matches!(self, Self::Authenticated | Self::GuestAuthenticated)
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SignedOut => "signed_out",
            Self::LinkingPending => "linking_pending",
            Self::Authenticated => "authenticated",
            Self::GuestAuthenticated => "guest_authenticated",
        };
        f.write_str(name)
    }
}

/// Root identity state.
///
/// One instance lives inside the identity store for the lifetime of the
/// controller. `linking_required` is kept equal to "external identity
/// present, no session, linking not skipped" by every transition.
///
/// # Examples
///
/// ```
/// # use agriguard_identity::{AuthState, AuthStatus};
/// let state = AuthState::default();
/// assert_eq!(state.status(), AuthStatus::SignedOut);
/// assert!(state.is_consistent());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Backend session, if any.
    pub session: Option<Session>,

    /// Copy of the provider's current identity, if any.
    pub external_identity: Option<ExternalIdentity>,

    /// The external identity still needs a backend account.
    pub linking_required: bool,

    /// The user chose to continue as a guest.
    pub linking_skipped: bool,

    /// How the linking form submits next.
    pub linking_mode: LinkingMode,

    /// A request started by the identity layer is outstanding.
    pub busy: bool,

    /// Most recent failure to show the user.
    pub last_error: Option<AuthError>,
}

impl AuthState {
    /// Initial state for a process that found `session` in storage.
    #[must_use]
    pub fn with_session(session: Option<Session>) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Classify the state.
    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        match (&self.session, &self.external_identity) {
            (Some(_), _) => AuthStatus::Authenticated,
            (None, None) => AuthStatus::SignedOut,
            (None, Some(_)) if self.linking_skipped => AuthStatus::GuestAuthenticated,
            (None, Some(_)) => AuthStatus::LinkingPending,
        }
    }

    /// Check the `linking_required` invariant.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.linking_required == self.needs_linking()
    }

    /// Session or external identity present.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some() || self.external_identity.is_some()
    }

    /// Name to greet the user with.
    ///
    /// Session username, else the external display name, else its email.
    #[must_use]
    pub fn greeting_name(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.username.as_str())
            .or_else(|| self.external_identity.as_ref().map(ExternalIdentity::label))
    }

    /// `Authorization` header for backend calls, when a session exists.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.session.as_ref().map(Session::bearer_header)
    }

    /// Recompute `linking_required` after a transition.
    pub(crate) fn sync_linking_required(&mut self) {
        self.linking_required = self.needs_linking();
    }

    /// Drop every identity field, back to the signed-out state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    const fn needs_linking(&self) -> bool {
        self.external_identity.is_some() && self.session.is_none() && !self.linking_skipped
    }
}
