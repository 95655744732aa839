//! Identity actions.
//!
//! Actions are the only inputs to the identity reducer: commands issued by
//! the presentation layer and events produced by effects or by the external
//! identity provider.

use crate::error::AuthError;
use crate::state::{ExternalIdentity, LinkingMode, Session};

/// Local registration form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    /// Full name.
    pub full_name: String,

    /// Email address.
    pub email: String,

    /// Desired username.
    pub username: String,

    /// Phone number (optional, may be empty).
    pub phone: String,

    /// Password.
    pub password: String,

    /// Password confirmation.
    pub confirm_password: String,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

/// Account linking form: a backend username and password for the current
/// external identity.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LinkingForm {
    /// Backend username.
    pub username: String,

    /// Password.
    pub password: String,

    /// Password confirmation.
    pub confirm_password: String,
}

impl LinkingForm {
    /// Create a linking form.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

impl std::fmt::Debug for LinkingForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkingForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Identity actions.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════════════

    /// Log in with backend credentials.
    Login {
        /// Backend username.
        username: String,
        /// Password.
        password: String,
    },

    /// Register a backend account, then log in with it.
    SignUp {
        /// Registration form.
        form: SignupForm,
    },

    /// Open the external provider's sign-in popup.
    SignInWithProvider,

    /// Submit the account linking form.
    SubmitLinking {
        /// Linking form.
        form: LinkingForm,
    },

    /// Continue as a guest without linking.
    SkipLinking,

    /// Sign out everywhere.
    Logout,

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════

    /// The provider reported its current identity.
    ExternalIdentityChanged {
        /// Current identity, `None` when signed out.
        identity: Option<ExternalIdentity>,
    },

    /// The sign-in popup completed.
    ProviderSignInCompleted {
        /// Identity the provider signed in.
        identity: ExternalIdentity,
    },

    /// The sign-in popup failed or was dismissed.
    ProviderSignInFailed {
        /// Failure.
        error: AuthError,
    },

    /// Local login (or signup followed by login) produced a session.
    LoginSucceeded {
        /// New session.
        session: Session,
    },

    /// Local login failed.
    LoginFailed {
        /// Failure.
        error: AuthError,
    },

    /// Local signup (or the login following it) failed.
    SignUpFailed {
        /// Failure.
        error: AuthError,
    },

    /// The linking flow produced a session for the external identity.
    LinkingCompleted {
        /// New session.
        session: Session,
    },

    /// The linking flow failed.
    LinkingFailed {
        /// Failure.
        error: AuthError,
        /// Mode the next submission should use.
        mode: LinkingMode,
    },
}

impl AuthAction {
    /// Short action name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::SignUp { .. } => "sign_up",
            Self::SignInWithProvider => "sign_in_with_provider",
            Self::SubmitLinking { .. } => "submit_linking",
            Self::SkipLinking => "skip_linking",
            Self::Logout => "logout",
            Self::ExternalIdentityChanged { .. } => "external_identity_changed",
            Self::ProviderSignInCompleted { .. } => "provider_sign_in_completed",
            Self::ProviderSignInFailed { .. } => "provider_sign_in_failed",
            Self::LoginSucceeded { .. } => "login_succeeded",
            Self::LoginFailed { .. } => "login_failed",
            Self::SignUpFailed { .. } => "sign_up_failed",
            Self::LinkingCompleted { .. } => "linking_completed",
            Self::LinkingFailed { .. } => "linking_failed",
        }
    }
}

// Passwords stay out of logs.
impl std::fmt::Debug for AuthAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::SignUp { form } => f.debug_struct("SignUp").field("form", form).finish(),
            Self::SubmitLinking { form } => {
                f.debug_struct("SubmitLinking").field("form", form).finish()
            },
            Self::ExternalIdentityChanged { identity } => f
                .debug_struct("ExternalIdentityChanged")
                .field("identity", identity)
                .finish(),
            Self::ProviderSignInCompleted { identity } => f
                .debug_struct("ProviderSignInCompleted")
                .field("identity", identity)
                .finish(),
            Self::ProviderSignInFailed { error }
            | Self::LoginFailed { error }
            | Self::SignUpFailed { error } => {
                f.debug_struct(self.name()).field("error", error).finish()
            },
            Self::LoginSucceeded { session } | Self::LinkingCompleted { session } => {
                f.debug_struct(self.name()).field("session", session).finish()
            },
            Self::LinkingFailed { error, mode } => f
                .debug_struct("LinkingFailed")
                .field("error", error)
                .field("mode", mode)
                .finish(),
            Self::SignInWithProvider | Self::SkipLinking | Self::Logout => {
                f.write_str(self.name())
            },
        }
    }
}
