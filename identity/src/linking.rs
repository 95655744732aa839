//! Account linking flow.
//!
//! Associates a backend account with an external identity that has none:
//!
//! ```text
//! mode = Signup:  signup ─┬─ ok ──────────────────┐
//!                         ├─ AlreadyRegistered ───┤ (mode → Login)
//!                         └─ other error → fail   │
//!                                                 ▼
//! mode = Login:  ───────────────────────────►  login ─┬─ ok → session
//!                                                     └─ error → fail
//! ```
//!
//! A registration conflict is recovered exactly once by logging in with the
//! same credentials; the signup error itself is never surfaced.

use crate::error::AuthError;
use crate::providers::BackendAuthClient;
use crate::state::{LinkingMode, Session, SignupProfile};

/// Surfaced when the login that follows a registration conflict is rejected.
pub const ACCOUNT_EXISTS_MESSAGE: &str =
    "Account exists. Please enter your username and password to log in.";

/// Result of one linking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingOutcome {
    /// Session for the linked account, or the failure to surface.
    pub result: Result<Session, AuthError>,

    /// Mode the next submission should use.
    pub mode: LinkingMode,
}

impl LinkingOutcome {
    const fn failed(error: AuthError, mode: LinkingMode) -> Self {
        Self {
            result: Err(error),
            mode,
        }
    }
}

/// Run the linking flow once.
pub async fn link_account<B>(backend: &B, mode: LinkingMode, profile: &SignupProfile) -> LinkingOutcome
where
    B: BackendAuthClient,
{
    let mut mode = mode;
    let mut recovering_conflict = false;

    if mode == LinkingMode::Signup {
        match backend.signup(profile).await {
            Ok(_) => {
                tracing::debug!(username = %profile.username, "Backend account created for external identity");
            },
            Err(AuthError::AlreadyRegistered(detail)) => {
                tracing::info!(username = %profile.username, %detail, "Account already exists, logging in instead");
                metrics::counter!("identity.linking.conflict_fallback").increment(1);
                mode = LinkingMode::Login;
                recovering_conflict = true;
            },
            Err(error) => return LinkingOutcome::failed(error, mode),
        }
    }

    match backend.login(&profile.username, &profile.password).await {
        Ok(session) => LinkingOutcome {
            result: Ok(session),
            mode,
        },
        Err(AuthError::InvalidCredentials(_)) if recovering_conflict => LinkingOutcome::failed(
            AuthError::AlreadyRegistered(ACCOUNT_EXISTS_MESSAGE.to_string()),
            mode,
        ),
        Err(error) => LinkingOutcome::failed(error, mode),
    }
}
