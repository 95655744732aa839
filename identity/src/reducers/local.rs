//! Local credentials reducer.
//!
//! Handles backend login, signup (followed by login) and logout.
//!
//! # Flow
//!
//! ```text
//! Login  → validate → backend.login            → LoginSucceeded | LoginFailed
//! SignUp → validate → backend.signup → login   → LoginSucceeded | SignUpFailed
//! LoginSucceeded → Session Store written → Authenticated
//! Logout → state reset, Session Store cleared → provider sign-out effect
//! ```

use super::EnvMarker;
use crate::actions::AuthAction;
use crate::environment::IdentityEnvironment;
use crate::providers::{BackendAuthClient, IdentityProvider, SessionStore};
use crate::state::{AuthState, AuthStatus, LinkingMode};
use crate::validation::{validate_login, validate_signup};
use agriguard_core::effect::Effect;
use agriguard_core::reducer::Reducer;
use agriguard_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Local credentials reducer.
pub struct LocalAuthReducer<B, P, S> {
    _phantom: EnvMarker<B, P, S>,
}

impl<B, P, S> LocalAuthReducer<B, P, S> {
    /// Create a new local credentials reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<B, P, S> Default for LocalAuthReducer<B, P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, P, S> Clone for LocalAuthReducer<B, P, S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<B, P, S> std::fmt::Debug for LocalAuthReducer<B, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LocalAuthReducer")
    }
}

impl<B, P, S> Reducer for LocalAuthReducer<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = IdentityEnvironment<B, P, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════════
            // Login
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::Login { username, password } => {
                if let Err(error) = validate_login(&username, &password) {
                    return smallvec![Effect::send(AuthAction::LoginFailed { error })];
                }

                state.busy = true;
                state.last_error = None;

                let backend = env.backend.clone();
                smallvec![Effect::future(async move {
                    Some(match backend.login(&username, &password).await {
                        Ok(session) => AuthAction::LoginSucceeded { session },
                        Err(error) => AuthAction::LoginFailed { error },
                    })
                })]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Signup (+ login)
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::SignUp { form } => {
                let profile = match validate_signup(&form) {
                    Ok(profile) => profile,
                    Err(error) => {
                        return smallvec![Effect::send(AuthAction::SignUpFailed { error })];
                    },
                };

                state.busy = true;
                state.last_error = None;

                let backend = env.backend.clone();
                smallvec![Effect::future(async move {
                    if let Err(error) = backend.signup(&profile).await {
                        return Some(AuthAction::SignUpFailed { error });
                    }
                    tracing::debug!(username = %profile.username, "Account created, logging in");

                    Some(match backend.login(&profile.username, &profile.password).await {
                        Ok(session) => AuthAction::LoginSucceeded { session },
                        Err(error) => AuthAction::SignUpFailed { error },
                    })
                })]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Results
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::LoginSucceeded { session } => {
                state.busy = false;
                state.last_error = None;
                state.session = Some(session.clone());
                state.linking_skipped = false;
                state.linking_mode = LinkingMode::Signup;
                state.sync_linking_required();
                env.sessions.save(&session);

                smallvec![Effect::None]
            },

            AuthAction::LoginFailed { error } | AuthAction::SignUpFailed { error } => {
                tracing::warn!(%error, "Local sign-in failed");
                state.busy = false;
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Logout
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::Logout => {
                if state.status() == AuthStatus::SignedOut {
                    return smallvec![Effect::None];
                }

                state.reset();
                env.sessions.clear();

                smallvec![sign_out_provider(env)]
            },

            // Other actions are handled by other reducers
            _ => smallvec![Effect::None],
        }
    }
}

fn sign_out_provider<B, P, S>(env: &IdentityEnvironment<B, P, S>) -> Effect<AuthAction>
where
    B: BackendAuthClient + Clone,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore,
{
    let provider = env.provider.clone();
    Effect::future(async move {
        provider.sign_out().await;
        None
    })
}
