//! External identity reducer.
//!
//! Reconciles the provider's identity with the backend session and drives
//! the account linking flow.
//!
//! # Flow
//!
//! ```text
//! 1. ExternalIdentityChanged / ProviderSignInCompleted
//!      session held        → Authenticated (identity recorded)
//!      store has a session → adopt it → Authenticated (store read at reduce time)
//!      same identity       → no change (token refresh)
//!      new identity        → LinkingPending
//! 2. SubmitLinking → validate → link_account effect → LinkingCompleted | LinkingFailed
//! 3. SkipLinking (from LinkingPending) → GuestAuthenticated
//! ```

use super::EnvMarker;
use crate::actions::AuthAction;
use crate::environment::IdentityEnvironment;
use crate::error::AuthError;
use crate::linking::link_account;
use crate::providers::{BackendAuthClient, IdentityProvider, SessionStore};
use crate::state::{AuthState, AuthStatus, ExternalIdentity, LinkingMode, Session};
use crate::validation::validate_linking;
use agriguard_core::effect::Effect;
use agriguard_core::reducer::Reducer;
use agriguard_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// External identity reducer.
pub struct ExternalIdentityReducer<B, P, S> {
    _phantom: EnvMarker<B, P, S>,
}

impl<B, P, S> ExternalIdentityReducer<B, P, S> {
    /// Create a new external identity reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<B, P, S> Default for ExternalIdentityReducer<B, P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, P, S> Clone for ExternalIdentityReducer<B, P, S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<B, P, S> std::fmt::Debug for ExternalIdentityReducer<B, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExternalIdentityReducer")
    }
}

impl<B, P, S> ExternalIdentityReducer<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    /// Fold a provider report into the state.
    ///
    /// The Session Store is consulted here, at reduce time, so a session
    /// cleared by an earlier action is never adopted.
    fn apply_identity(
        state: &mut AuthState,
        identity: Option<ExternalIdentity>,
        env: &IdentityEnvironment<B, P, S>,
    ) {
        match identity {
            Some(identity) => {
                let fresh = state
                    .external_identity
                    .as_ref()
                    .is_none_or(|current| current.provider_user_id != identity.provider_user_id);

                if state.session.is_none() {
                    if let Some(session) = stored_session(env) {
                        tracing::info!(username = %session.username, "Adopting persisted session");
                        state.session = Some(session);
                        state.linking_skipped = false;
                        state.linking_mode = LinkingMode::Signup;
                        state.last_error = None;
                    } else if fresh {
                        tracing::info!(email = %identity.email, "External identity has no backend session");
                        state.linking_skipped = false;
                        state.linking_mode = LinkingMode::Signup;
                        state.last_error = None;
                    }
                } else if fresh {
                    state.linking_skipped = false;
                }
                state.external_identity = Some(identity);
            },

            None => {
                let had_identity = state.external_identity.take().is_some();
                state.linking_skipped = false;

                // A local session wins over a provider sign-out.
                if state.session.is_none() {
                    if let Some(session) = stored_session(env) {
                        tracing::info!(username = %session.username, "Adopting persisted session");
                        state.session = Some(session);
                    } else {
                        state.reset();
                        if had_identity {
                            env.sessions.clear();
                        }
                    }
                }
            },
        }

        state.sync_linking_required();
    }
}

/// Complete session held by the Session Store, if any.
fn stored_session<B, P, S>(env: &IdentityEnvironment<B, P, S>) -> Option<Session>
where
    B: BackendAuthClient + Clone,
    P: IdentityProvider + Clone,
    S: SessionStore,
{
    env.sessions.load().filter(Session::is_complete)
}

impl<B, P, S> Reducer for ExternalIdentityReducer<B, P, S>
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
            // Provider Reports
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::ExternalIdentityChanged { identity } => {
                Self::apply_identity(state, identity, env);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Popup Sign-in
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::SignInWithProvider => {
                state.busy = true;
                state.last_error = None;

                let provider = env.provider.clone();
                smallvec![Effect::future(async move {
                    Some(match provider.sign_in().await {
                        Ok(identity) => AuthAction::ProviderSignInCompleted { identity },
                        Err(error) => AuthAction::ProviderSignInFailed { error },
                    })
                })]
            },

            AuthAction::ProviderSignInCompleted { identity } => {
                state.busy = false;
                Self::apply_identity(state, Some(identity), env);
                smallvec![Effect::None]
            },

            AuthAction::ProviderSignInFailed { error } => {
                state.busy = false;
                if error == AuthError::PopupCancelled {
                    tracing::debug!("Sign-in popup dismissed");
                } else {
                    tracing::warn!(%error, "External sign-in failed");
                    state.last_error = Some(error);
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Account Linking
            // ═══════════════════════════════════════════════════════════════════
            AuthAction::SubmitLinking { form } => {
                let mode = state.linking_mode;

                let identity = match (&state.external_identity, state.status()) {
                    (Some(identity), AuthStatus::LinkingPending) => identity,
                    _ => {
                        let error = AuthError::ValidationError(
                            "No external account is waiting to be linked".to_string(),
                        );
                        return smallvec![Effect::send(AuthAction::LinkingFailed { error, mode })];
                    },
                };

                let profile = match validate_linking(&form, identity) {
                    Ok(profile) => profile,
                    Err(error) => {
                        return smallvec![Effect::send(AuthAction::LinkingFailed { error, mode })];
                    },
                };

                state.busy = true;
                state.last_error = None;

                let backend = env.backend.clone();
                smallvec![Effect::future(async move {
                    let outcome = link_account(&backend, mode, &profile).await;
                    Some(match outcome.result {
                        Ok(session) => AuthAction::LinkingCompleted { session },
                        Err(error) => AuthAction::LinkingFailed {
                            error,
                            mode: outcome.mode,
                        },
                    })
                })]
            },

            AuthAction::LinkingCompleted { session } => {
                state.busy = false;

                if state.external_identity.is_none() || state.session.is_some() {
                    tracing::warn!("Linking finished after the external identity changed, ignoring");
                    return smallvec![Effect::None];
                }

                tracing::info!(username = %session.username, "External identity linked");
                state.session = Some(session.clone());
                state.linking_skipped = false;
                state.linking_mode = LinkingMode::Signup;
                state.last_error = None;
                state.sync_linking_required();
                env.sessions.save(&session);

                smallvec![Effect::None]
            },

            AuthAction::LinkingFailed { error, mode } => {
                tracing::warn!(%error, ?mode, "Account linking failed");
                state.busy = false;
                state.linking_mode = mode;
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::SkipLinking => {
                if state.status() != AuthStatus::LinkingPending {
                    return smallvec![Effect::None];
                }

                tracing::info!("Continuing as guest without linking");
                state.linking_skipped = true;
                state.last_error = None;
                state.sync_linking_required();
                smallvec![Effect::None]
            },

            // Other actions are handled by other reducers
            _ => smallvec![Effect::None],
        }
    }
}
