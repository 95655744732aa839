//! Identity reducers.
//!
//! Reducers are functions: `(State, Action, Environment) → (State, Effects)`.
//! Network calls and provider sign-out are returned as effects and executed
//! by the store. The Session Store is synchronous and is read and written
//! inside the reducer, under the store's state lock, so its contents always
//! follow the order in which actions were reduced.

pub mod external;
pub mod local;

use crate::actions::AuthAction;
use crate::environment::IdentityEnvironment;
use crate::providers::{BackendAuthClient, IdentityProvider, SessionStore};
use crate::state::AuthState;
use agriguard_core::{effect::Effect, reducer::Reducer, SmallVec};
use std::marker::PhantomData;

pub use external::ExternalIdentityReducer;
pub use local::LocalAuthReducer;

/// Unified identity reducer.
///
/// Routes commands and events to the local-credentials reducer or the
/// external-identity reducer and logs every status change.
pub struct IdentityReducer<B, P, S> {
    local: LocalAuthReducer<B, P, S>,
    external: ExternalIdentityReducer<B, P, S>,
}

impl<B, P, S> IdentityReducer<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    /// Create a new unified identity reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            local: LocalAuthReducer::new(),
            external: ExternalIdentityReducer::new(),
        }
    }
}

impl<B, P, S> Default for IdentityReducer<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B, P, S> Clone for IdentityReducer<B, P, S> {
    fn clone(&self) -> Self {
        Self {
            local: self.local.clone(),
            external: self.external.clone(),
        }
    }
}

impl<B, P, S> std::fmt::Debug for IdentityReducer<B, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityReducer").finish_non_exhaustive()
    }
}

impl<B, P, S> Reducer for IdentityReducer<B, P, S>
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
        let before = state.status();
        let name = action.name();

        let effects = match action {
            // Local credentials
            AuthAction::Login { .. }
            | AuthAction::SignUp { .. }
            | AuthAction::LoginSucceeded { .. }
            | AuthAction::LoginFailed { .. }
            | AuthAction::SignUpFailed { .. }
            | AuthAction::Logout => self.local.reduce(state, action, env),

            // External identity and account linking
            AuthAction::ExternalIdentityChanged { .. }
            | AuthAction::SignInWithProvider
            | AuthAction::ProviderSignInCompleted { .. }
            | AuthAction::ProviderSignInFailed { .. }
            | AuthAction::SubmitLinking { .. }
            | AuthAction::SkipLinking
            | AuthAction::LinkingCompleted { .. }
            | AuthAction::LinkingFailed { .. } => self.external.reduce(state, action, env),
        };

        let after = state.status();
        if before != after {
            tracing::info!(from = %before, to = %after, action = name, "Identity status changed");
        }
        debug_assert!(state.is_consistent(), "linking_required out of sync after {name}");

        effects
    }
}

/// Zero-sized marker tying a sub-reducer to its environment types.
pub(crate) type EnvMarker<B, P, S> = PhantomData<fn() -> (B, P, S)>;
