//! Identity reconciliation controller.
//!
//! The controller owns the identity [`Store`], holds the single provider
//! subscription and runs the pump that forwards provider notifications into
//! the store in arrival order:
//!
//! ```text
//! provider ──listener──► channel ──pump──► ExternalIdentityChanged ──► Store
//!                                                                       │
//!                                                reducer (Session Store read/write)
//!                                                effects (HTTP, provider sign-out)
//! ```
//!
//! Presentation code reads [`IdentityController::state`] or watches
//! [`IdentityController::subscribe`] and triggers transitions through the
//! command methods.

use crate::actions::{AuthAction, LinkingForm, SignupForm};
use crate::environment::IdentityEnvironment;
use crate::error::{AuthError, ControllerError};
use crate::providers::{BackendAuthClient, IdentityListener, IdentityProvider, SessionStore, Subscription};
use crate::reducers::IdentityReducer;
use crate::routing::{resolve, NavbarView, Route, Screen};
use crate::state::{AuthState, AuthStatus, ExternalIdentity, Session};
use agriguard_runtime::{EffectHandle, Store, StoreError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Store type driven by the controller.
pub type IdentityStore<B, P, S> =
    Store<AuthState, AuthAction, IdentityEnvironment<B, P, S>, IdentityReducer<B, P, S>>;

/// Identity reconciliation controller.
///
/// # Example
///
/// ```ignore
/// let controller = IdentityController::start(environment);
///
/// controller.sign_in_with_provider().await?;
/// if controller.status().await == AuthStatus::LinkingPending {
///     controller
///         .submit_linking(LinkingForm::new("farmer1", "secret1", "secret1"))
///         .await?;
/// }
/// ```
pub struct IdentityController<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    store: IdentityStore<B, P, S>,
    subscription: Mutex<Option<Subscription>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    /// Provider notifications received but not yet reduced.
    queued: Arc<watch::Sender<usize>>,
}

impl<B, P, S> IdentityController<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    /// Start the controller.
    ///
    /// Reads the Session Store once for the initial state, creates the store,
    /// subscribes to the provider and spawns the pump. The provider replays
    /// its current identity immediately; call [`Self::settle`] to wait for it
    /// to be applied.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(environment: IdentityEnvironment<B, P, S>) -> Self {
        let initial = AuthState::with_session(environment.sessions.load());
        tracing::info!(status = %initial.status(), "Starting identity controller");

        let store = Store::new(initial, IdentityReducer::new(), environment.clone());

        let (queued, _) = watch::channel(0_usize);
        let queued = Arc::new(queued);
        let (tx, rx) = mpsc::unbounded_channel::<Option<ExternalIdentity>>();

        let pump = tokio::spawn(Self::run_pump(store.clone(), rx, Arc::clone(&queued)));

        let listener_queued = Arc::clone(&queued);
        let listener: IdentityListener = Box::new(move |identity| {
            listener_queued.send_modify(|count| *count += 1);
            if tx.send(identity).is_err() {
                listener_queued.send_modify(|count| *count = count.saturating_sub(1));
            }
        });
        let subscription = environment.provider.subscribe(listener);

        Self {
            store,
            subscription: Mutex::new(Some(subscription)),
            pump: Mutex::new(Some(pump)),
            queued,
        }
    }

    async fn run_pump(
        store: IdentityStore<B, P, S>,
        mut rx: mpsc::UnboundedReceiver<Option<ExternalIdentity>>,
        queued: Arc<watch::Sender<usize>>,
    ) {
        while let Some(identity) = rx.recv().await {
            tracing::debug!(signed_in = identity.is_some(), "Provider identity changed");

            if let Err(error) = store.send(AuthAction::ExternalIdentityChanged { identity }).await {
                tracing::debug!(%error, "Dropping provider notification");
            }
            queued.send_modify(|count| *count = count.saturating_sub(1));
        }
        tracing::debug!("Identity pump stopped");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reading State
    // ═══════════════════════════════════════════════════════════════════════

    /// Snapshot of the current state.
    pub async fn state(&self) -> AuthState {
        self.store.state(AuthState::clone).await
    }

    /// Current classification.
    pub async fn status(&self) -> AuthStatus {
        self.store.state(AuthState::status).await
    }

    /// Watch the state. The receiver holds the latest state and is marked
    /// changed only when a transition changes it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.store.subscribe_state()
    }

    /// Screen to render for `route`.
    pub async fn resolve(&self, route: Route) -> Screen {
        resolve(self.status().await, route)
    }

    /// Navigation bar contents.
    pub async fn navbar(&self) -> NavbarView {
        self.store.state(NavbarView::from_state).await
    }

    /// The environment the controller was started with.
    #[must_use]
    pub fn environment(&self) -> &IdentityEnvironment<B, P, S> {
        self.store.environment()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════════════

    /// Send any action to the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn dispatch(&self, action: AuthAction) -> Result<EffectHandle, StoreError> {
        self.store.send(action).await
    }

    /// Log in with backend credentials.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend failure, or a store error after shutdown.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ControllerError> {
        let action = AuthAction::Login {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self
            .store
            .send_and_wait_for(action, |a| {
                matches!(a, AuthAction::LoginSucceeded { .. } | AuthAction::LoginFailed { .. })
            })
            .await?
        {
            AuthAction::LoginSucceeded { session } => Ok(session),
            other => Err(failure(other)),
        }
    }

    /// Register a backend account and log in with it.
    ///
    /// # Errors
    ///
    /// Returns the validation, signup or login failure, or a store error after shutdown.
    pub async fn sign_up(&self, form: SignupForm) -> Result<Session, ControllerError> {
        match self
            .store
            .send_and_wait_for(AuthAction::SignUp { form }, |a| {
                matches!(a, AuthAction::LoginSucceeded { .. } | AuthAction::SignUpFailed { .. })
            })
            .await?
        {
            AuthAction::LoginSucceeded { session } => Ok(session),
            other => Err(failure(other)),
        }
    }

    /// Run the provider popup.
    ///
    /// # Errors
    ///
    /// Returns `PopupCancelled` / `ProviderError`, or a store error after shutdown.
    pub async fn sign_in_with_provider(&self) -> Result<ExternalIdentity, ControllerError> {
        match self
            .store
            .send_and_wait_for(AuthAction::SignInWithProvider, |a| {
                matches!(
                    a,
                    AuthAction::ProviderSignInCompleted { .. } | AuthAction::ProviderSignInFailed { .. }
                )
            })
            .await?
        {
            AuthAction::ProviderSignInCompleted { identity, .. } => Ok(identity),
            other => Err(failure(other)),
        }
    }

    /// Submit the account linking form.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend failure, or a store error after shutdown.
    pub async fn submit_linking(&self, form: LinkingForm) -> Result<Session, ControllerError> {
        match self
            .store
            .send_and_wait_for(AuthAction::SubmitLinking { form }, |a| {
                matches!(a, AuthAction::LinkingCompleted { .. } | AuthAction::LinkingFailed { .. })
            })
            .await?
        {
            AuthAction::LinkingCompleted { session } => Ok(session),
            other => Err(failure(other)),
        }
    }

    /// Continue as a guest. No-op unless linking is pending.
    ///
    /// # Errors
    ///
    /// Returns a store error after shutdown.
    pub async fn skip_linking(&self) -> Result<(), ControllerError> {
        self.store.send(AuthAction::SkipLinking).await?;
        Ok(())
    }

    /// Sign out of the backend session and the provider. No-op when signed out.
    ///
    /// # Errors
    ///
    /// Returns a store error after shutdown.
    pub async fn logout(&self) -> Result<(), ControllerError> {
        self.store.send(AuthAction::Logout).await?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Wait until queued provider notifications and running effects are
    /// drained.
    pub async fn settle(&self) {
        loop {
            let mut queued = self.queued.subscribe();
            let _ = queued.wait_for(|count| *count == 0).await;
            self.store.wait_until_idle().await;

            if *self.queued.borrow() == 0 && self.store.pending_effects() == 0 {
                break;
            }
        }
    }

    /// Stop the controller.
    ///
    /// Unsubscribes from the provider, lets the pump drain and waits up to
    /// `timeout` for running effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ControllerError> {
        tracing::info!("Shutting down identity controller");

        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }

        let pump = self.pump.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(pump) = pump {
            if tokio::time::timeout(timeout, pump).await.is_err() {
                tracing::warn!("Identity pump did not stop in time");
            }
        }

        self.store.shutdown(timeout).await?;
        Ok(())
    }
}

impl<B, P, S> std::fmt::Debug for IdentityController<B, P, S>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityController")
            .field("queued", &*self.queued.borrow())
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}

/// Pull the error out of a failure action.
fn failure(action: AuthAction) -> ControllerError {
    match action {
        AuthAction::LoginFailed { error }
        | AuthAction::SignUpFailed { error }
        | AuthAction::ProviderSignInFailed { error }
        | AuthAction::LinkingFailed { error, .. } => ControllerError::Auth(error),
        other => ControllerError::Auth(AuthError::NetworkError(format!(
            "unexpected result action: {}",
            other.name()
        ))),
    }
}
