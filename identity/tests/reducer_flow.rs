//! Reducer-level tests for identity reconciliation and account linking.

use agriguard_core::reducer::Reducer;
use agriguard_identity::{
    actions::{AuthAction, LinkingForm, SignupForm},
    environment::IdentityEnvironment,
    error::AuthError,
    linking::ACCOUNT_EXISTS_MESSAGE,
    mocks::{BackendCall, MockBackendClient, MockIdentityProvider},
    reducers::IdentityReducer,
    state::{AuthState, AuthStatus, ExternalIdentity, LinkingMode, Session},
    providers::SessionStore,
    stores::MemorySessionStore,
};
use agriguard_testing::{
    assertions::{assert_has_future_effect, assert_no_effects},
    effects::run_effects,
    ReducerTest,
};

type TestEnv = IdentityEnvironment<MockBackendClient, MockIdentityProvider, MemorySessionStore>;
type TestReducer = IdentityReducer<MockBackendClient, MockIdentityProvider, MemorySessionStore>;

struct Fixture {
    env: TestEnv,
    backend: MockBackendClient,
    provider: MockIdentityProvider,
    storage: MemorySessionStore,
}

fn fixture(backend: MockBackendClient) -> Fixture {
    fixture_with_storage(backend, MemorySessionStore::new())
}

fn fixture_with_storage(backend: MockBackendClient, storage: MemorySessionStore) -> Fixture {
    let provider = MockIdentityProvider::new();
    Fixture {
        env: IdentityEnvironment::new(backend.clone(), provider.clone(), storage.clone()),
        backend,
        provider,
        storage,
    }
}

fn identity() -> ExternalIdentity {
    ExternalIdentity::new("google-uid-1", "a@x.com", Some("Ada Farmer".into()))
}

fn pending_state() -> AuthState {
    let mut state = AuthState::default();
    let env = fixture(MockBackendClient::new()).env;
    let _ = TestReducer::new().reduce(
        &mut state,
        AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        },
        &env,
    );
    state
}

fn guest_state() -> AuthState {
    let mut state = pending_state();
    let env = fixture(MockBackendClient::new()).env;
    let _ = TestReducer::new().reduce(&mut state, AuthAction::SkipLinking, &env);
    state
}

/// Reduce `action`, run its effects and feed every produced action back in,
/// until nothing is left.
async fn drive(reducer: &TestReducer, state: &mut AuthState, action: AuthAction, env: &TestEnv) -> Vec<AuthAction> {
    let mut seen = Vec::new();
    let mut queue = vec![action];
    while let Some(action) = queue.pop() {
        let effects = reducer.reduce(state, action, env);
        for produced in run_effects(effects).await {
            seen.push(produced.clone());
            queue.push(produced);
        }
    }
    seen
}

// ═══════════════════════════════════════════════════════════════════════════
// Provider reports
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_external_sign_in_without_session_requires_linking() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(AuthState::default())
        .when_action(AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::LinkingPending);
            assert!(state.linking_required);
            assert!(!state.linking_skipped);
        })
        .then_effects(|effects| assert_no_effects(effects))
        .run();
}

#[test]
fn test_external_sign_in_adopts_persisted_session() {
    let fx = fixture_with_storage(
        MockBackendClient::new(),
        MemorySessionStore::with_session(Some(Session::new("tok-9", "farmer1"))),
    );

    ReducerTest::new(TestReducer::new())
        .with_env(fx.env)
        .given_state(AuthState::default())
        .when_action(AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::Authenticated);
            assert_eq!(state.session, Some(Session::new("tok-9", "farmer1")));
            assert!(!state.linking_required);
        })
        .run();
}

#[test]
fn test_partial_persisted_session_is_ignored() {
    let storage = MemorySessionStore::new();
    let _ = storage.save(&Session::new("", "farmer1"));

    ReducerTest::new(TestReducer::new())
        .with_env(fixture_with_storage(MockBackendClient::new(), storage).env)
        .given_state(AuthState::default())
        .when_action(AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::LinkingPending);
            assert_eq!(state.session, None);
        })
        .run();
}

#[test]
fn test_session_cleared_before_report_is_not_adopted() {
    let fx = fixture_with_storage(
        MockBackendClient::new(),
        MemorySessionStore::with_session(Some(Session::new("tok-1", "farmer1"))),
    );
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    let _ = reducer.reduce(
        &mut state,
        AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        },
        &fx.env,
    );
    assert_eq!(state.status(), AuthStatus::Authenticated);

    let _ = reducer.reduce(&mut state, AuthAction::Logout, &fx.env);
    assert_eq!(fx.storage.get(), None);

    // The provider re-delivers the identity after the logout was reduced.
    let _ = reducer.reduce(
        &mut state,
        AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        },
        &fx.env,
    );
    assert_eq!(state.session, None);
    assert_eq!(state.status(), AuthStatus::LinkingPending);
}

#[test]
fn test_redelivered_identity_keeps_guest_mode() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(guest_state())
        .when_action(AuthAction::ExternalIdentityChanged {
            identity: Some(identity()),
        })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::GuestAuthenticated);
            assert!(state.linking_skipped);
        })
        .run();
}

#[test]
fn test_different_identity_restarts_linking() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(guest_state())
        .when_action(AuthAction::ExternalIdentityChanged {
            identity: Some(ExternalIdentity::new("google-uid-2", "b@x.com", None)),
        })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::LinkingPending);
            assert_eq!(
                state.external_identity.as_ref().map(|i| i.email.as_str()),
                Some("b@x.com")
            );
        })
        .run();
}

#[test]
fn test_provider_sign_out_keeps_local_session() {
    let state = AuthState {
        session: Some(Session::new("tok-1", "farmer1")),
        external_identity: Some(identity()),
        ..AuthState::default()
    };

    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(state)
        .when_action(AuthAction::ExternalIdentityChanged { identity: None })
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::Authenticated);
            assert_eq!(state.external_identity, None);
        })
        .then_effects(|effects| assert_no_effects(effects))
        .run();
}

#[test]
fn test_provider_sign_out_from_guest_resets_state() {
    let fx = fixture(MockBackendClient::new());

    ReducerTest::new(TestReducer::new())
        .with_env(fx.env)
        .given_state(guest_state())
        .when_action(AuthAction::ExternalIdentityChanged { identity: None })
        .then_state(|state| assert_eq!(*state, AuthState::default()))
        .then_effects(|effects| assert_no_effects(effects))
        .run();

    assert_eq!(fx.storage.get(), None);
}

#[test]
fn test_store_writes_follow_reduce_order() {
    let fx = fixture(MockBackendClient::new());

    // Sign-out from guest, then a login, reduced back to back without
    // running any effects in between.
    let state = ReducerTest::new(TestReducer::new())
        .with_env(fx.env)
        .given_state(guest_state())
        .when_actions([
            AuthAction::ExternalIdentityChanged { identity: None },
            AuthAction::LoginSucceeded {
                session: Session::new("tok-5", "farmer1"),
            },
        ])
        .then_state(|state| assert_eq!(state.status(), AuthStatus::Authenticated))
        .run();

    assert_eq!(state.session, Some(Session::new("tok-5", "farmer1")));
    assert_eq!(fx.storage.get(), Some(Session::new("tok-5", "farmer1")));
}

// ═══════════════════════════════════════════════════════════════════════════
// Logout
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_logout_when_signed_out_is_a_no_op() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(AuthState::default())
        .when_action(AuthAction::Logout)
        .then_state(|state| assert_eq!(*state, AuthState::default()))
        .then_effects(|effects| assert_no_effects(effects))
        .run();
}

#[tokio::test]
async fn test_logout_clears_store_and_signs_out_provider() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    drive(
        &reducer,
        &mut state,
        AuthAction::LoginSucceeded {
            session: Session::new("tok-1", "farmer1"),
        },
        &fx.env,
    )
    .await;
    assert_eq!(fx.storage.get(), Some(Session::new("tok-1", "farmer1")));

    let effects = reducer.reduce(&mut state, AuthAction::Logout, &fx.env);
    // Cleared before the provider sign-out effect has run.
    assert_eq!(fx.storage.get(), None);
    assert_eq!(fx.provider.sign_out_count(), 0);
    assert!(run_effects(effects).await.is_empty());

    assert_eq!(state.status(), AuthStatus::SignedOut);
    assert_eq!(fx.storage.get(), None);
    assert_eq!(fx.provider.sign_out_count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Account linking
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_linking_validation_blocks_network() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = pending_state();

    let produced = drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("abc", "abc", "abc"),
        },
        &fx.env,
    )
    .await;

    assert!(matches!(
        produced.as_slice(),
        [AuthAction::LinkingFailed {
            error: AuthError::ValidationError(_),
            ..
        }]
    ));
    assert_eq!(fx.backend.call_count(), 0);
    assert_eq!(state.status(), AuthStatus::LinkingPending);
    assert!(matches!(state.last_error, Some(AuthError::ValidationError(_))));
}

#[tokio::test]
async fn test_linking_signup_then_login_authenticates() {
    let backend = MockBackendClient::new().on_login(Ok(Session::new("tok-123", "farmer1")));
    let fx = fixture(backend);
    let reducer = TestReducer::new();
    let mut state = pending_state();

    drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("farmer1", "secret1", "secret1"),
        },
        &fx.env,
    )
    .await;

    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert!(!state.busy);
    assert_eq!(fx.storage.get(), Some(Session::new("tok-123", "farmer1")));

    let calls = fx.backend.calls();
    let [BackendCall::Signup(profile), BackendCall::Login { username, .. }] = calls.as_slice() else {
        unreachable!("expected signup then login, got {calls:?}");
    };
    assert_eq!(profile.email, "a@x.com");
    assert_eq!(profile.full_name, "Ada Farmer");
    assert_eq!(profile.phone, "");
    assert_eq!(username, "farmer1");
}

#[tokio::test]
async fn test_rejected_fallback_switches_form_to_login_mode() {
    let backend = MockBackendClient::new()
        .on_signup(Err(AuthError::AlreadyRegistered("Email already registered".into())))
        .on_login(Err(AuthError::InvalidCredentials("Incorrect password".into())))
        .on_login(Ok(Session::new("tok-2", "farmer1")));
    let fx = fixture(backend);
    let reducer = TestReducer::new();
    let mut state = pending_state();

    drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("farmer1", "wrong1", "wrong1"),
        },
        &fx.env,
    )
    .await;

    assert_eq!(state.status(), AuthStatus::LinkingPending);
    assert_eq!(state.linking_mode, LinkingMode::Login);
    assert_eq!(
        state.last_error,
        Some(AuthError::AlreadyRegistered(ACCOUNT_EXISTS_MESSAGE.into()))
    );

    // Second attempt goes straight to login.
    drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("farmer1", "secret1", "secret1"),
        },
        &fx.env,
    )
    .await;

    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert_eq!(state.linking_mode, LinkingMode::Signup);
    assert_eq!(fx.backend.call_count(), 3);
}

#[tokio::test]
async fn test_network_failure_keeps_linking_pending() {
    let backend = MockBackendClient::new().on_signup(Err(AuthError::NetworkError("offline".into())));
    let fx = fixture(backend);
    let reducer = TestReducer::new();
    let mut state = pending_state();

    drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("farmer1", "secret1", "secret1"),
        },
        &fx.env,
    )
    .await;

    assert_eq!(state.status(), AuthStatus::LinkingPending);
    assert_eq!(state.last_error, Some(AuthError::NetworkError("offline".into())));
    assert!(!state.linking_skipped);
}

#[tokio::test]
async fn test_submit_linking_outside_pending_is_rejected() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    let produced = drive(
        &reducer,
        &mut state,
        AuthAction::SubmitLinking {
            form: LinkingForm::new("farmer1", "secret1", "secret1"),
        },
        &fx.env,
    )
    .await;

    assert!(matches!(produced.as_slice(), [AuthAction::LinkingFailed { .. }]));
    assert_eq!(fx.backend.call_count(), 0);
    assert_eq!(state.status(), AuthStatus::SignedOut);
}

#[test]
fn test_linking_completed_after_sign_out_is_ignored() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(AuthState::default())
        .when_action(AuthAction::LinkingCompleted {
            session: Session::new("tok-late", "farmer1"),
        })
        .then_state(|state| assert_eq!(state.status(), AuthStatus::SignedOut))
        .then_effects(|effects| assert_no_effects(effects))
        .run();
}

#[test]
fn test_skip_only_applies_while_pending() {
    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(AuthState::default())
        .when_action(AuthAction::SkipLinking)
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::SignedOut);
            assert!(!state.linking_skipped);
        })
        .run();

    ReducerTest::new(TestReducer::new())
        .with_env(fixture(MockBackendClient::new()).env)
        .given_state(pending_state())
        .when_action(AuthAction::SkipLinking)
        .then_state(|state| {
            assert_eq!(state.status(), AuthStatus::GuestAuthenticated);
            assert!(!state.linking_required);
        })
        .run();
}

// ═══════════════════════════════════════════════════════════════════════════
// Local credentials
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_login_success_persists_session() {
    let fx = fixture(MockBackendClient::new().on_login(Ok(Session::new("tok-7", "farmer1"))));
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    let effects = reducer.reduce(
        &mut state,
        AuthAction::Login {
            username: "farmer1".into(),
            password: "pw".into(),
        },
        &fx.env,
    );
    assert!(state.busy);
    assert_has_future_effect(&effects);

    let produced = run_effects(effects).await;
    assert_eq!(
        produced,
        vec![AuthAction::LoginSucceeded {
            session: Session::new("tok-7", "farmer1")
        }]
    );

    for action in produced {
        let effects = reducer.reduce(&mut state, action, &fx.env);
        // Written while reducing, not by a later effect.
        assert_eq!(fx.storage.get(), Some(Session::new("tok-7", "farmer1")));
        assert_no_effects(&effects);
    }
    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert!(!state.busy);
    assert_eq!(fx.storage.get(), Some(Session::new("tok-7", "farmer1")));
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    drive(
        &reducer,
        &mut state,
        AuthAction::Login {
            username: String::new(),
            password: "pw".into(),
        },
        &fx.env,
    )
    .await;

    assert_eq!(fx.backend.call_count(), 0);
    assert!(matches!(state.last_error, Some(AuthError::ValidationError(_))));
}

#[tokio::test]
async fn test_sign_up_logs_in_with_new_account() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    let form = SignupForm {
        full_name: "Ada Farmer".into(),
        email: "ada@farm.io".into(),
        username: "ada".into(),
        phone: "555-0100".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    };
    drive(&reducer, &mut state, AuthAction::SignUp { form }, &fx.env).await;

    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert_eq!(fx.storage.get(), Some(Session::new("tok-ada", "ada")));
    assert!(matches!(
        fx.backend.calls().as_slice(),
        [BackendCall::Signup(_), BackendCall::Login { .. }]
    ));
}

#[tokio::test]
async fn test_sign_up_conflict_is_surfaced() {
    let backend =
        MockBackendClient::new().on_signup(Err(AuthError::AlreadyRegistered("Username already registered".into())));
    let fx = fixture(backend);
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    let form = SignupForm {
        full_name: "Ada Farmer".into(),
        email: "ada@farm.io".into(),
        username: "ada".into(),
        phone: String::new(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    };
    drive(&reducer, &mut state, AuthAction::SignUp { form }, &fx.env).await;

    assert_eq!(state.status(), AuthStatus::SignedOut);
    assert_eq!(
        state.last_error,
        Some(AuthError::AlreadyRegistered("Username already registered".into()))
    );
    assert_eq!(fx.backend.call_count(), 1);
}

#[tokio::test]
async fn test_popup_cancel_is_not_an_error() {
    let fx = fixture(MockBackendClient::new());
    let reducer = TestReducer::new();
    let mut state = AuthState::default();

    drive(&reducer, &mut state, AuthAction::SignInWithProvider, &fx.env).await;

    assert_eq!(state.status(), AuthStatus::SignedOut);
    assert!(!state.busy);
    assert_eq!(state.last_error, None);
}
