//! Identity controller walkthrough.
//!
//! Drives the controller with the mock provider and backend through the
//! main flows and prints the status after each step:
//!
//! 1. A provider identity with no backend account → `LinkingPending`
//! 2. Linking with a username that is already taken → fallback login
//! 3. Logout
//! 4. A second identity, skipped → guest, then provider sign-out
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin walkthrough
//! RUST_LOG=walkthrough=info,agriguard_identity=trace cargo run --bin walkthrough
//! ```
//!
//! With `AGRIGUARD_SESSION_FILE` set, sessions go to that file instead of
//! memory.

use agriguard_identity::{
    mocks::{MockBackendClient, MockIdentityProvider},
    providers::{BackendAuthClient, IdentityProvider, SessionStore},
    routing::Route,
    stores::{FileSessionStore, MemorySessionStore},
    AuthError, ExternalIdentity, IdentityConfig, IdentityController, IdentityEnvironment,
    LinkingForm, Session,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("walkthrough=info,agriguard_identity=debug")),
        )
        .init();

    info!("=== AgriGuard identity walkthrough ===");

    let ada = ExternalIdentity::new("google-uid-ada", "ada@farm.io", Some("Ada Farmer".into()));
    let backend = MockBackendClient::new()
        .with_latency(Duration::from_millis(50))
        .on_signup(Err(AuthError::AlreadyRegistered("Username already registered".into())))
        .on_login(Ok(Session::new("tok-456", "ada")));
    let provider = MockIdentityProvider::new()
        .on_sign_in(Ok(ada))
        .on_sign_in(Ok(ExternalIdentity::new("github-uid-bob", "bob@farm.io", None)));

    let config = IdentityConfig::from_env();
    if std::env::var_os("AGRIGUARD_SESSION_FILE").is_some() {
        info!(path = %config.session_file.display(), "Using file session store");
        let sessions = FileSessionStore::new(config.session_file.clone());
        run(IdentityEnvironment::new(backend, provider, sessions)).await
    } else {
        run(IdentityEnvironment::new(backend, provider, MemorySessionStore::new())).await
    }
}

async fn run<B, P, S>(environment: IdentityEnvironment<B, P, S>) -> anyhow::Result<()>
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    let controller = IdentityController::start(environment);
    controller.settle().await;
    report(&controller, "started").await;

    // 1. Popup sign-in without a backend account.
    let identity = controller.sign_in_with_provider().await?;
    controller.settle().await;
    info!(email = %identity.email, "Provider sign-in finished");
    report(&controller, "after provider sign-in").await;
    info!(screen = ?controller.resolve(Route::Dashboard).await, "Dashboard resolves to");

    // 2. Link. Signup conflicts, the fallback login succeeds.
    let session = controller
        .submit_linking(LinkingForm::new("ada", "secret1", "secret1"))
        .await?;
    controller.settle().await;
    info!(username = %session.username, "Linked");
    report(&controller, "after linking").await;

    // 3. Logout.
    controller.logout().await?;
    controller.settle().await;
    report(&controller, "after logout").await;

    // 4. Second identity, continue as guest, then the provider signs out.
    controller.sign_in_with_provider().await?;
    controller.settle().await;
    controller.skip_linking().await?;
    controller.settle().await;
    report(&controller, "after skipping").await;

    controller.environment().provider.sign_out().await;
    controller.settle().await;
    report(&controller, "after provider sign-out").await;

    controller.shutdown(Duration::from_secs(5)).await?;
    info!("Done");
    Ok(())
}

async fn report<B, P, S>(controller: &IdentityController<B, P, S>, label: &str)
where
    B: BackendAuthClient + Clone + 'static,
    P: IdentityProvider + Clone + 'static,
    S: SessionStore + 'static,
{
    let state = controller.state().await;
    let navbar = controller.navbar().await;
    let error = state
        .last_error
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    info!(
        step = label,
        status = %state.status(),
        greeting = navbar.greeting_name.as_deref().unwrap_or("-"),
        error = %error,
        "Identity state"
    );
}
