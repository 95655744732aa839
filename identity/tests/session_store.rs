//! Integration tests for the file-backed session store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use agriguard_identity::{
    mocks::{MockBackendClient, MockIdentityProvider},
    providers::SessionStore,
    stores::{FallbackSessionStore, FileSessionStore},
    AuthError, AuthStatus, ExternalIdentity, IdentityController, IdentityEnvironment, LinkingForm,
    Session,
};
use std::fs;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FileSessionStore {
    FileSessionStore::new(dir.path().join("agriguard").join("session.json"))
}

#[test]
fn test_missing_file_reads_as_signed_out() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_save_load_clear() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let session = Session::new("tok-123", "farmer1");

    store.save(&session).unwrap();
    assert_eq!(store.load().unwrap(), Some(session));

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["authToken"], "tok-123");
    assert_eq!(raw["username"], "farmer1");

    store.clear().unwrap();
    assert!(!store.path().exists());
    assert_eq!(store.load().unwrap(), None);

    // Clearing twice is fine.
    store.clear().unwrap();
}

#[test]
fn test_partial_document_reads_as_no_session() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();

    fs::write(store.path(), r#"{"authToken":"tok-123"}"#).unwrap();
    assert_eq!(store.load().unwrap(), None);

    fs::write(store.path(), r#"{"username":"farmer1"}"#).unwrap();
    assert_eq!(store.load().unwrap(), None);

    fs::write(store.path(), r#"{"authToken":"","username":"farmer1"}"#).unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_malformed_document_reads_as_no_session() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "not json").unwrap();

    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_incomplete_session_is_not_written() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.save(&Session::new("", "farmer1")).unwrap();

    assert!(!store.path().exists());
}

#[cfg(unix)]
#[test]
fn test_session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.save(&Session::new("tok-123", "farmer1")).unwrap();

    let mode = fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_unusable_location_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file, not a directory").unwrap();
    let store = FileSessionStore::new(blocker.join("session.json"));

    let error = store.save(&Session::new("tok-123", "farmer1")).unwrap_err();
    assert!(matches!(error, AuthError::StorageUnavailable(_)));
    assert!(matches!(store.load(), Err(AuthError::StorageUnavailable(_))));
}

#[test]
fn test_fallback_keeps_session_in_memory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file, not a directory").unwrap();
    let store = FallbackSessionStore::new(FileSessionStore::new(blocker.join("session.json")));

    assert_eq!(store.load(), None);
    assert!(store.is_degraded());

    store.save(&Session::new("tok-123", "farmer1"));
    assert_eq!(store.load(), Some(Session::new("tok-123", "farmer1")));

    store.clear();
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let identity = ExternalIdentity::new("google-uid-1", "a@x.com", None);
    let backend = MockBackendClient::new().on_login(Ok(Session::new("tok-123", "farmer1")));

    let first = IdentityController::start(IdentityEnvironment::new(
        backend.clone(),
        MockIdentityProvider::signed_in(identity.clone()),
        store_in(&dir),
    ));
    first.settle().await;
    first
        .submit_linking(LinkingForm::new("farmer1", "secret1", "secret1"))
        .await
        .unwrap();
    first.settle().await;
    first.shutdown(std::time::Duration::from_secs(1)).await.unwrap();

    // A new process with the provider still signed in.
    let second = IdentityController::start(IdentityEnvironment::new(
        backend,
        MockIdentityProvider::signed_in(identity),
        store_in(&dir),
    ));
    second.settle().await;

    let state = second.state().await;
    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert_eq!(state.session, Some(Session::new("tok-123", "farmer1")));
}
