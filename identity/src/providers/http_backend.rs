//! HTTP implementation of [`BackendAuthClient`].

use crate::config::IdentityConfig;
use crate::error::{AuthError, Result};
use crate::providers::BackendAuthClient;
use crate::state::{Account, Session, SignupProfile};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Fallback message when a failed login carries no `detail`.
pub const LOGIN_FAILED: &str = "Login failed";

/// Fallback message when a failed signup carries no `detail`.
pub const SIGNUP_FAILED: &str = "Signup failed";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Backend client speaking the AgriGuard REST API.
///
/// - `POST {base}/auth/login` with `{username, password}`
/// - `POST {base}/auth/signup` with `{email, username, full_name, phone, password}`
///
/// Failure bodies carry a `detail` field, used as the user-facing message.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: Client,
    login_url: String,
    signup_url: String,
    conflict_phrase: String,
}

impl HttpBackendClient {
    /// Create a client for the backend named in `config`.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: Client, config: &IdentityConfig) -> Self {
        Self {
            client,
            login_url: config.endpoint("auth/login"),
            signup_url: config.endpoint("auth/signup"),
            conflict_phrase: config.conflict_phrase.to_lowercase(),
        }
    }

    async fn request_login(&self, username: &str, password: &str) -> Result<Session> {
        tracing::debug!(url = %self.login_url, username, "Backend login");

        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| transport_error(LOGIN_FAILED, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_login(status, detail_text(&body, LOGIN_FAILED));
            tracing::warn!(%status, %error, "Backend login rejected");
            return Err(error);
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::NetworkError(format!("{LOGIN_FAILED}: {e}")))?;

        if body.access_token.is_empty() {
            tracing::warn!("Backend login returned an empty token");
            return Err(AuthError::NetworkError(format!(
                "{LOGIN_FAILED}: no access token in response"
            )));
        }

        Ok(Session::new(body.access_token, username))
    }

    async fn request_signup(&self, profile: &SignupProfile) -> Result<Account> {
        tracing::debug!(url = %self.signup_url, username = %profile.username, "Backend signup");

        let response = self
            .client
            .post(&self.signup_url)
            .json(profile)
            .send()
            .await
            .map_err(|e| transport_error(SIGNUP_FAILED, &e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let error =
                classify_signup(status, detail_text(&body, SIGNUP_FAILED), &self.conflict_phrase);
            tracing::warn!(%status, %error, "Backend signup rejected");
            return Err(error);
        }

        // The account body is informational; fill gaps from the request.
        let mut account: Account = serde_json::from_str(&body).unwrap_or_default();
        if account.username.is_empty() {
            account.username.clone_from(&profile.username);
        }
        if account.email.is_empty() {
            account.email.clone_from(&profile.email);
        }
        Ok(account)
    }
}

impl BackendAuthClient for HttpBackendClient {
    fn login(&self, username: &str, password: &str) -> impl Future<Output = Result<Session>> + Send {
        let client = self.clone();
        let username = username.to_string();
        let password = password.to_string();

        async move { client.request_login(&username, &password).await }
    }

    fn signup(&self, profile: &SignupProfile) -> impl Future<Output = Result<Account>> + Send {
        let client = self.clone();
        let profile = profile.clone();

        async move { client.request_signup(&profile).await }
    }
}

fn transport_error(context: &str, error: &reqwest::Error) -> AuthError {
    tracing::error!(%error, "Backend request failed");
    AuthError::NetworkError(format!("{context}: {error}"))
}

/// Extract the user-facing `detail` from a failure body.
///
/// String details are used as-is; any other JSON value is rendered as text.
/// Falls back to `fallback` when the body has no usable `detail`.
pub(crate) fn detail_text(body: &str, fallback: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail);

    match detail {
        Some(serde_json::Value::String(text)) if !text.is_empty() => text,
        Some(serde_json::Value::Null | serde_json::Value::String(_)) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Map a failed login response to an [`AuthError`].
pub(crate) fn classify_login(status: StatusCode, detail: String) -> AuthError {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND => AuthError::InvalidCredentials(detail),
        _ => AuthError::NetworkError(detail),
    }
}

/// Map a failed signup response to an [`AuthError`].
///
/// `conflict_phrase` must already be lowercase.
pub(crate) fn classify_signup(status: StatusCode, detail: String, conflict_phrase: &str) -> AuthError {
    let phrase_match =
        !conflict_phrase.is_empty() && detail.to_lowercase().contains(conflict_phrase);

    if status == StatusCode::CONFLICT || phrase_match {
        return AuthError::AlreadyRegistered(detail);
    }

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AuthError::ValidationError(detail),
        _ => AuthError::NetworkError(detail),
    }
}
