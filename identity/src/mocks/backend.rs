//! Mock backend client for testing.

use crate::error::Result;
use crate::providers::BackendAuthClient;
use crate::state::{Account, Session, SignupProfile};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A request the mock backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `login(username, password)`.
    Login {
        /// Submitted username.
        username: String,
        /// Submitted password.
        password: String,
    },

    /// `signup(profile)`.
    Signup(SignupProfile),
}

#[derive(Debug, Default)]
struct Script {
    logins: VecDeque<Result<Session>>,
    signups: VecDeque<Result<Account>>,
    calls: Vec<BackendCall>,
}

/// Mock backend client.
///
/// Responses are scripted per endpoint and consumed in order. With nothing
/// scripted, login succeeds with token `tok-{username}` and signup succeeds.
/// Every call is recorded. Clones share the script.
#[derive(Debug, Clone, Default)]
pub struct MockBackendClient {
    script: Arc<Mutex<Script>>,
    latency: Option<Duration>,
}

impl MockBackendClient {
    /// Create a mock with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue the next login response.
    #[must_use]
    pub fn on_login(self, response: Result<Session>) -> Self {
        self.lock().logins.push_back(response);
        self
    }

    /// Queue the next signup response.
    #[must_use]
    pub fn on_signup(self, response: Result<Account>) -> Self {
        self.lock().signups.push_back(response);
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BackendAuthClient for MockBackendClient {
    fn login(&self, username: &str, password: &str) -> impl Future<Output = Result<Session>> + Send {
        let response = {
            let mut script = self.lock();
            script.calls.push(BackendCall::Login {
                username: username.to_string(),
                password: password.to_string(),
            });
            script
                .logins
                .pop_front()
                .unwrap_or_else(|| Ok(Session::new(format!("tok-{username}"), username)))
        };
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            response
        }
    }

    fn signup(&self, profile: &SignupProfile) -> impl Future<Output = Result<Account>> + Send {
        let response = {
            let mut script = self.lock();
            script.calls.push(BackendCall::Signup(profile.clone()));
            script.signups.pop_front().unwrap_or_else(|| {
                Ok(Account {
                    username: profile.username.clone(),
                    email: profile.email.clone(),
                    full_name: Some(profile.full_name.clone()),
                })
            })
        };
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            response
        }
    }
}
