//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the provider
//! traits for use in unit and integration tests and in the walkthrough demo.

pub mod backend;
pub mod provider;
pub mod session;

pub use backend::{BackendCall, MockBackendClient};
pub use provider::MockIdentityProvider;
pub use session::FailingSessionStore;
