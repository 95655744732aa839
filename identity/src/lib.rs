//! # AgriGuard Identity
//!
//! Client-side identity reconciliation for AgriGuard.
//!
//! The user can be signed in two ways at once: with a backend session
//! (bearer token + username) and with an external OAuth identity. This crate
//! keeps the two consistent and exposes a single classification:
//!
//! | Status | Session | External identity | Linking skipped |
//! |---|---|---|---|
//! | `SignedOut` | no | no | – |
//! | `LinkingPending` | no | yes | no |
//! | `Authenticated` | yes | any | – |
//! | `GuestAuthenticated` | no | yes | yes |
//!
//! ## Architecture
//!
//! Identity logic is implemented as reducers and effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! The [`IdentityController`] owns the store, subscribes to the provider and
//! exposes the commands the presentation layer calls.
//!
//! ## Example
//!
//! ```rust,ignore
//! use agriguard_identity::*;
//!
//! let config = IdentityConfig::from_env();
//! let environment = IdentityEnvironment::from_config(provider, &config);
//! let controller = IdentityController::start(environment);
//! controller.settle().await;
//!
//! match controller.status().await {
//!     AuthStatus::LinkingPending => { /* show the linking form */ },
//!     status => println!("{status}"),
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod controller;
pub mod environment;
pub mod error;
pub mod linking;
pub mod providers;
pub mod reducers;
pub mod routing;
pub mod state;
pub mod stores;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::{AuthAction, LinkingForm, SignupForm};
pub use config::IdentityConfig;
pub use controller::{IdentityController, IdentityStore};
pub use environment::IdentityEnvironment;
pub use error::{AuthError, ControllerError, Result};
pub use reducers::IdentityReducer;
pub use state::{
    Account, AuthState, AuthStatus, ExternalIdentity, LinkingMode, Session, SignupProfile,
};
