//! Form validation.
//!
//! Runs before any network call. A rejected form never reaches the backend.

use crate::actions::{LinkingForm, SignupForm};
use crate::error::{AuthError, Result};
use crate::state::{ExternalIdentity, SignupProfile};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum backend username length.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").ok());

fn invalid(message: &str) -> AuthError {
    AuthError::ValidationError(message.to_string())
}

/// Returns `true` if `email` looks like `name@domain.tld`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Validate local login credentials.
///
/// # Errors
///
/// Returns [`AuthError::ValidationError`] if either field is blank.
pub fn validate_login(username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(invalid("Username and password are required"));
    }
    Ok(())
}

/// Validate the local registration form and build the signup payload.
///
/// # Errors
///
/// Returns [`AuthError::ValidationError`] naming the first failed rule.
pub fn validate_signup(form: &SignupForm) -> Result<SignupProfile> {
    if form.full_name.trim().is_empty() {
        return Err(invalid("Full name is required"));
    }
    if form.email.trim().is_empty() || !is_valid_email(&form.email) {
        return Err(invalid("Valid email is required"));
    }
    if form.username.trim().is_empty() || form.username.chars().count() < MIN_USERNAME_LEN {
        return Err(invalid("Username must be at least 3 characters"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 6 characters"));
    }
    if form.password != form.confirm_password {
        return Err(invalid("Passwords do not match"));
    }

    Ok(SignupProfile {
        email: form.email.trim().to_string(),
        username: form.username.clone(),
        full_name: form.full_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        password: form.password.clone(),
    })
}

/// Validate the account linking form and build the signup payload for
/// `identity`.
///
/// The account takes the identity's email and display name (falling back
/// to the username) with an empty phone number.
///
/// # Errors
///
/// Returns [`AuthError::ValidationError`] for an empty username, a short
/// password or a confirmation mismatch.
pub fn validate_linking(form: &LinkingForm, identity: &ExternalIdentity) -> Result<SignupProfile> {
    if form.username.trim().is_empty() || form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Username and strong password required."));
    }
    if form.password != form.confirm_password {
        return Err(invalid("Passwords do not match"));
    }

    let full_name = identity
        .display_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| form.username.clone());

    Ok(SignupProfile {
        email: identity.email.clone(),
        username: form.username.clone(),
        full_name,
        phone: String::new(),
        password: form.password.clone(),
    })
}
