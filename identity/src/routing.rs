//! Route guard and navigation bar view.
//!
//! Consumers derive everything they show from [`AuthStatus`] / [`AuthState`];
//! nothing here holds state of its own.

use crate::state::{AuthState, AuthStatus};

/// Routes the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing page.
    Home,
    /// Crop issue report form.
    Report,
    /// Personal dashboard.
    Dashboard,
    /// Field management.
    Fields,
    /// Login form.
    Login,
    /// Registration form.
    Signup,
}

impl Route {
    /// Routes that need a signed-in user.
    #[must_use]
    pub const fn requires_login(self) -> bool {
        matches!(self, Self::Dashboard | Self::Fields)
    }

    /// Routes only meaningful while signed out.
    #[must_use]
    pub const fn is_auth_form(self) -> bool {
        matches!(self, Self::Login | Self::Signup)
    }
}

/// Screen actually rendered for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Landing page.
    Home,
    /// Crop issue report form.
    Report,
    /// Personal dashboard.
    Dashboard,
    /// Field management.
    Fields,
    /// Login form.
    Login,
    /// Registration form.
    Signup,
    /// Account linking form for a pending external identity.
    LinkAccount,
}

impl From<Route> for Screen {
    fn from(route: Route) -> Self {
        match route {
            Route::Home => Self::Home,
            Route::Report => Self::Report,
            Route::Dashboard => Self::Dashboard,
            Route::Fields => Self::Fields,
            Route::Login => Self::Login,
            Route::Signup => Self::Signup,
        }
    }
}

/// Decide which screen to render for `route`.
///
/// - `LinkingPending` shows the linking form for every route
/// - Dashboard and Fields show Login unless signed in
/// - Login and Signup go Home once signed in
/// - Home and Report are always reachable
///
/// # Examples
///
/// ```
/// # use agriguard_identity::{AuthStatus, routing::{resolve, Route, Screen}};
/// assert_eq!(resolve(AuthStatus::SignedOut, Route::Fields), Screen::Login);
/// assert_eq!(resolve(AuthStatus::LinkingPending, Route::Home), Screen::LinkAccount);
/// ```
#[must_use]
pub const fn resolve(status: AuthStatus, route: Route) -> Screen {
    if matches!(status, AuthStatus::LinkingPending) {
        return Screen::LinkAccount;
    }

    let signed_in = status.is_signed_in();
    match route {
        Route::Dashboard | Route::Fields if !signed_in => Screen::Login,
        Route::Login | Route::Signup if signed_in => Screen::Home,
        Route::Home => Screen::Home,
        Route::Report => Screen::Report,
        Route::Dashboard => Screen::Dashboard,
        Route::Fields => Screen::Fields,
        Route::Login => Screen::Login,
        Route::Signup => Screen::Signup,
    }
}

/// What the navigation bar shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavbarView {
    /// Session or external identity present.
    pub logged_in: bool,

    /// Session username, else external display name, else email.
    pub greeting_name: Option<String>,
}

impl NavbarView {
    /// Build the view from the current state.
    #[must_use]
    pub fn from_state(state: &AuthState) -> Self {
        Self {
            logged_in: state.is_logged_in(),
            greeting_name: state.greeting_name().map(str::to_string),
        }
    }
}
