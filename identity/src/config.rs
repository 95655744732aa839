//! Identity configuration.
//!
//! Configuration values are provided by the application; `from_env()` reads
//! the `AGRIGUARD_*` variables and falls back to the defaults below.

use std::path::PathBuf;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default location of the persisted session.
pub const DEFAULT_SESSION_FILE: &str = ".agriguard/session.json";

/// Default phrase identifying a registration conflict in a backend `detail`.
pub const DEFAULT_CONFLICT_PHRASE: &str = "already registered";

/// Identity layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Backend base URL, without trailing slash.
    ///
    /// Default: `http://127.0.0.1:8000`
    pub api_base_url: String,

    /// Path of the session file.
    ///
    /// Default: `.agriguard/session.json`
    pub session_file: PathBuf,

    /// Substring (case-insensitive) of a signup `detail` that marks an
    /// email/username collision when the backend does not answer 409.
    ///
    /// Default: `already registered`
    pub conflict_phrase: String,
}

impl IdentityConfig {
    /// Create configuration for the given backend.
    ///
    /// # Arguments
    ///
    /// * `api_base_url` - Backend base URL (e.g., `https://api.agriguard.app`)
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: trim_base_url(api_base_url.into()),
            ..Self::default()
        }
    }

    /// Read configuration from the environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `AGRIGUARD_API_BASE_URL` | `api_base_url` |
    /// | `AGRIGUARD_SESSION_FILE` | `session_file` |
    /// | `AGRIGUARD_CONFLICT_PHRASE` | `conflict_phrase` |
    ///
    /// Unset or empty variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("AGRIGUARD_API_BASE_URL") {
            config.api_base_url = trim_base_url(url);
        }
        if let Some(path) = get("AGRIGUARD_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(phrase) = get("AGRIGUARD_CONFLICT_PHRASE") {
            config.conflict_phrase = phrase;
        }

        config
    }

    /// Set the session file path.
    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Set the registration conflict phrase.
    #[must_use]
    pub fn with_conflict_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.conflict_phrase = phrase.into();
        self
    }

    /// Full URL of a backend endpoint.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            conflict_phrase: DEFAULT_CONFLICT_PHRASE.to_string(),
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
