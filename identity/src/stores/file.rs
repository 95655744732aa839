//! JSON file session store.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::Session;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// On-disk layout. Both keys are optional so half-written documents parse
/// and can be rejected as a whole.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

/// Session store backed by one JSON document:
///
/// ```json
/// { "authToken": "…", "username": "farmer1" }
/// ```
///
/// A missing file, a malformed document or a document holding only one of
/// the two keys reads as "no session". On Unix the file is created with
/// owner-only permissions (0600).
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store for `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, action: &str, error: &std::io::Error) -> AuthError {
        AuthError::StorageUnavailable(format!(
            "failed to {action} {}: {error}",
            self.path.display()
        ))
    }

    fn write_document(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable("create directory for", &e))?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| self.unavailable("open", &e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| self.unavailable("write", &e))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unavailable("read", &e)),
        };

        let document: SessionDocument = match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "Ignoring malformed session file");
                return Ok(None);
            },
        };

        match (document.auth_token, document.username) {
            (Some(token), Some(username)) => {
                let session = Session::new(token, username);
                Ok(session.is_complete().then_some(session))
            },
            _ => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if !session.is_complete() {
            tracing::warn!("Refusing to persist an incomplete session");
            return Ok(());
        }

        let document = SessionDocument {
            auth_token: Some(session.token.clone()),
            username: Some(session.username.clone()),
        };
        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| AuthError::StorageUnavailable(format!("failed to encode session: {e}")))?;

        self.write_document(&contents)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unavailable("remove", &e)),
        }
    }
}
