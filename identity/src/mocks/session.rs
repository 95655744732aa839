//! Session store that can be told to fail.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::Session;
use crate::stores::MemorySessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session store whose every call fails with `StorageUnavailable` while
/// failing is switched on. Clones share state.
#[derive(Debug, Clone)]
pub struct FailingSessionStore {
    inner: MemorySessionStore,
    failing: Arc<AtomicBool>,
}

impl FailingSessionStore {
    /// A store that fails from the start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(),
            failing: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A working store holding `session` until [`Self::fail_from_now_on`].
    #[must_use]
    pub fn healthy(session: Option<Session>) -> Self {
        Self {
            inner: MemorySessionStore::with_session(session),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every later call fail.
    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::Release);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(AuthError::StorageUnavailable("disk full".to_string()));
        }
        Ok(())
    }
}

impl Default for FailingSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FailingSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        self.check()?;
        self.inner.load()
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.check()?;
        self.inner.save(session)
    }

    fn clear(&self) -> Result<()> {
        self.check()?;
        self.inner.clear()
    }
}
