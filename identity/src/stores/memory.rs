//! In-memory session store.

use crate::error::Result;
use crate::providers::SessionStore;
use crate::state::Session;
use std::sync::{Arc, Mutex, PoisonError};

/// Process-local session store. Contents are lost on exit.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `session`.
    #[must_use]
    pub fn with_session(session: Option<Session>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(session.filter(Session::is_complete))),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, session: Option<Session>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.get())
    }

    fn save(&self, session: &Session) -> Result<()> {
        if session.is_complete() {
            self.set(Some(session.clone()));
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.set(None);
        Ok(())
    }
}
