//! Infallible session store facade.

use crate::error::AuthError;
use crate::providers::SessionStore;
use crate::state::Session;
use crate::stores::MemorySessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session store the identity layer talks to.
///
/// Wraps a durable [`SessionStore`] and never fails. The first storage
/// error logs a warning and switches the facade to an in-memory store
/// seeded with the last session it saw; it stays degraded for the rest of
/// the process.
///
/// Clones share the same backend and degradation flag.
pub struct FallbackSessionStore<S> {
    durable: Arc<S>,
    mirror: MemorySessionStore,
    degraded: Arc<AtomicBool>,
}

impl<S> FallbackSessionStore<S>
where
    S: SessionStore,
{
    /// Wrap `durable`.
    #[must_use]
    pub fn new(durable: S) -> Self {
        Self {
            durable: Arc::new(durable),
            mirror: MemorySessionStore::new(),
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns `true` once the durable backend has failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Read the session. Failures read as the last known session.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        if self.is_degraded() {
            return self.mirror.get();
        }

        match self.durable.load() {
            Ok(session) => {
                self.mirror_set(session.as_ref());
                session
            },
            Err(error) => {
                self.degrade(&error);
                self.mirror.get()
            },
        }
    }

    /// Persist `session`. Incomplete sessions are ignored.
    pub fn save(&self, session: &Session) {
        if !session.is_complete() {
            tracing::warn!("Ignoring incomplete session");
            return;
        }

        if !self.is_degraded() {
            if let Err(error) = self.durable.save(session) {
                self.degrade(&error);
            }
        }
        self.mirror_set(Some(session));
    }

    /// Remove the session.
    pub fn clear(&self) {
        if !self.is_degraded() {
            if let Err(error) = self.durable.clear() {
                self.degrade(&error);
            }
        }
        self.mirror_set(None);
    }

    fn mirror_set(&self, session: Option<&Session>) {
        // The memory store cannot fail.
        let _ = match session {
            Some(session) => self.mirror.save(session),
            None => self.mirror.clear(),
        };
    }

    fn degrade(&self, error: &AuthError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(%error, "Session storage unavailable, keeping session in memory");
            metrics::counter!("identity.session_store.degraded").increment(1);
        }
    }
}

impl<S> Clone for FallbackSessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            durable: Arc::clone(&self.durable),
            mirror: self.mirror.clone(),
            degraded: Arc::clone(&self.degraded),
        }
    }
}

impl<S> std::fmt::Debug for FallbackSessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackSessionStore")
            .field("degraded", &self.degraded.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FailingSessionStore;

    #[test]
    fn passes_through_while_healthy() {
        let durable = MemorySessionStore::new();
        let store = FallbackSessionStore::new(durable.clone());

        store.save(&Session::new("tok", "farmer1"));
        assert_eq!(durable.get(), Some(Session::new("tok", "farmer1")));
        assert!(!store.is_degraded());

        store.clear();
        assert_eq!(durable.get(), None);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn degrades_to_memory_and_keeps_last_session() {
        let durable = FailingSessionStore::new();
        let store = FallbackSessionStore::new(durable.clone());

        store.save(&Session::new("tok", "farmer1"));
        assert!(store.is_degraded());
        assert_eq!(store.load(), Some(Session::new("tok", "farmer1")));

        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn seeds_memory_with_last_loaded_session() {
        let durable = FailingSessionStore::healthy(Some(Session::new("tok-1", "farmer1")));
        let store = FallbackSessionStore::new(durable.clone());

        assert_eq!(store.load(), Some(Session::new("tok-1", "farmer1")));

        durable.fail_from_now_on();
        assert_eq!(store.load(), Some(Session::new("tok-1", "farmer1")));
        assert!(store.is_degraded());

        store.save(&Session::new("tok-2", "farmer1"));
        assert_eq!(store.load(), Some(Session::new("tok-2", "farmer1")));
    }

    #[test]
    fn failing_load_reads_as_absent() {
        let store = FallbackSessionStore::new(FailingSessionStore::new());
        assert_eq!(store.load(), None);
        assert!(store.is_degraded());
    }
}
