//! Host arbitration: which session currently holds control.
//!
//! The host lives behind its own lock and is never validated against
//! the registry. Callers are expected to hand in a registered, connected
//! session; `set_host` accepts whatever it is given.

use std::sync::Arc;

use crate::{EventKind, Session, SessionManager};

impl SessionManager {
    /// Whether any session holds control.
    pub fn has_host(&self) -> bool {
        self.shared().host.lock().is_some()
    }

    /// The session holding control, if any.
    pub fn get_host(&self) -> Option<Arc<Session>> {
        self.shared().host.lock().clone()
    }

    /// Hands control to `host`, replacing any current host.
    ///
    /// Raises exactly one [`EventKind::HostAssigned`] carrying `host`.
    pub fn set_host(&self, host: Arc<Session>) {
        *self.shared().host.lock() = Some(Arc::clone(&host));
        tracing::info!(session_id = %host.id(), "host assigned");
        self.raise(EventKind::HostAssigned, Some(&host));
    }

    /// Takes control away from whoever holds it.
    ///
    /// Raises exactly one [`EventKind::HostCleared`] carrying the previous
    /// host, or no session if there was none.
    pub fn clear_host(&self) {
        let previous = self.shared().host.lock().take();
        tracing::info!(
            previous = ?previous.as_ref().map(|s| s.id()),
            "host cleared"
        );
        self.raise(EventKind::HostCleared, previous.as_ref());
    }

    /// Clears the host only if it is `host` itself, compared by identity
    /// under the host lock. Returns whether it was cleared.
    ///
    /// Raises [`EventKind::HostCleared`] only when it clears.
    pub fn clear_host_if(&self, host: &Arc<Session>) -> bool {
        let previous = {
            let mut current = self.shared().host.lock();
            match current.as_ref() {
                Some(held) if Arc::ptr_eq(held, host) => current.take(),
                _ => None,
            }
        };

        let Some(previous) = previous else {
            return false;
        };
        tracing::info!(previous = %previous.id(), "host cleared");
        self.raise(EventKind::HostCleared, Some(&previous));
        true
    }
}
