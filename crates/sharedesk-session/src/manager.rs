//! The session manager: registry of every known session.
//!
//! `SessionManager` is a cheap-to-clone handle around shared state with
//! three independent locks:
//!
//! - `members` — the `id → Session` map (this module and broadcast)
//! - `host` — the current host
//! - `stream` — serializes the streaming start/stop couplings
//!
//! `members` and `host` are never held together. Events are raised only
//! after the lock that guarded the change has been released, so a
//! listener may call straight back into the manager.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sharedesk_protocol::SessionId;

use crate::events::EventBus;
use crate::{
    CaptureManager, IdentityMinter, MemberProfile, RandomMinter, Session,
    SessionConfig, SessionError,
};

/// ID of the built-in administrator account.
pub const ADMIN_ACCOUNT: &str = "admin";
/// ID of the built-in user account.
pub const USER_ACCOUNT: &str = "user";

pub(crate) struct Shared {
    pub(crate) config: SessionConfig,
    pub(crate) capture: Box<dyn CaptureManager>,
    pub(crate) minter: Box<dyn IdentityMinter>,
    pub(crate) members: Mutex<HashMap<SessionId, Arc<Session>>>,
    pub(crate) host: Mutex<Option<Arc<Session>>>,
    pub(crate) stream: Mutex<()>,
    pub(crate) events: EventBus,
}

/// Tracks every session, the current host, and lifecycle listeners.
///
/// ## Lifecycle
///
/// ```text
/// authenticate() ──→ create() ──→ session.connect() ──→ [Connected]
///                                      │                     │
///                                      │            set_host / broadcast
///                                      ▼                     │
///                              session.disconnect() ←────────┘
///                                      │
///                                      ▼
///                                  delete()
/// ```
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

/// A non-owning handle to a [`SessionManager`].
///
/// Listeners registered on the manager should capture this rather than a
/// `SessionManager`, or the manager would own a reference to itself.
#[derive(Clone)]
pub struct WeakSessionManager {
    shared: Weak<Shared>,
}

impl WeakSessionManager {
    /// Returns the manager if it is still alive.
    pub fn upgrade(&self) -> Option<SessionManager> {
        self.shared.upgrade().map(SessionManager::from_shared)
    }
}

impl SessionManager {
    /// Creates a manager that mints IDs with [`RandomMinter`].
    ///
    /// Registers the two built-in accounts, `"admin"` and `"user"`, with
    /// the configured passwords as their secrets.
    pub fn new(capture: impl CaptureManager, config: SessionConfig) -> Self {
        Self::with_minter(capture, config, RandomMinter::default())
    }

    /// Creates a manager with a custom [`IdentityMinter`].
    pub fn with_minter(
        capture: impl CaptureManager,
        config: SessionConfig,
        minter: impl IdentityMinter,
    ) -> Self {
        let admin = MemberProfile::account(
            config.admin_password.clone(),
            "Administrator",
            true,
        );
        let user =
            MemberProfile::account(config.password.clone(), "User", false);

        let manager = Self {
            shared: Arc::new(Shared {
                config,
                capture: Box::new(capture),
                minter: Box::new(minter),
                members: Mutex::new(HashMap::new()),
                host: Mutex::new(None),
                stream: Mutex::new(()),
                events: EventBus::default(),
            }),
        };

        manager.create(ADMIN_ACCOUNT, admin);
        manager.create(USER_ACCOUNT, user);
        manager
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Returns a non-owning handle to this manager.
    pub fn downgrade(&self) -> WeakSessionManager {
        WeakSessionManager {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Registers a session under `id`, replacing any existing entry.
    ///
    /// Last write wins: the replaced session is dropped from the registry
    /// as-is (it is not disconnected) and is no longer reachable through
    /// [`get`](Self::get).
    pub fn create(
        &self,
        id: impl Into<SessionId>,
        profile: MemberProfile,
    ) -> Arc<Session> {
        let id = id.into();
        let session = Arc::new(Session::new(
            id.clone(),
            profile,
            Arc::downgrade(&self.shared),
        ));

        let replaced = self
            .shared
            .members
            .lock()
            .insert(id.clone(), Arc::clone(&session));

        if replaced.is_some() {
            tracing::debug!(session_id = %id, "session replaced existing entry");
        }
        tracing::info!(session_id = %id, is_admin = session.is_admin(), "session created");
        session
    }

    /// Looks up a session by ID.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.shared.members.lock().get(id).cloned()
    }

    /// Removes a session from the registry.
    ///
    /// The entry is removed first; then, if the session was connected, it
    /// is disconnected with reason `"member deleted"` and the result of
    /// that is returned. The entry stays removed either way.
    ///
    /// # Errors
    /// - [`SessionError::MemberNotFound`] — no such ID; nothing changes
    /// - [`SessionError::DisconnectFailed`] — closing the peer failed
    pub fn delete(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .shared
            .members
            .lock()
            .remove(id)
            .ok_or_else(|| SessionError::MemberNotFound(SessionId::from(id)))?;

        tracing::info!(session_id = %id, "session deleted");

        if session.is_connected() {
            return session.disconnect("member deleted");
        }
        Ok(())
    }

    /// Snapshot of every registered session, in no particular order.
    pub fn members(&self) -> Vec<Arc<Session>> {
        self.shared.members.lock().values().cloned().collect()
    }

    /// Whether any registered session is connected.
    pub fn has_connected_members(&self) -> bool {
        self.shared
            .members
            .lock()
            .values()
            .any(|session| session.is_connected())
    }

    /// Number of registered sessions, built-in accounts included.
    pub fn len(&self) -> usize {
        self.shared.members.lock().len()
    }

    /// Returns `true` if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.shared.members.lock().is_empty()
    }

    /// Whether control is handed out without an explicit request.
    pub fn implicit_hosting(&self) -> bool {
        self.shared.config.implicit_hosting
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingPeer, manager};

    #[test]
    fn test_new_registers_builtin_accounts() {
        let (mgr, _) = manager();

        let admin = mgr.get(ADMIN_ACCOUNT).expect("admin account");
        assert!(admin.is_admin());
        assert_eq!(admin.profile().name.as_deref(), Some("Administrator"));
        assert_eq!(admin.profile().secret.as_deref(), Some("admin-pw"));

        let user = mgr.get(USER_ACCOUNT).expect("user account");
        assert!(!user.is_admin());
        assert_eq!(user.profile().name.as_deref(), Some("User"));
        assert_eq!(user.profile().secret.as_deref(), Some("user-pw"));

        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_create_then_get_returns_same_session() {
        let (mgr, _) = manager();

        let created = mgr.create("s1", MemberProfile::ad_hoc(false));
        let fetched = mgr.get("s1").expect("should exist");

        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[test]
    fn test_create_same_id_replaces_previous() {
        let (mgr, _) = manager();

        let first = mgr.create("s1", MemberProfile::ad_hoc(false));
        let second = mgr.create("s1", MemberProfile::ad_hoc(true));

        let fetched = mgr.get("s1").unwrap();
        assert!(Arc::ptr_eq(&second, &fetched));
        assert!(!Arc::ptr_eq(&first, &fetched));
        assert!(fetched.is_admin());
        assert_eq!(mgr.len(), 3);
    }

    #[test]
    fn test_get_unknown_returns_none() {
        let (mgr, _) = manager();
        assert!(mgr.get("nobody").is_none());
    }

    #[test]
    fn test_delete_unknown_returns_not_found_and_leaves_registry() {
        let (mgr, _) = manager();
        mgr.create("s1", MemberProfile::ad_hoc(false));

        let result = mgr.delete("ghost");

        assert!(matches!(result, Err(SessionError::MemberNotFound(id)) if id.as_str() == "ghost"));
        assert_eq!(mgr.len(), 3);
    }

    #[test]
    fn test_delete_offline_session_removes_it() {
        let (mgr, _) = manager();
        mgr.create("s1", MemberProfile::ad_hoc(false));

        mgr.delete("s1").expect("should succeed");

        assert!(mgr.get("s1").is_none());
    }

    #[test]
    fn test_delete_connected_session_disconnects_first() {
        let (mgr, _) = manager();
        let session = mgr.create("s1", MemberProfile::ad_hoc(false));
        let peer = RecordingPeer::new();
        session.connect(peer.clone());

        mgr.delete("s1").expect("should succeed");

        assert!(!session.is_connected());
        assert_eq!(peer.closed_with(), Some("member deleted".into()));
        assert!(mgr.get("s1").is_none());
    }

    #[test]
    fn test_delete_with_failing_disconnect_still_removes() {
        let (mgr, _) = manager();
        let session = mgr.create("s1", MemberProfile::ad_hoc(false));
        session.connect(RecordingPeer::failing());

        let result = mgr.delete("s1");

        assert!(matches!(result, Err(SessionError::DisconnectFailed { .. })));
        assert!(mgr.get("s1").is_none());
        assert!(!session.is_connected());
    }

    #[test]
    fn test_members_snapshot_includes_everyone() {
        let (mgr, _) = manager();
        mgr.create("a", MemberProfile::ad_hoc(false));
        mgr.create("b", MemberProfile::ad_hoc(true));

        let mut ids: Vec<String> = mgr
            .members()
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        ids.sort();

        assert_eq!(ids, vec!["a", "admin", "b", "user"]);
    }

    #[test]
    fn test_has_connected_members_tracks_connections() {
        let (mgr, _) = manager();
        let session = mgr.create("s1", MemberProfile::ad_hoc(false));
        assert!(!mgr.has_connected_members());

        session.connect(RecordingPeer::new());
        assert!(mgr.has_connected_members());

        session.mark_disconnected();
        assert!(!mgr.has_connected_members());
    }

    #[test]
    fn test_implicit_hosting_passes_config_through() {
        let (mgr, _) = manager();
        assert!(mgr.implicit_hosting());
    }

    #[test]
    fn test_session_manager_link_survives_while_manager_lives() {
        let (mgr, _) = manager();
        let session = mgr.create("s1", MemberProfile::ad_hoc(false));

        assert!(session.manager().is_some());

        drop(mgr);
        assert!(session.manager().is_none());
    }

    #[test]
    fn test_weak_manager_upgrades_only_while_alive() {
        let (mgr, _) = manager();
        let weak = mgr.downgrade();
        assert!(weak.upgrade().is_some());

        drop(mgr);
        assert!(weak.upgrade().is_none());
    }
}
