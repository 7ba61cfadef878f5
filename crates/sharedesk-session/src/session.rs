//! A single participant's session.
//!
//! A session is created by the [`SessionManager`] and shared as
//! `Arc<Session>`. Its identity and profile never change; its connection
//! state changes only through [`connect`](Session::connect),
//! [`disconnect`](Session::disconnect) and
//! [`mark_disconnected`](Session::mark_disconnected), each of which
//! raises the matching lifecycle event after the session's own lock is
//! released.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sharedesk_protocol::{MemberInfo, ServerMessage, SessionId};

use crate::manager::Shared;
use crate::{EventKind, Peer, SessionError, SessionManager};

// ---------------------------------------------------------------------------
// MemberProfile
// ---------------------------------------------------------------------------

/// Who a session belongs to.
///
/// The built-in accounts carry a secret and display name. Sessions minted
/// by authentication only record whether the matching password was the
/// administrator's.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MemberProfile {
    /// Account secret; only set for built-in accounts.
    pub secret: Option<String>,
    /// Display name; only set for built-in accounts.
    pub name: Option<String>,
    pub is_admin: bool,
}

impl MemberProfile {
    /// A named account with its own secret.
    pub fn account(
        secret: impl Into<String>,
        name: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            secret: Some(secret.into()),
            name: Some(name.into()),
            is_admin,
        }
    }

    /// The profile of a session created by authentication.
    pub fn ad_hoc(is_admin: bool) -> Self {
        Self {
            secret: None,
            name: None,
            is_admin,
        }
    }
}

impl fmt::Debug for MemberProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberProfile")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ConnectionState {
    peer: Option<Box<dyn Peer>>,
    connected: bool,
    receiving: bool,
}

/// Connection state taken out of a session when it goes offline.
struct Detached {
    peer: Option<Box<dyn Peer>>,
    was_connected: bool,
    was_receiving: bool,
}

/// One authenticated participant.
pub struct Session {
    id: SessionId,
    profile: MemberProfile,
    /// Non-owning link back to the registry, used to raise events.
    manager: Weak<Shared>,
    state: Mutex<ConnectionState>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        profile: MemberProfile,
        manager: Weak<Shared>,
    ) -> Self {
        Self {
            id,
            profile,
            manager,
            state: Mutex::new(ConnectionState::default()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn profile(&self) -> &MemberProfile {
        &self.profile
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_admin
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn is_receiving(&self) -> bool {
        self.state.lock().receiving
    }

    /// Whether this exact session is the manager's current host.
    ///
    /// Compares identity, not ID: a session replaced by a later `create`
    /// under the same ID is not the host even if the replacement is.
    pub fn is_host(&self) -> bool {
        self.manager()
            .and_then(|manager| manager.get_host())
            .is_some_and(|host| std::ptr::eq(Arc::as_ptr(&host), self))
    }

    /// The manager that owns this session, if it is still alive.
    pub fn manager(&self) -> Option<SessionManager> {
        self.manager.upgrade().map(SessionManager::from_shared)
    }

    /// Public summary for member lists and join notices.
    pub fn info(&self) -> MemberInfo {
        MemberInfo {
            id: self.id.clone(),
            name: self.profile.name.clone(),
            is_admin: self.profile.is_admin,
            connected: self.is_connected(),
        }
    }

    /// Attaches a live peer and marks the session connected.
    ///
    /// Raises [`EventKind::Connected`] on the offline → online transition.
    /// Connecting an already-connected session swaps the peer: the old one
    /// is closed with reason `"connection replaced"` and no event fires.
    pub fn connect(self: &Arc<Self>, peer: impl Peer) {
        let (previous, newly_connected) = {
            let mut state = self.state.lock();
            let previous = state.peer.replace(Box::new(peer));
            let newly_connected = !state.connected;
            state.connected = true;
            (previous, newly_connected)
        };

        if let Some(old) = previous {
            if let Err(e) = old.close("connection replaced") {
                tracing::debug!(
                    session_id = %self.id,
                    error = %e,
                    "closing replaced peer failed"
                );
            }
        }

        if newly_connected {
            tracing::info!(session_id = %self.id, "session connected");
            self.raise(EventKind::Connected);
        }
    }

    /// Records that the connection went away on its own (socket closed).
    ///
    /// Drops the peer without closing it. Raises
    /// [`EventKind::Disconnected`] if the session was connected.
    pub fn mark_disconnected(self: &Arc<Self>) {
        let detached = self.detach();
        self.announce_detached(&detached);
    }

    /// Forces the session offline, asking the peer to close with `reason`.
    ///
    /// The session is disconnected (and the event raised) even if closing
    /// the peer fails; that failure is returned as
    /// [`SessionError::DisconnectFailed`].
    pub fn disconnect(self: &Arc<Self>, reason: &str) -> Result<(), SessionError> {
        let detached = self.detach();

        let result = match &detached.peer {
            Some(peer) => peer.close(reason).map_err(|source| {
                SessionError::DisconnectFailed {
                    id: self.id.clone(),
                    source,
                }
            }),
            None => Ok(()),
        };

        if detached.was_connected {
            tracing::info!(session_id = %self.id, %reason, "session disconnected");
        }
        self.announce_detached(&detached);
        result
    }

    /// Updates the "currently receiving media" signal.
    ///
    /// Raises [`EventKind::ReceivingStarted`] or
    /// [`EventKind::ReceivingStopped`] when the value changes.
    pub fn set_receiving(self: &Arc<Self>, receiving: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.receiving != receiving;
            state.receiving = receiving;
            changed
        };

        if changed {
            tracing::debug!(session_id = %self.id, receiving, "receiving changed");
            self.raise(if receiving {
                EventKind::ReceivingStarted
            } else {
                EventKind::ReceivingStopped
            });
        }
    }

    /// Delivers a message to this participant.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`] — no live peer
    /// - [`SessionError::DeliveryFailed`] — the peer refused the message
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SessionError> {
        let state = self.state.lock();
        match &state.peer {
            Some(peer) if state.connected => {
                peer.send(msg).map_err(|source| SessionError::DeliveryFailed {
                    id: self.id.clone(),
                    source,
                })
            }
            _ => Err(SessionError::NotConnected(self.id.clone())),
        }
    }

    fn detach(&self) -> Detached {
        let mut state = self.state.lock();
        let detached = Detached {
            peer: state.peer.take(),
            was_connected: state.connected,
            was_receiving: state.receiving,
        };
        state.connected = false;
        state.receiving = false;
        detached
    }

    fn announce_detached(self: &Arc<Self>, detached: &Detached) {
        if detached.was_receiving {
            self.raise(EventKind::ReceivingStopped);
        }
        if detached.was_connected {
            self.raise(EventKind::Disconnected);
        }
    }

    fn raise(self: &Arc<Self>, kind: EventKind) {
        if let Some(manager) = self.manager() {
            manager.raise(kind, Some(self));
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("profile", &self.profile)
            .field("connected", &state.connected)
            .field("receiving", &state.receiving)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Session state transitions in isolation. Sessions here have no live
    //! manager (dangling `Weak`), so no events are raised.

    use super::*;
    use crate::testing::RecordingPeer;

    fn orphan(id: &str, is_admin: bool) -> Arc<Session> {
        Arc::new(Session::new(
            SessionId::from(id),
            MemberProfile::ad_hoc(is_admin),
            Weak::new(),
        ))
    }

    #[test]
    fn test_new_session_is_offline() {
        let session = orphan("s1", false);
        assert!(!session.is_connected());
        assert!(!session.is_receiving());
        assert!(!session.is_host());
        assert!(session.manager().is_none());
    }

    #[test]
    fn test_connect_then_send_reaches_peer() {
        let session = orphan("s1", false);
        let peer = RecordingPeer::new();
        session.connect(peer.clone());

        let msg = ServerMessage::Disconnect { reason: "x".into() };
        session.send(&msg).unwrap();

        assert!(session.is_connected());
        assert_eq!(peer.sent(), vec![msg]);
    }

    #[test]
    fn test_send_while_offline_returns_not_connected() {
        let session = orphan("s1", false);

        let result = session.send(&ServerMessage::Disconnect {
            reason: "x".into(),
        });

        assert!(matches!(result, Err(SessionError::NotConnected(id)) if id.as_str() == "s1"));
    }

    #[test]
    fn test_send_to_failing_peer_returns_delivery_failed() {
        let session = orphan("s1", false);
        session.connect(RecordingPeer::failing());

        let result = session.send(&ServerMessage::Disconnect {
            reason: "x".into(),
        });

        assert!(matches!(result, Err(SessionError::DeliveryFailed { .. })));
    }

    #[test]
    fn test_connect_twice_closes_replaced_peer() {
        let session = orphan("s1", false);
        let first = RecordingPeer::new();
        let second = RecordingPeer::new();

        session.connect(first.clone());
        session.connect(second.clone());

        assert_eq!(first.closed_with(), Some("connection replaced".into()));
        assert_eq!(second.closed_with(), None);
        assert!(session.is_connected());
    }

    #[test]
    fn test_disconnect_closes_peer_with_reason() {
        let session = orphan("s1", false);
        let peer = RecordingPeer::new();
        session.connect(peer.clone());

        session.disconnect("kicked").unwrap();

        assert!(!session.is_connected());
        assert_eq!(peer.closed_with(), Some("kicked".into()));
    }

    #[test]
    fn test_disconnect_failure_still_goes_offline() {
        let session = orphan("s1", false);
        session.connect(RecordingPeer::failing());

        let result = session.disconnect("bye");

        assert!(matches!(result, Err(SessionError::DisconnectFailed { .. })));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_disconnect_offline_session_is_noop() {
        let session = orphan("s1", false);
        assert!(session.disconnect("bye").is_ok());
    }

    #[test]
    fn test_mark_disconnected_does_not_close_peer() {
        let session = orphan("s1", false);
        let peer = RecordingPeer::new();
        session.connect(peer.clone());

        session.mark_disconnected();

        assert!(!session.is_connected());
        assert_eq!(peer.closed_with(), None);
    }

    #[test]
    fn test_going_offline_clears_receiving() {
        let session = orphan("s1", false);
        session.connect(RecordingPeer::new());
        session.set_receiving(true);
        assert!(session.is_receiving());

        session.mark_disconnected();

        assert!(!session.is_receiving());
    }

    #[test]
    fn test_info_reflects_profile_and_state() {
        let session = Arc::new(Session::new(
            SessionId::from("admin"),
            MemberProfile::account("pw", "Administrator", true),
            Weak::new(),
        ));
        session.connect(RecordingPeer::new());

        let info = session.info();

        assert_eq!(info.id.as_str(), "admin");
        assert_eq!(info.name.as_deref(), Some("Administrator"));
        assert!(info.is_admin);
        assert!(info.connected);
    }

    #[test]
    fn test_profile_debug_redacts_secret() {
        let profile = MemberProfile::account("hunter2", "User", false);
        assert!(!format!("{profile:?}").contains("hunter2"));
    }
}
