//! Protocol types: everything that crosses the wire between a
//! participant and the server.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An opaque, unique session identifier.
///
/// Minted at random for authenticated connections, or chosen by the
/// caller for built-in accounts (`"admin"`, `"user"`). Serializes as a
/// plain string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a string as a session ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lets a `HashMap<SessionId, _>` be queried with a `&str`.
impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Member summaries
// ---------------------------------------------------------------------------

/// Public view of a session, as shown to other participants.
///
/// Never carries the account secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: SessionId,
    /// Display name; only the built-in accounts have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_admin: bool,
    pub connected: bool,
}

// ---------------------------------------------------------------------------
// Server → participant
// ---------------------------------------------------------------------------

/// Every message the server pushes to a participant.
///
/// A closed set: broadcast fan-out is typed against this enum, so nothing
/// untyped reaches a socket. Internally tagged as
/// `{ "event": "host_changed", "id": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, right after the connection is accepted.
    Welcome {
        id: SessionId,
        is_admin: bool,
        host: Option<SessionId>,
    },

    /// Another participant connected.
    MemberConnected { member: MemberInfo },

    /// A participant went away.
    MemberDisconnected { id: SessionId },

    /// Reply to [`ClientMessage::ListMembers`].
    MemberList { members: Vec<MemberInfo> },

    /// Control was handed to `id`.
    HostChanged { id: SessionId },

    /// Nobody holds control anymore. `previous` is who held it, if anyone.
    HostCleared { previous: Option<SessionId> },

    /// A participant's media stream began flowing (admins only).
    ReceivingStarted { id: SessionId },

    /// A participant's media stream stopped (admins only).
    ReceivingStopped { id: SessionId },

    /// The server is closing this connection.
    Disconnect { reason: String },

    /// A request failed. `code` follows HTTP conventions
    /// (401 unauthorized, 403 forbidden, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Participant → server
// ---------------------------------------------------------------------------

/// Requests a participant may send once connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask to become host.
    ControlRequest,

    /// Give up host, if held.
    ControlRelease,

    /// Report whether this participant's media stream is flowing.
    Receiving { active: bool },

    /// Ask for a snapshot of all registered members.
    ListMembers,

    /// Admin only: remove another member.
    Kick { id: SessionId },
}
