//! Error types for the session layer.

use sharedesk_protocol::SessionId;

use crate::PeerError;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request carried no token in the query, `Authorization` header,
    /// or cookie.
    #[error("no password provided")]
    CredentialMissing,

    /// A token was present but matched neither configured password.
    #[error("invalid password")]
    CredentialInvalid,

    /// The [`IdentityMinter`](crate::IdentityMinter) could not produce an ID.
    #[error("identity allocation failed: {0}")]
    IdentityAllocationFailed(String),

    /// No session is registered under this ID.
    #[error("member {0} not found")]
    MemberNotFound(SessionId),

    /// The session has no live peer to deliver to.
    #[error("member {0} is not connected")]
    NotConnected(SessionId),

    /// The peer refused a message.
    #[error("delivery to {id} failed: {source}")]
    DeliveryFailed {
        id: SessionId,
        #[source]
        source: PeerError,
    },

    /// Closing the peer during a forced disconnect failed. The session is
    /// still considered disconnected.
    #[error("disconnecting {id} failed: {source}")]
    DisconnectFailed {
        id: SessionId,
        #[source]
        source: PeerError,
    },
}
