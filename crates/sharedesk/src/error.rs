//! Unified error type for the Sharedesk server.

use sharedesk_protocol::ProtocolError;
use sharedesk_session::SessionError;
use sharedesk_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum SharedeskError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (authentication, membership).
    #[error(transparent)]
    Session(#[from] SessionError),
}
