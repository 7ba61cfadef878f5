//! How a session reaches its participant.
//!
//! A [`Session`](crate::Session) never touches a socket. It holds a
//! [`Peer`], which the server attaches on connect. The default peer is a
//! [`ChannelPeer`]: an unbounded channel whose receiving end is drained
//! by the connection task, so delivery never blocks the caller (and never
//! blocks a broadcast holding the registry lock).

use sharedesk_protocol::ServerMessage;
use tokio::sync::mpsc;

/// Errors a peer can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// The connection behind the peer has gone away.
    #[error("peer connection closed")]
    Closed,

    /// The peer rejected the operation for another reason.
    #[error("peer failed: {0}")]
    Failed(String),
}

/// The outgoing half of a participant's connection.
///
/// `send` is called with the session's state lock held, and during a
/// broadcast with the registry lock held as well. Implementations must
/// return without blocking and must not call back into the session or
/// its manager. `close` is called after those locks are released.
pub trait Peer: Send + Sync + 'static {
    /// Queues a message for the participant.
    fn send(&self, msg: &ServerMessage) -> Result<(), PeerError>;

    /// Asks the connection to shut down, telling the participant why.
    fn close(&self, reason: &str) -> Result<(), PeerError>;
}

/// What a [`ChannelPeer`] hands to the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCommand {
    /// Write this message to the socket.
    Message(ServerMessage),
    /// Say goodbye with this reason and close the socket.
    Close(String),
}

/// A [`Peer`] backed by an unbounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelPeer {
    sender: mpsc::UnboundedSender<PeerCommand>,
}

impl ChannelPeer {
    /// Creates a peer and the receiver the connection task should drain.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PeerCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Peer for ChannelPeer {
    fn send(&self, msg: &ServerMessage) -> Result<(), PeerError> {
        self.sender
            .send(PeerCommand::Message(msg.clone()))
            .map_err(|_| PeerError::Closed)
    }

    fn close(&self, reason: &str) -> Result<(), PeerError> {
        self.sender
            .send(PeerCommand::Close(reason.to_string()))
            .map_err(|_| PeerError::Closed)
    }
}
