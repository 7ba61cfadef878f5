//! Participant session management for Sharedesk.
//!
//! This crate is the coordinator at the center of a shared desktop:
//!
//! 1. **Authentication** — turning a credential on the upgrade request
//!    into a fresh [`Session`] ([`SessionManager::authenticate`])
//! 2. **Registry** — every known session, keyed by [`SessionId`]
//! 3. **Host arbitration** — at most one session holds control
//! 4. **Broadcast** — best-effort fan-out of [`ServerMessage`]s
//! 5. **Lifecycle events** — connect/disconnect/host/receiving
//!    notifications, which also start and stop the shared stream through
//!    a [`CaptureManager`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)    ← wires connections to sessions, reacts to events
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport (below)  ← SessionId, ServerMessage, HandshakeRequest
//! ```
//!
//! All operations are synchronous and safe to call from any thread.
//!
//! [`SessionId`]: sharedesk_protocol::SessionId
//! [`ServerMessage`]: sharedesk_protocol::ServerMessage

mod auth;
mod broadcast;
mod capture;
mod config;
mod error;
mod events;
mod host;
mod identity;
mod manager;
mod peer;
mod session;
#[cfg(test)]
mod testing;

pub use auth::{CredentialSource, TOKEN_NAME, extract_token};
pub use capture::CaptureManager;
pub use config::SessionConfig;
pub use error::SessionError;
pub use events::EventKind;
pub use identity::{IdentityMinter, RandomMinter};
pub use manager::{
    ADMIN_ACCOUNT, SessionManager, USER_ACCOUNT, WeakSessionManager,
};
pub use peer::{ChannelPeer, Peer, PeerCommand, PeerError};
pub use session::{MemberProfile, Session};
