//! Wire protocol for Sharedesk.
//!
//! - **Types** ([`SessionId`], [`ServerMessage`], [`ClientMessage`]) —
//!   what travels between a participant's browser and the server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (messages) → Session (participants)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, MemberInfo, ServerMessage, SessionId};
