//! # Sharedesk
//!
//! A server for a shared remote desktop: many participants watch one
//! stream, and at most one of them (the host) has control.
//!
//! The crate wires the layers together: a WebSocket transport accepts
//! connections, the session layer authenticates them and tracks who is
//! connected and who is host, and every state change is pushed to
//! participants as a [`ServerMessage`](sharedesk_protocol::ServerMessage).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sharedesk::prelude::*;
//!
//! struct NoCapture;
//!
//! impl CaptureManager for NoCapture {
//!     fn streaming(&self) -> bool { false }
//!     fn start_stream(&self) {}
//!     fn stop_stream(&self) {}
//! }
//!
//! # async fn run() -> Result<(), SharedeskError> {
//! let server = SharedeskServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .session_config(SessionConfig {
//!         admin_password: "admin".into(),
//!         password: "neko".into(),
//!         implicit_hosting: true,
//!     })
//!     .build(NoCapture)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod listeners;
mod server;

pub use error::SharedeskError;
pub use server::{SharedeskServer, SharedeskServerBuilder};

pub mod prelude {
    pub use crate::{SharedeskError, SharedeskServer, SharedeskServerBuilder};
    pub use sharedesk_protocol::{
        ClientMessage, MemberInfo, ServerMessage, SessionId,
    };
    pub use sharedesk_session::{
        CaptureManager, EventKind, Session, SessionConfig, SessionError,
        SessionManager,
    };
}
