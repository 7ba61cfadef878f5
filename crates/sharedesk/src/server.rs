//! `SharedeskServer` builder and server loop.
//!
//! This is the entry point for running a Sharedesk server. It ties
//! together all the layers: transport → protocol → session.

use std::sync::Arc;

use sharedesk_protocol::{Codec, JsonCodec};
use sharedesk_session::{CaptureManager, SessionConfig, SessionManager};
use sharedesk_transport::{Transport, WebSocketTransport};

use crate::SharedeskError;
use crate::handler::handle_connection;
use crate::listeners;

/// Shared server state passed to each connection handler task.
///
/// The session manager is internally synchronized and cheap to clone, so
/// no outer lock is needed.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: SessionManager,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Sharedesk server.
///
/// # Example
///
/// ```rust,ignore
/// use sharedesk::prelude::*;
///
/// let server = SharedeskServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_config(config)
///     .build(my_capture)
///     .await?;
/// server.run().await
/// ```
pub struct SharedeskServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl SharedeskServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and wires the session manager to `capture`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. The broadcast listeners
    /// are registered here, before any connection can arrive.
    pub async fn build(
        self,
        capture: impl CaptureManager,
    ) -> Result<SharedeskServer<JsonCodec>, SharedeskError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let sessions = SessionManager::new(capture, self.session_config);
        listeners::install(&sessions);

        let state = Arc::new(ServerState {
            sessions,
            codec: JsonCodec,
        });

        Ok(SharedeskServer { transport, state })
    }
}

impl Default for SharedeskServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sharedesk server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SharedeskServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SharedeskServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SharedeskServerBuilder {
        SharedeskServerBuilder::new()
    }
}

impl<C: Codec> SharedeskServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The session manager behind this server.
    ///
    /// Clones share state with the server, so embedders can subscribe to
    /// events or inspect membership while it runs.
    pub fn sessions(&self) -> SessionManager {
        self.state.sessions.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each upgraded connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SharedeskError> {
        tracing::info!("Sharedesk server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
