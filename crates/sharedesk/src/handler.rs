//! Per-connection handler: authentication, outbound relay, and client
//! message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Authenticate the upgrade request → new session, or 401 and close
//!   2. Queue Welcome on a channel peer and attach it → session is connected
//!   3. Loop: relay queued server messages out, route client messages in

use std::sync::Arc;

use sharedesk_protocol::{ClientMessage, Codec, ServerMessage, SessionId};
use sharedesk_session::{
    ChannelPeer, Peer, PeerCommand, Session, SessionError, SessionManager,
};
use sharedesk_transport::{Connection, WebSocketConnection};

use crate::SharedeskError;
use crate::server::ServerState;

/// Drop guard that takes a participant out of the session when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler panics. The session
/// manager is synchronous, so the work happens inline.
struct SessionGuard {
    session: Arc<Session>,
    sessions: SessionManager,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.mark_disconnected();
        if let Err(e) = self.sessions.delete(self.session.id().as_str()) {
            // Already removed by a kick.
            tracing::debug!(
                session_id = %self.session.id(),
                error = %e,
                "session cleanup skipped"
            );
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SharedeskError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Authenticate ---
    let session = match state.sessions.authenticate(conn.request()) {
        Ok(session) => session,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "authentication failed");
            send_error(&conn, &state.codec, status_code(&e), &e.to_string())
                .await?;
            let _ = conn.close().await;
            return Err(e.into());
        }
    };
    let session_id = session.id().clone();
    tracing::info!(%conn_id, %session_id, is_admin = session.is_admin(), "member authenticated");

    // The guard exists from the moment the session is registered.
    let _guard = SessionGuard {
        session: Arc::clone(&session),
        sessions: state.sessions.clone(),
    };

    // --- Step 2: Welcome and connect ---
    let welcome = ServerMessage::Welcome {
        id: session_id.clone(),
        is_admin: session.is_admin(),
        host: state.sessions.get_host().map(|h| h.id().clone()),
    };
    // Queued ahead of anything the connect below triggers, so a client
    // that has seen Welcome is already counted as connected.
    let (peer, mut outbound) = ChannelPeer::new();
    peer.send(&welcome).map_err(|source| SessionError::DeliveryFailed {
        id: session_id.clone(),
        source,
    })?;
    session.connect(peer);

    // --- Step 3: Relay loop ---
    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(PeerCommand::Message(msg)) => {
                    send_message(&conn, &state.codec, &msg).await?;
                }
                Some(PeerCommand::Close(reason)) => {
                    tracing::info!(%session_id, %reason, "closing connection");
                    send_message(
                        &conn,
                        &state.codec,
                        &ServerMessage::Disconnect { reason },
                    )
                    .await?;
                    let _ = conn.close().await;
                    break;
                }
                // The session dropped its peer without a close command.
                None => break,
            },
            data = conn.recv() => match data {
                Ok(Some(data)) => {
                    handle_client_message(&conn, &state, &session, &data).await?;
                }
                Ok(None) => {
                    tracing::info!(%session_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%session_id, error = %e, "recv error");
                    break;
                }
            },
        }
    }

    // _guard drops here → session goes offline and is removed.
    Ok(())
}

/// Routes one decoded client message.
async fn handle_client_message<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &Arc<Session>,
    data: &[u8],
) -> Result<(), SharedeskError> {
    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(session_id = %session.id(), error = %e, "failed to decode client message");
            return send_error(
                conn,
                &state.codec,
                400,
                &format!("invalid message: {e}"),
            )
            .await;
        }
    };

    let sessions = &state.sessions;
    match msg {
        ClientMessage::ControlRequest => match sessions.get_host() {
            Some(host) if Arc::ptr_eq(&host, session) => {}
            Some(host) if !session.is_admin() => {
                send_error(
                    conn,
                    &state.codec,
                    409,
                    &format!("control is held by {}", host.id()),
                )
                .await?;
            }
            _ => sessions.set_host(Arc::clone(session)),
        },

        ClientMessage::ControlRelease => {
            sessions.clear_host_if(session);
        }

        ClientMessage::Receiving { active } => session.set_receiving(active),

        ClientMessage::ListMembers => {
            let members =
                sessions.members().iter().map(|s| s.info()).collect();
            send_message(
                conn,
                &state.codec,
                &ServerMessage::MemberList { members },
            )
            .await?;
        }

        ClientMessage::Kick { id } => {
            if !session.is_admin() {
                return send_error(
                    conn,
                    &state.codec,
                    403,
                    "only administrators can kick members",
                )
                .await;
            }
            kick(conn, state, session.id(), &id).await?;
        }
    }

    Ok(())
}

async fn kick<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    by: &SessionId,
    target: &SessionId,
) -> Result<(), SharedeskError> {
    match state.sessions.delete(target.as_str()) {
        Ok(()) => {
            tracing::info!(%by, %target, "member kicked");
            Ok(())
        }
        Err(e @ SessionError::MemberNotFound(_)) => {
            send_error(conn, &state.codec, 404, &e.to_string()).await
        }
        Err(e) => {
            // The member is gone either way; only its connection could not
            // be told.
            tracing::warn!(%by, %target, error = %e, "kicked member did not close cleanly");
            Ok(())
        }
    }
}

/// Maps a session error to the status code sent to the client.
fn status_code(err: &SessionError) -> u16 {
    match err {
        SessionError::CredentialMissing | SessionError::CredentialInvalid => 401,
        SessionError::MemberNotFound(_) => 404,
        _ => 500,
    }
}

async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: &ServerMessage,
) -> Result<(), SharedeskError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await.map_err(SharedeskError::Transport)
}

/// Sends a `ServerMessage::Error` to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), SharedeskError> {
    send_message(
        conn,
        codec,
        &ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}
