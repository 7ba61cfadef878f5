//! Event listeners that turn session state changes into broadcasts.
//!
//! Every listener holds a [`WeakSessionManager`]: the manager owns its
//! listeners, so a strong handle here would keep it alive forever.
//!
//! [`WeakSessionManager`]: sharedesk_session::WeakSessionManager

use std::sync::Arc;

use sharedesk_protocol::ServerMessage;
use sharedesk_session::SessionManager;

/// Registers the server's listeners on `sessions`.
pub(crate) fn install(sessions: &SessionManager) {
    let weak = sessions.downgrade();
    sessions.on_host(move |host| {
        if let Some(sessions) = weak.upgrade() {
            sessions.broadcast(
                &ServerMessage::HostChanged {
                    id: host.id().clone(),
                },
                None,
            );
        }
    });

    let weak = sessions.downgrade();
    sessions.on_host_cleared(move |previous| {
        if let Some(sessions) = weak.upgrade() {
            sessions.broadcast(
                &ServerMessage::HostCleared {
                    previous: previous.map(|s| s.id().clone()),
                },
                None,
            );
        }
    });

    let weak = sessions.downgrade();
    sessions.on_connected(move |session| {
        let Some(sessions) = weak.upgrade() else {
            return;
        };
        let newcomer = [session.id().clone()];
        sessions.broadcast(
            &ServerMessage::MemberConnected {
                member: session.info(),
            },
            Some(&newcomer[..]),
        );
        if sessions.implicit_hosting() && !sessions.has_host() {
            sessions.set_host(Arc::clone(session));
        }
    });

    let weak = sessions.downgrade();
    sessions.on_disconnected(move |session| {
        let Some(sessions) = weak.upgrade() else {
            return;
        };
        sessions.clear_host_if(session);
        sessions.broadcast(
            &ServerMessage::MemberDisconnected {
                id: session.id().clone(),
            },
            None,
        );
    });

    let weak = sessions.downgrade();
    sessions.on_receiving_started(move |session| {
        if let Some(sessions) = weak.upgrade() {
            sessions.admin_broadcast(
                &ServerMessage::ReceivingStarted {
                    id: session.id().clone(),
                },
                None,
            );
        }
    });

    let weak = sessions.downgrade();
    sessions.on_receiving_stopped(move |session| {
        if let Some(sessions) = weak.upgrade() {
            sessions.admin_broadcast(
                &ServerMessage::ReceivingStopped {
                    id: session.id().clone(),
                },
                None,
            );
        }
    });
}
