//! Best-effort fan-out to connected sessions.

use sharedesk_protocol::{ServerMessage, SessionId};

use crate::{SessionError, SessionManager};

impl SessionManager {
    /// Sends `msg` to every connected session not listed in `exclude`.
    ///
    /// A failed delivery is logged and skipped; the rest still go out and
    /// the caller is not told. `exclude: None` means no one is excluded.
    pub fn broadcast(&self, msg: &ServerMessage, exclude: Option<&[SessionId]>) {
        self.fan_out(msg, exclude, false);
    }

    /// Like [`broadcast`](Self::broadcast), restricted to administrators.
    pub fn admin_broadcast(
        &self,
        msg: &ServerMessage,
        exclude: Option<&[SessionId]>,
    ) {
        self.fan_out(msg, exclude, true);
    }

    /// Runs under the registry lock for the whole iteration. Delivery goes
    /// through each session's peer only, never back into the registry.
    fn fan_out(
        &self,
        msg: &ServerMessage,
        exclude: Option<&[SessionId]>,
        admin_only: bool,
    ) {
        let members = self.shared().members.lock();

        for (id, session) in members.iter() {
            if !session.is_connected() || (admin_only && !session.is_admin()) {
                continue;
            }
            if exclude.is_some_and(|excluded| excluded.contains(id)) {
                continue;
            }

            match session.send(msg) {
                Ok(()) => {}
                // Went offline between the check and the send.
                Err(SessionError::NotConnected(_)) => {}
                Err(e) => {
                    tracing::warn!(
                        session_id = %id,
                        admin_only,
                        error = %e,
                        "broadcast delivery failed"
                    );
                }
            }
        }
    }
}
