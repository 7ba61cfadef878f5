//! Lifecycle events and the listeners subscribed to them.
//!
//! Each [`EventKind`] has an ordered list of listeners, called
//! synchronously on the thread that raised the event. Two kinds have a
//! built-in coupling to the [`CaptureManager`](crate::CaptureManager)
//! that runs once per event, before any listener:
//!
//! | event          | coupling                                           |
//! |----------------|----------------------------------------------------|
//! | `connected`    | start the stream if it is not running              |
//! | `disconnected` | stop the stream if running and nobody is connected |
//!
//! The check-then-act in each coupling happens under the manager's stream
//! lock, so concurrent connects produce a single start call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Session, SessionManager};

/// The kinds of lifecycle events a session manager raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A session was made host. Payload: the new host.
    HostAssigned,
    /// The host was cleared. Payload: the previous host, if any.
    HostCleared,
    /// A session came online. Payload: that session.
    Connected,
    /// A session went offline. Payload: that session.
    Disconnected,
    /// A session's media started flowing.
    ReceivingStarted,
    /// A session's media stopped flowing.
    ReceivingStopped,
}

impl EventKind {
    /// Short wire-style name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostAssigned => "host",
            Self::HostCleared => "host_cleared",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::ReceivingStarted => "receiving_started",
            Self::ReceivingStopped => "receiving_stopped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Listener = Arc<dyn Fn(Option<&Arc<Session>>) + Send + Sync>;

/// Listener lists keyed by event kind.
#[derive(Default)]
pub(crate) struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<Listener>>>,
}

impl EventBus {
    fn subscribe(&self, kind: EventKind, listener: Listener) {
        self.listeners.write().entry(kind).or_default().push(listener);
    }

    /// Calls every listener for `kind` in registration order. The list is
    /// copied out first so listeners may subscribe more listeners.
    fn emit(&self, kind: EventKind, session: Option<&Arc<Session>>) {
        let listeners = self
            .listeners
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            listener(session);
        }
    }
}

impl SessionManager {
    /// Registers a listener for any event kind.
    ///
    /// The payload is `None` only for [`EventKind::HostCleared`] raised
    /// while no host was set. There is no unsubscribe.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(Option<&Arc<Session>>) + Send + Sync + 'static,
    {
        self.shared().events.subscribe(kind, Arc::new(listener));
    }

    /// Called with the new host after every [`set_host`](Self::set_host).
    pub fn on_host<F>(&self, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe_session(EventKind::HostAssigned, listener);
    }

    /// Called with the previous host after every
    /// [`clear_host`](Self::clear_host).
    pub fn on_host_cleared<F>(&self, listener: F)
    where
        F: Fn(Option<&Arc<Session>>) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::HostCleared, listener);
    }

    /// Called when a session comes online, after the stream was started
    /// if needed.
    pub fn on_connected<F>(&self, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe_session(EventKind::Connected, listener);
    }

    /// Called when a session goes offline, after the stream was stopped
    /// if it was the last one.
    pub fn on_disconnected<F>(&self, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe_session(EventKind::Disconnected, listener);
    }

    pub fn on_receiving_started<F>(&self, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe_session(EventKind::ReceivingStarted, listener);
    }

    pub fn on_receiving_stopped<F>(&self, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe_session(EventKind::ReceivingStopped, listener);
    }

    fn subscribe_session<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        self.subscribe(kind, move |session| {
            if let Some(session) = session {
                listener(session);
            }
        });
    }

    /// Runs the built-in coupling for `kind`, then every listener.
    ///
    /// Must be called with no manager or session lock held.
    pub(crate) fn raise(&self, kind: EventKind, session: Option<&Arc<Session>>) {
        match kind {
            EventKind::Connected => self.start_stream_if_idle(),
            EventKind::Disconnected => self.stop_stream_if_unwatched(),
            _ => {}
        }

        tracing::debug!(
            event = %kind,
            session_id = ?session.map(|s| s.id()),
            "raising session event"
        );
        self.shared().events.emit(kind, session);
    }

    fn start_stream_if_idle(&self) {
        let shared = self.shared();
        let _stream = shared.stream.lock();
        if !shared.capture.streaming() {
            tracing::info!("first member connected, starting stream");
            shared.capture.start_stream();
        }
    }

    fn stop_stream_if_unwatched(&self) {
        let shared = self.shared();
        let _stream = shared.stream.lock();
        if shared.capture.streaming() && !self.has_connected_members() {
            tracing::info!("last member disconnected, stopping stream");
            shared.capture.stop_stream();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::MemberProfile;
    use crate::testing::{RecordingPeer, manager};

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::HostAssigned.to_string(), "host");
        assert_eq!(EventKind::HostCleared.to_string(), "host_cleared");
        assert_eq!(EventKind::ReceivingStopped.to_string(), "receiving_stopped");
    }

    #[test]
    fn test_first_connect_starts_stream_once() {
        let (mgr, capture) = manager();
        let a = mgr.create("a", MemberProfile::ad_hoc(false));
        let b = mgr.create("b", MemberProfile::ad_hoc(false));

        a.connect(RecordingPeer::new());
        b.connect(RecordingPeer::new());

        assert_eq!(capture.starts(), 1);
        assert!(capture.is_streaming());
    }

    #[test]
    fn test_last_disconnect_stops_stream_once() {
        let (mgr, capture) = manager();
        let a = mgr.create("a", MemberProfile::ad_hoc(false));
        let b = mgr.create("b", MemberProfile::ad_hoc(false));
        a.connect(RecordingPeer::new());
        b.connect(RecordingPeer::new());

        a.mark_disconnected();
        assert_eq!(capture.stops(), 0);

        b.mark_disconnected();
        assert_eq!(capture.stops(), 1);
        assert!(!capture.is_streaming());
    }

    #[test]
    fn test_coupling_runs_without_listeners() {
        let (mgr, capture) = manager();
        mgr.create("a", MemberProfile::ad_hoc(false))
            .connect(RecordingPeer::new());
        assert_eq!(capture.starts(), 1);
    }

    #[test]
    fn test_connected_listener_sees_stream_already_started() {
        let (mgr, capture) = manager();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let probe = Arc::clone(&capture);
        mgr.on_connected(move |_| {
            *slot.lock().unwrap() = Some(probe.is_streaming());
        });

        mgr.create("a", MemberProfile::ad_hoc(false))
            .connect(RecordingPeer::new());

        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let (mgr, _) = manager();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            mgr.on_connected(move |_| order.lock().unwrap().push(n));
        }

        mgr.create("a", MemberProfile::ad_hoc(false))
            .connect(RecordingPeer::new());

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_receiving_events_fire_on_change_only() {
        let (mgr, _) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        let started = Arc::clone(&log);
        mgr.on_receiving_started(move |s| {
            started.lock().unwrap().push(format!("start {}", s.id()));
        });
        let stopped = Arc::clone(&log);
        mgr.on_receiving_stopped(move |s| {
            stopped.lock().unwrap().push(format!("stop {}", s.id()));
        });
        let session = mgr.create("a", MemberProfile::ad_hoc(false));
        session.connect(RecordingPeer::new());

        session.set_receiving(true);
        session.set_receiving(true);
        session.set_receiving(false);

        assert_eq!(*log.lock().unwrap(), vec!["start a", "stop a"]);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let (mgr, _) = manager();
        let weak = mgr.downgrade();
        let late_calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&late_calls);
        mgr.on_connected(move |_| {
            if let Some(mgr) = weak.upgrade() {
                let counter = Arc::clone(&counter);
                mgr.on_disconnected(move |_| *counter.lock().unwrap() += 1);
            }
        });

        let session = mgr.create("a", MemberProfile::ad_hoc(false));
        session.connect(RecordingPeer::new());
        session.mark_disconnected();

        assert_eq!(*late_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_disconnect_listener_may_query_registry() {
        let (mgr, _) = manager();
        let weak = mgr.downgrade();
        let remaining = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&remaining);
        mgr.on_disconnected(move |_| {
            if let Some(mgr) = weak.upgrade() {
                *slot.lock().unwrap() = Some(mgr.has_connected_members());
            }
        });
        let session = mgr.create("a", MemberProfile::ad_hoc(false));
        session.connect(RecordingPeer::new());

        mgr.delete("a").unwrap();

        assert_eq!(*remaining.lock().unwrap(), Some(false));
    }
}
