//! Shared fakes for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use sharedesk_protocol::{ServerMessage, SessionId};

use crate::{
    CaptureManager, IdentityMinter, Peer, PeerError, SessionConfig,
    SessionError, SessionManager,
};

/// A peer that records what it was sent and how it was closed.
#[derive(Clone, Default)]
pub(crate) struct RecordingPeer {
    sent: Arc<Mutex<Vec<ServerMessage>>>,
    closed: Arc<Mutex<Option<String>>>,
    fail: bool,
}

impl RecordingPeer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A peer whose every send and close fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<ServerMessage> {
        self.sent.lock().clone()
    }

    pub(crate) fn closed_with(&self) -> Option<String> {
        self.closed.lock().clone()
    }
}

impl Peer for RecordingPeer {
    fn send(&self, msg: &ServerMessage) -> Result<(), PeerError> {
        if self.fail {
            return Err(PeerError::Failed("broken pipe".into()));
        }
        self.sent.lock().push(msg.clone());
        Ok(())
    }

    fn close(&self, reason: &str) -> Result<(), PeerError> {
        if self.fail {
            return Err(PeerError::Closed);
        }
        *self.closed.lock() = Some(reason.to_string());
        Ok(())
    }
}

/// A capture that counts start/stop calls.
#[derive(Default)]
pub(crate) struct CountingCapture {
    streaming: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl CountingCapture {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}

impl CaptureManager for CountingCapture {
    fn streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    fn start_stream(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.streaming.store(true, Ordering::SeqCst);
    }

    fn stop_stream(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.streaming.store(false, Ordering::SeqCst);
    }
}

/// A minter that always fails.
pub(crate) struct FailingMinter;

impl IdentityMinter for FailingMinter {
    fn mint(&self) -> Result<SessionId, SessionError> {
        Err(SessionError::IdentityAllocationFailed(
            "entropy exhausted".into(),
        ))
    }
}

pub(crate) fn config() -> SessionConfig {
    SessionConfig {
        admin_password: "admin-pw".into(),
        password: "user-pw".into(),
        implicit_hosting: true,
    }
}

/// A manager with `admin-pw` / `user-pw` and a counting capture.
pub(crate) fn manager() -> (SessionManager, Arc<CountingCapture>) {
    manager_with(config(), CountingCapture::new())
}

pub(crate) fn manager_with(
    config: SessionConfig,
    capture: Arc<CountingCapture>,
) -> (SessionManager, Arc<CountingCapture>) {
    let mgr = SessionManager::new(Arc::clone(&capture), config);
    (mgr, capture)
}
