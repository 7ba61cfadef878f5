//! The streaming collaborator driven by connect/disconnect events.

/// The media pipeline that produces the shared stream.
///
/// The session layer only needs to know whether it is running and to
/// start or stop it: the first participant to connect starts the stream,
/// and it stops once nobody is left.
///
/// Calls are made synchronously from whichever thread raised the event,
/// under the session manager's stream lock, so implementations should
/// return promptly.
pub trait CaptureManager: Send + Sync + 'static {
    /// Whether the stream is currently running.
    fn streaming(&self) -> bool;

    /// Starts the stream.
    fn start_stream(&self);

    /// Stops the stream.
    fn stop_stream(&self);
}

/// Lets a capture shared elsewhere (e.g. with a media pipeline task) be
/// handed to the manager directly.
impl<T: CaptureManager> CaptureManager for std::sync::Arc<T> {
    fn streaming(&self) -> bool {
        (**self).streaming()
    }

    fn start_stream(&self) {
        (**self).start_stream()
    }

    fn stop_stream(&self) {
        (**self).stop_stream()
    }
}
