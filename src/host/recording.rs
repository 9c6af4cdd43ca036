use serde_json::Value as JsonValue;

use crate::context::HostRef;
use crate::termination::GuardError;

use super::HostRequest;

/// The terminating response a [`RecordingHost`] was asked to write.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Response status, absent for a bare abort
    pub status: Option<u16>,
    /// JSON response body
    pub body: Option<JsonValue>,
    /// Error attached for downstream reporting
    pub error: Option<GuardError>,
}

/// An in-memory [`HostRequest`].
///
/// Records the abort calls it receives without any network I/O, which makes
/// guard chains testable offline and embeddable outside a web framework.
/// Later abort calls replace the recorded response, mirroring hosts that
/// let a second abort overwrite the first; [`abort_count`](Self::abort_count)
/// exposes how many writes happened.
///
/// # Examples
///
/// ```
/// use guard_combinators::host::{HostRequest, RecordingHost};
///
/// let mut host = RecordingHost::new();
/// assert!(!host.is_aborted());
///
/// host.abort_with_status(404);
/// assert!(host.is_aborted());
/// assert_eq!(host.response().and_then(|r| r.status), Some(404));
/// ```
#[derive(Debug)]
pub struct RecordingHost {
    host_ref: HostRef,
    response: Option<Response>,
    abort_count: usize,
}

impl RecordingHost {
    /// Creates a host request with a fresh identity.
    pub fn new() -> Self {
        Self::with_host_ref(HostRef::fresh())
    }

    /// Creates a host request with the given identity.
    pub fn with_host_ref(host_ref: HostRef) -> Self {
        Self {
            host_ref,
            response: None,
            abort_count: 0,
        }
    }

    /// Returns the last recorded response, if the request was aborted.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Returns how many abort calls the host received.
    pub fn abort_count(&self) -> usize {
        self.abort_count
    }

    fn record(&mut self, response: Response) {
        self.abort_count += 1;
        self.response = Some(response);
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRequest for RecordingHost {
    fn host_ref(&self) -> HostRef {
        self.host_ref
    }

    fn is_aborted(&self) -> bool {
        self.response.is_some()
    }

    fn abort(&mut self) {
        self.record(Response::default());
    }

    fn abort_with_status(&mut self, status: u16) {
        self.record(Response {
            status: Some(status),
            ..Response::default()
        });
    }

    fn abort_with_error(&mut self, status: u16, err: GuardError) {
        self.record(Response {
            status: Some(status),
            error: Some(err),
            ..Response::default()
        });
    }

    fn abort_with_status_json(&mut self, status: u16, body: JsonValue) {
        self.record(Response {
            status: Some(status),
            body: Some(body),
            ..Response::default()
        });
    }
}
