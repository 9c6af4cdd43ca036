//! The termination record a guard leaves behind when it denies a request.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

/// Shared error value attached to a [`Termination::StatusWithError`].
///
/// Reference-counted so merging a branch decision into its parent is a cheap
/// clone and branches evaluated on other threads can carry it back.
pub type GuardError = Arc<dyn StdError + Send + Sync>;

/// A guard's decision to stop the request.
///
/// The variant is the termination kind and carries exactly the payload that
/// kind needs, so a record can never claim one kind while storing another.
#[derive(Debug, Clone)]
pub enum Termination {
    /// Stop the request without a status or body
    Abort,
    /// Stop the request with a status and no body
    Status(u16),
    /// Stop the request with a status and attach an error for reporting
    StatusWithError(u16, GuardError),
    /// Stop the request with a status and a JSON response body
    StatusWithJson(u16, JsonValue),
}

/// Discriminant of a context's termination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationKind {
    /// The context has not terminated
    None,
    /// [`Termination::Abort`]
    Bare,
    /// [`Termination::Status`]
    StatusOnly,
    /// [`Termination::StatusWithError`]
    StatusWithError,
    /// [`Termination::StatusWithJson`]
    StatusWithJson,
}

/// Borrowed view of a termination payload.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// The attached error
    Error(&'a GuardError),
    /// The JSON response body
    Json(&'a JsonValue),
}

impl Termination {
    /// Builds a [`Termination::StatusWithError`] from any owned error.
    pub fn with_error(status: u16, err: impl StdError + Send + Sync + 'static) -> Self {
        Termination::StatusWithError(status, Arc::new(err))
    }

    /// Returns the kind of this termination.
    pub fn kind(&self) -> TerminationKind {
        match self {
            Termination::Abort => TerminationKind::Bare,
            Termination::Status(_) => TerminationKind::StatusOnly,
            Termination::StatusWithError(..) => TerminationKind::StatusWithError,
            Termination::StatusWithJson(..) => TerminationKind::StatusWithJson,
        }
    }

    /// Returns the intended response status, if the termination carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Termination::Abort => None,
            Termination::Status(code)
            | Termination::StatusWithError(code, _)
            | Termination::StatusWithJson(code, _) => Some(*code),
        }
    }

    /// Returns the error or JSON payload, if any.
    pub fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Termination::StatusWithError(_, err) => Some(Payload::Error(err)),
            Termination::StatusWithJson(_, body) => Some(Payload::Json(body)),
            Termination::Abort | Termination::Status(_) => None,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Abort => write!(f, "abort"),
            Termination::Status(code) => write!(f, "abort({})", code),
            Termination::StatusWithError(code, err) => {
                write!(f, "abort({}, error: {})", code, err)
            }
            Termination::StatusWithJson(code, _) => write!(f, "abort({}, json)", code),
        }
    }
}

impl fmt::Display for TerminationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationKind::None => write!(f, "none"),
            TerminationKind::Bare => write!(f, "bare"),
            TerminationKind::StatusOnly => write!(f, "status_only"),
            TerminationKind::StatusWithError => write!(f, "status_with_error"),
            TerminationKind::StatusWithJson => write!(f, "status_with_json"),
        }
    }
}
