use std::fmt;

use crate::context::HostRef;

/// Programming faults raised by the guard protocol.
///
/// A fault is never a guard decision. Guards deny requests by terminating
/// their context; a `Fault` means the protocol itself was misused and the
/// request-handling unit should not continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// A second termination was attempted on an already terminated context
    DoubleTermination {
        /// The request the context belongs to
        host_ref: HostRef,
    },
    /// A merge was attempted from a context that never terminated
    MergeFromUnterminated {
        /// The request the source context belongs to
        host_ref: HostRef,
    },
    /// A merge was attempted from a context derived from another request
    ForeignHost {
        /// The request the destination belongs to
        expected: HostRef,
        /// The request the source belongs to
        found: HostRef,
    },
    /// The host was aborted outside the guard chain before a decision was written
    HostAlreadyAborted {
        /// The request that was already aborted
        host_ref: HostRef,
    },
}

impl Fault {
    /// Returns the request the fault was raised against.
    ///
    /// For [`Fault::ForeignHost`] this is the destination's request.
    pub fn host_ref(&self) -> HostRef {
        match self {
            Fault::DoubleTermination { host_ref }
            | Fault::MergeFromUnterminated { host_ref }
            | Fault::HostAlreadyAborted { host_ref } => *host_ref,
            Fault::ForeignHost { expected, .. } => *expected,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::DoubleTermination { host_ref } => {
                write!(f, "double termination of guard context for {}", host_ref)
            }
            Fault::MergeFromUnterminated { host_ref } => {
                write!(f, "merge source for {} is not terminated", host_ref)
            }
            Fault::ForeignHost { expected, found } => write!(
                f,
                "merge source belongs to {} but destination belongs to {}",
                found, expected
            ),
            Fault::HostAlreadyAborted { host_ref } => {
                write!(f, "host {} was already aborted", host_ref)
            }
        }
    }
}

impl std::error::Error for Fault {}
