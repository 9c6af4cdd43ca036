use std::fmt;

use crate::context::HostRef;

/// A logger scoped to one request.
///
/// Every event carries the request's [`HostRef`] as the `host_ref` field so
/// branch decisions, merges and host writes for one evaluation can be
/// correlated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GuardLog {
    host_ref: HostRef,
}

impl GuardLog {
    pub(crate) fn new(host_ref: HostRef) -> Self {
        Self { host_ref }
    }

    /// Logs a trace-level message with the request identity.
    pub(crate) fn trace(&self, args: fmt::Arguments<'_>) {
        tracing::trace!(host_ref = %self.host_ref, "{}", args);
    }

    /// Logs a debug-level message with the request identity.
    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(host_ref = %self.host_ref, "{}", args);
    }

    /// Logs an info-level message with the request identity.
    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(host_ref = %self.host_ref, "{}", args);
    }

    /// Logs a warning-level message with the request identity.
    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(host_ref = %self.host_ref, "{}", args);
    }
}
