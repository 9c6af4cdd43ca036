//! Adapter writing guard decisions onto a host request.

use serde_json::Value as JsonValue;

use crate::context::{GuardScope, HostRef};
use crate::error::Fault;
use crate::guard::Guard;
use crate::logging::GuardLog;
use crate::termination::{GuardError, Termination};

/// The request-context capability a host framework provides.
///
/// Implementations map each method onto the framework's own abort calls.
/// `host_ref` must be stable for the lifetime of the request.
pub trait HostRequest {
    /// Returns the identity of this request.
    fn host_ref(&self) -> HostRef;

    /// Returns `true` if the request has already been aborted.
    fn is_aborted(&self) -> bool;

    /// Aborts without writing a status or body.
    fn abort(&mut self);

    /// Aborts and writes `status` with no body.
    fn abort_with_status(&mut self, status: u16);

    /// Aborts with `status` and attaches `err` for downstream error reporting.
    fn abort_with_error(&mut self, status: u16, err: GuardError);

    /// Aborts with `status` and `body` as the JSON response.
    fn abort_with_status_json(&mut self, status: u16, body: JsonValue);
}

/// Performs the host call matching `termination`.
pub fn apply_termination<H: HostRequest + ?Sized>(termination: &Termination, host: &mut H) {
    match termination {
        Termination::Abort => host.abort(),
        Termination::Status(status) => host.abort_with_status(*status),
        Termination::StatusWithError(status, err) => {
            host.abort_with_error(*status, GuardError::clone(err))
        }
        Termination::StatusWithJson(status, body) => {
            host.abort_with_status_json(*status, body.clone())
        }
    }
}

/// A [`GuardScope`] that writes its single decision straight onto the host.
///
/// Top-level guards receive this adapter. Combinators below it branch into
/// [`GuardContext`](crate::GuardContext)s and merge back at most once, so the
/// host is written at most once per evaluation.
#[derive(Debug)]
pub struct HostAdapter<'a, H: HostRequest + ?Sized> {
    host: &'a mut H,
    applied: Option<Termination>,
}

impl<'a, H: HostRequest + ?Sized> HostAdapter<'a, H> {
    /// Wraps `host` for one evaluation.
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            applied: None,
        }
    }

    /// Consumes the adapter and returns the decision it wrote, if any.
    pub fn into_applied(self) -> Option<Termination> {
        self.applied
    }
}

impl<H: HostRequest + ?Sized> GuardScope for HostAdapter<'_, H> {
    fn host_ref(&self) -> HostRef {
        self.host.host_ref()
    }

    fn termination(&self) -> Option<&Termination> {
        self.applied.as_ref()
    }

    fn is_terminated(&self) -> bool {
        self.applied.is_some() || self.host.is_aborted()
    }

    fn terminate(&mut self, termination: Termination) -> Result<(), Fault> {
        let host_ref = self.host.host_ref();
        let log = GuardLog::new(host_ref);

        let fault = if self.applied.is_some() {
            Fault::DoubleTermination { host_ref }
        } else if self.host.is_aborted() {
            Fault::HostAlreadyAborted { host_ref }
        } else {
            apply_termination(&termination, &mut *self.host);
            log.info(format_args!("request terminated: {}", termination));
            self.applied = Some(termination);
            return Ok(());
        };

        log.warn(format_args!("refused {}: {}", termination, fault));
        Err(fault)
    }
}

/// Result of running a guard chain against a host request.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No guard terminated; the request may proceed
    Passed,
    /// The chain terminated the request with this decision
    Terminated(Termination),
    /// The host was aborted before the chain ran; no guard was invoked
    AlreadyAborted,
}

impl Outcome {
    /// Returns `true` if the request may proceed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Runs `guard` against `host` and writes the resolved decision onto it.
///
/// # Errors
///
/// Returns the first [`Fault`] raised anywhere in the chain. The host may
/// already have been written if the fault came after the decision.
///
/// # Examples
///
/// ```
/// use guard_combinators::host::{evaluate, Outcome, RecordingHost};
/// use guard_combinators::{and, from_fn, GuardScope};
///
/// let guard = and(
///     from_fn(|_| Ok(())),
///     from_fn(|scope| scope.abort_with_status(403)),
/// );
///
/// let mut host = RecordingHost::new();
/// let outcome = evaluate(&guard, &mut host).expect("no fault");
///
/// assert!(matches!(outcome, Outcome::Terminated(_)));
/// assert_eq!(host.response().and_then(|r| r.status), Some(403));
/// ```
pub fn evaluate<G, H>(guard: &G, host: &mut H) -> Result<Outcome, Fault>
where
    G: Guard + ?Sized,
    H: HostRequest + ?Sized,
{
    let log = GuardLog::new(host.host_ref());
    if host.is_aborted() {
        log.debug(format_args!("host already aborted, guard chain skipped"));
        return Ok(Outcome::AlreadyAborted);
    }

    let mut adapter = HostAdapter::new(host);
    guard.check(&mut adapter)?;

    Ok(match adapter.into_applied() {
        Some(decision) => Outcome::Terminated(decision),
        None => {
            log.trace(format_args!("guard chain passed"));
            Outcome::Passed
        }
    })
}
