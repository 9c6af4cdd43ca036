use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value as JsonValue;

use crate::error::Fault;
use crate::logging::GuardLog;
use crate::termination::{GuardError, Payload, Termination, TerminationKind};

static NEXT_HOST_REF: AtomicU64 = AtomicU64::new(1);

/// Where a [`HostRef`] identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Origin {
    /// Supplied by the host framework
    Host,
    /// Allocated by this process
    Local,
}

/// Opaque identity of the underlying request a context was derived from.
///
/// Only used to check that a merge source and destination describe the same
/// request. It confers no ownership.
///
/// Host-supplied ids ([`HostRef::new`]) and process-allocated ids
/// ([`HostRef::fresh`]) live in separate namespaces and never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostRef {
    origin: Origin,
    id: u64,
}

impl HostRef {
    /// Wraps an identity the host already carries (a request counter, a
    /// connection-scoped id, ...).
    pub fn new(id: u64) -> Self {
        Self {
            origin: Origin::Host,
            id,
        }
    }

    /// Allocates an identity unique within this process.
    pub fn fresh() -> Self {
        Self {
            origin: Origin::Local,
            id: NEXT_HOST_REF.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns the raw identity, without its namespace.
    pub fn get(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Origin::Host => write!(f, "host#{}", self.id),
            Origin::Local => write!(f, "local#{}", self.id),
        }
    }
}

/// The capability a guard receives: inspect the request's termination state
/// and terminate it at most once.
///
/// Both [`GuardContext`] and the host adapter ([`crate::host::HostAdapter`])
/// implement this trait, so a combinator accepts either without inspecting
/// the concrete type.
///
/// Every termination method returns [`Fault::DoubleTermination`] when the
/// scope already terminated.
///
/// [`is_terminated`](Self::is_terminated) is the authoritative "stop" check.
/// [`termination`](Self::termination) only reports decisions made through
/// this scope; a host aborted outside the guard chain is terminated but has
/// no recorded termination.
pub trait GuardScope {
    /// Returns the identity of the request this scope belongs to.
    fn host_ref(&self) -> HostRef;

    /// Returns the decision recorded through this scope, if any.
    ///
    /// `None` does not imply the request may proceed; check
    /// [`is_terminated`](Self::is_terminated) for that.
    fn termination(&self) -> Option<&Termination>;

    /// Records `termination` as this scope's decision.
    fn terminate(&mut self, termination: Termination) -> Result<(), Fault>;

    /// Returns `true` once the request must not be processed further,
    /// whoever terminated it.
    fn is_terminated(&self) -> bool {
        self.termination().is_some()
    }

    /// Returns a fresh, non-terminated context for the same request.
    ///
    /// The branch shares nothing mutable with `self`; terminating it has no
    /// effect until it is merged back.
    fn branch(&self) -> GuardContext {
        GuardContext::new(self.host_ref())
    }

    /// Terminates without a status or body.
    fn abort(&mut self) -> Result<(), Fault> {
        self.terminate(Termination::Abort)
    }

    /// Terminates with `status` and no body.
    fn abort_with_status(&mut self, status: u16) -> Result<(), Fault> {
        self.terminate(Termination::Status(status))
    }

    /// Terminates with `status` and attaches `err` for error reporting.
    fn abort_with_status_error(&mut self, status: u16, err: GuardError) -> Result<(), Fault> {
        self.terminate(Termination::StatusWithError(status, err))
    }

    /// Terminates with `status` and `body` as the JSON response.
    fn abort_with_status_json(&mut self, status: u16, body: JsonValue) -> Result<(), Fault> {
        self.terminate(Termination::StatusWithJson(status, body))
    }

    /// Copies a terminated branch's decision into this scope.
    ///
    /// # Errors
    ///
    /// - [`Fault::MergeFromUnterminated`] if `source` has not terminated,
    ///   checked first
    /// - [`Fault::ForeignHost`] if `source` belongs to another request
    /// - [`Fault::DoubleTermination`] if this scope already terminated
    fn merge_from(&mut self, source: &GuardContext) -> Result<(), Fault> {
        let decision = validate_merge(self.host_ref(), source)?;
        self.terminate(decision.clone())
    }
}

fn validate_merge(dest: HostRef, source: &GuardContext) -> Result<&Termination, Fault> {
    let fault = match &source.termination {
        None => Fault::MergeFromUnterminated {
            host_ref: source.host_ref,
        },
        Some(_) if source.host_ref != dest => Fault::ForeignHost {
            expected: dest,
            found: source.host_ref,
        },
        Some(decision) => return Ok(decision),
    };

    GuardLog::new(dest).warn(format_args!("rejected merge: {}", fault));
    Err(fault)
}

/// The outcome of evaluating one guard against one request.
///
/// A context starts non-terminated and accepts at most one termination.
/// Contexts handed to combinator operands are branch copies and are consumed
/// by the combinator that created them.
///
/// # Examples
///
/// ```
/// use guard_combinators::{GuardContext, GuardScope, HostRef};
///
/// let mut ctx = GuardContext::new(HostRef::new(1));
/// assert!(!ctx.is_terminated());
///
/// ctx.abort_with_status(401).expect("first termination");
/// assert_eq!(ctx.status_code(), Some(401));
///
/// // A second decision is a fault, never an overwrite
/// assert!(ctx.abort_with_status(500).is_err());
/// assert_eq!(ctx.status_code(), Some(401));
/// ```
#[derive(Debug)]
pub struct GuardContext {
    host_ref: HostRef,
    termination: Option<Termination>,
}

impl GuardContext {
    /// Creates a non-terminated context for the request identified by `host_ref`.
    pub fn new(host_ref: HostRef) -> Self {
        Self {
            host_ref,
            termination: None,
        }
    }

    /// Returns an independent, non-terminated context for the same request.
    pub fn copy(&self) -> Self {
        Self::new(self.host_ref)
    }

    /// Returns the recorded status, if terminated with one.
    pub fn status_code(&self) -> Option<u16> {
        self.termination.as_ref().and_then(Termination::status_code)
    }

    /// Returns the recorded error or JSON payload, if any.
    pub fn payload(&self) -> Option<Payload<'_>> {
        self.termination.as_ref().and_then(Termination::payload)
    }

    /// Returns the termination kind, [`TerminationKind::None`] while undecided.
    pub fn kind(&self) -> TerminationKind {
        self.termination
            .as_ref()
            .map_or(TerminationKind::None, Termination::kind)
    }

    /// Consumes the context and returns its decision.
    pub fn into_termination(self) -> Option<Termination> {
        self.termination
    }
}

impl GuardScope for GuardContext {
    fn host_ref(&self) -> HostRef {
        self.host_ref
    }

    fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    fn terminate(&mut self, termination: Termination) -> Result<(), Fault> {
        let log = GuardLog::new(self.host_ref);
        if let Some(existing) = &self.termination {
            let fault = Fault::DoubleTermination {
                host_ref: self.host_ref,
            };
            log.warn(format_args!(
                "refused {} on context already terminated with {}",
                termination, existing
            ));
            return Err(fault);
        }

        log.trace(format_args!("context terminated: {}", termination));
        self.termination = Some(termination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Expired;

    impl fmt::Display for Expired {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "token expired")
        }
    }

    impl std::error::Error for Expired {}

    #[test]
    fn new_context_is_not_terminated() {
        let ctx = GuardContext::new(HostRef::new(1));
        assert!(!ctx.is_terminated());
        assert_eq!(ctx.kind(), TerminationKind::None);
        assert_eq!(ctx.status_code(), None);
        assert!(ctx.payload().is_none());
    }

    #[test]
    fn fresh_host_refs_are_distinct() {
        assert_ne!(HostRef::fresh(), HostRef::fresh());
    }

    #[test]
    fn host_and_local_ids_never_collide() {
        for _ in 0..8 {
            let local = HostRef::fresh();
            let host = HostRef::new(local.get());

            assert_eq!(host.get(), local.get());
            assert_ne!(host, local);
            assert_eq!(host.to_string(), format!("host#{}", local.get()));
            assert_eq!(local.to_string(), format!("local#{}", local.get()));
        }
    }

    #[test]
    fn merge_between_colliding_raw_ids_is_foreign() {
        let local = HostRef::fresh();
        let mut ctx = GuardContext::new(local);
        let mut other = GuardContext::new(HostRef::new(local.get()));
        other.abort_with_status(403).unwrap();

        assert!(matches!(
            ctx.merge_from(&other),
            Err(Fault::ForeignHost { .. })
        ));
        assert!(!ctx.is_terminated());
    }

    #[test]
    fn copy_resets_termination_and_keeps_host() {
        let mut ctx = GuardContext::new(HostRef::new(3));
        ctx.abort_with_status(403).unwrap();

        let copy = ctx.copy();
        assert_eq!(copy.host_ref(), HostRef::new(3));
        assert!(!copy.is_terminated());
        assert!(ctx.is_terminated());
    }

    #[test]
    fn terminating_a_copy_leaves_the_original_alone() {
        let ctx = GuardContext::new(HostRef::new(4));
        let mut first = ctx.branch();
        let second = ctx.branch();

        first.abort_with_status(404).unwrap();

        assert!(first.is_terminated());
        assert!(!second.is_terminated());
        assert!(!ctx.is_terminated());
    }

    #[test]
    fn each_convenience_form_records_its_kind() {
        let host = HostRef::new(5);

        let mut bare = GuardContext::new(host);
        bare.abort().unwrap();
        assert_eq!(bare.kind(), TerminationKind::Bare);

        let mut status = GuardContext::new(host);
        status.abort_with_status(401).unwrap();
        assert_eq!(status.kind(), TerminationKind::StatusOnly);

        let mut error = GuardContext::new(host);
        error
            .abort_with_status_error(401, Arc::new(Expired))
            .unwrap();
        assert_eq!(error.kind(), TerminationKind::StatusWithError);
        assert!(matches!(
            error.payload(),
            Some(Payload::Error(e)) if e.to_string() == "token expired"
        ));

        let mut body = GuardContext::new(host);
        body.abort_with_status_json(400, json!({"error": "bad"}))
            .unwrap();
        assert_eq!(body.kind(), TerminationKind::StatusWithJson);
        assert_eq!(body.status_code(), Some(400));
    }

    #[test]
    fn double_termination_faults_and_keeps_first_decision() {
        let mut ctx = GuardContext::new(HostRef::new(6));
        ctx.abort_with_status(401).unwrap();

        let result = ctx.abort_with_status_json(500, json!(null));
        assert_eq!(
            result,
            Err(Fault::DoubleTermination {
                host_ref: HostRef::new(6)
            })
        );
        assert_eq!(ctx.kind(), TerminationKind::StatusOnly);
        assert_eq!(ctx.status_code(), Some(401));
    }

    #[test]
    fn merge_copies_the_decision() {
        let mut ctx = GuardContext::new(HostRef::new(7));
        let mut branch = ctx.branch();
        branch
            .abort_with_status_json(409, json!({"conflict": true}))
            .unwrap();

        ctx.merge_from(&branch).unwrap();

        assert_eq!(ctx.status_code(), Some(409));
        assert!(matches!(ctx.payload(), Some(Payload::Json(v)) if v["conflict"] == true));
    }

    #[test]
    fn merge_from_unterminated_source_faults() {
        let mut ctx = GuardContext::new(HostRef::new(8));
        let branch = ctx.branch();

        assert_eq!(
            ctx.merge_from(&branch),
            Err(Fault::MergeFromUnterminated {
                host_ref: HostRef::new(8)
            })
        );
        assert!(!ctx.is_terminated());
    }

    #[test]
    fn merge_from_foreign_host_faults() {
        let mut ctx = GuardContext::new(HostRef::new(9));
        let mut foreign = GuardContext::new(HostRef::new(10));
        foreign.abort_with_status(403).unwrap();

        assert_eq!(
            ctx.merge_from(&foreign),
            Err(Fault::ForeignHost {
                expected: HostRef::new(9),
                found: HostRef::new(10),
            })
        );
        assert!(!ctx.is_terminated());
    }

    #[test]
    fn unterminated_source_is_reported_before_foreign_host() {
        let mut ctx = GuardContext::new(HostRef::new(13));
        let foreign = GuardContext::new(HostRef::new(14));

        assert_eq!(
            ctx.merge_from(&foreign),
            Err(Fault::MergeFromUnterminated {
                host_ref: HostRef::new(14)
            })
        );
    }

    #[test]
    fn second_merge_is_a_double_termination() {
        let mut ctx = GuardContext::new(HostRef::new(11));
        let mut branch = ctx.branch();
        branch.abort_with_status(401).unwrap();

        ctx.merge_from(&branch).unwrap();
        assert!(matches!(
            ctx.merge_from(&branch),
            Err(Fault::DoubleTermination { .. })
        ));
    }

    #[test]
    fn into_termination_returns_the_decision() {
        let mut ctx = GuardContext::new(HostRef::new(12));
        ctx.abort_with_status(418).unwrap();
        let decision = ctx.into_termination().expect("terminated");
        assert_eq!(decision.status_code(), Some(418));
    }
}
