//! Boolean composition of request guards with exactly-once termination.
//!
//! A guard inspects a request and may terminate ("abort") it with a status
//! and optional payload. This crate composes guards with `And`/`Or` while
//! keeping termination well defined:
//! - **Isolation**: each operand runs against its own branch copy of the
//!   context, so one operand's decision is never visible to its sibling
//! - **Exactly once**: a context accepts a single termination; a second one
//!   is a [`Fault`], never an overwrite
//! - **First wins**: when both operands terminate, the first operand's
//!   decision is the one the combinator reports
//!
//! # Core Types
//!
//! - [`GuardContext`]: per-evaluation termination record for one request
//! - [`GuardScope`]: capability every guard receives (contexts and hosts)
//! - [`Guard`]: the operand trait guard authors implement
//! - [`And`] / [`Or`]: the combinators
//! - [`host::HostAdapter`]: writes the resolved decision onto the real request
//!
//! # Examples
//!
//! ```
//! use guard_combinators::host::{evaluate, Outcome, RecordingHost};
//! use guard_combinators::{and, from_fn, or, GuardScope};
//!
//! let authenticated = from_fn(|scope| scope.abort_with_status(401));
//! let is_owner = from_fn(|scope| scope.abort_with_status(403));
//! let is_admin = from_fn(|_| Ok(()));
//!
//! // Must be authenticated, and must be either the owner or an admin
//! let guard = and(authenticated, or(is_owner, is_admin));
//!
//! let mut host = RecordingHost::new();
//! let outcome = evaluate(&guard, &mut host).expect("no fault");
//!
//! assert!(matches!(outcome, Outcome::Terminated(_)));
//! assert_eq!(host.response().and_then(|r| r.status), Some(401));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod combinator;
mod context;
mod error;
mod guard;
pub mod host;
mod logging;
mod termination;

pub use combinator::{all, and, any, or, par_and, par_or, And, Or, Schedule};
pub use context::{GuardContext, GuardScope, HostRef};
pub use error::Fault;
pub use guard::{from_fn, BoxedGuard, FnGuard, Guard, GuardExt};
pub use termination::{GuardError, Payload, Termination, TerminationKind};
