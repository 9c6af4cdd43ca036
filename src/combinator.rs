//! `And` / `Or` composition of guards.
//!
//! Both combinators evaluate their operands against isolated branch copies
//! of the caller's scope, then merge at most one branch decision back:
//!
//! ```text
//! scope terminated? ── yes ──> return, operands not invoked
//!        │ no
//!        ▼
//! first  = scope.branch()      second = scope.branch()
//! g1.check(first)              g2.check(second)
//!        │
//!        ▼
//! And: merge first terminated branch (first, then second)
//! Or:  merge first only if both terminated
//! ```
//!
//! When both operands terminate, the first operand's decision is the one
//! merged. This holds under [`Schedule::Parallel`] too: the winner is chosen
//! by operand position, never by completion order.

use crate::context::{GuardContext, GuardScope};
use crate::error::Fault;
use crate::guard::{BoxedGuard, Guard};
use crate::logging::GuardLog;

/// How a combinator runs its two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Run the first operand, then the second, on the calling thread
    #[default]
    Sequential,
    /// Run both operands concurrently on the rayon thread pool
    Parallel,
}

/// Which operand a merged decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    First,
    Second,
}

/// Evaluates both operands on private branches of `scope`.
///
/// A fault from either operand is returned after both finished (parallel)
/// or as soon as it occurs (sequential). No merge happens in either case.
fn evaluate_branches<A, B>(
    scope: &dyn GuardScope,
    first: &A,
    second: &B,
    schedule: Schedule,
) -> Result<(GuardContext, GuardContext), Fault>
where
    A: Guard + ?Sized,
    B: Guard + ?Sized,
{
    let mut first_branch = scope.branch();
    let mut second_branch = scope.branch();

    match schedule {
        Schedule::Sequential => {
            first.check(&mut first_branch)?;
            second.check(&mut second_branch)?;
        }
        Schedule::Parallel => {
            let (first_result, second_result) = rayon::join(
                || first.check(&mut first_branch),
                || second.check(&mut second_branch),
            );
            first_result?;
            second_result?;
        }
    }

    Ok((first_branch, second_branch))
}

fn merge(
    scope: &mut dyn GuardScope,
    branch: &GuardContext,
    operand: Operand,
    log: GuardLog,
) -> Result<(), Fault> {
    scope.merge_from(branch)?;
    if let Some(decision) = scope.termination() {
        log.debug(format_args!("merged {:?} operand decision: {}", operand, decision));
    }
    Ok(())
}

/// Terminates when either operand terminates.
///
/// If both operands terminate, the first operand's decision wins.
///
/// # Examples
///
/// ```
/// use guard_combinators::{and, from_fn, Guard, GuardContext, GuardScope, HostRef};
///
/// let guard = and(
///     from_fn(|scope| scope.abort_with_status(404)),
///     from_fn(|scope| scope.abort_with_status(500)),
/// );
///
/// let mut ctx = GuardContext::new(HostRef::new(1));
/// guard.check(&mut ctx).unwrap();
/// assert_eq!(ctx.status_code(), Some(404));
/// ```
#[derive(Debug, Clone)]
pub struct And<A, B> {
    first: A,
    second: B,
    schedule: Schedule,
}

impl<A: Guard, B: Guard> And<A, B> {
    /// Combines two guards with the sequential schedule.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            schedule: Schedule::default(),
        }
    }

    /// Sets how the operands are run.
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }
}

impl<A: Guard, B: Guard> Guard for And<A, B> {
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        let log = GuardLog::new(scope.host_ref());
        if scope.is_terminated() {
            log.trace(format_args!("and: scope already terminated, operands skipped"));
            return Ok(());
        }

        let (first, second) =
            evaluate_branches(&*scope, &self.first, &self.second, self.schedule)?;

        if first.is_terminated() {
            if second.is_terminated() {
                log.trace(format_args!("and: both operands terminated, discarding second"));
            }
            merge(scope, &first, Operand::First, log)
        } else if second.is_terminated() {
            merge(scope, &second, Operand::Second, log)
        } else {
            log.trace(format_args!("and: no operand terminated"));
            Ok(())
        }
    }
}

/// Terminates only when both operands terminate.
///
/// The merged decision is always the first operand's; the second operand's
/// decision is discarded.
///
/// # Examples
///
/// ```
/// use guard_combinators::{or, from_fn, Guard, GuardContext, GuardScope, HostRef};
///
/// let guard = or(
///     from_fn(|scope| scope.abort_with_status(401)),
///     from_fn(|_| Ok(())),
/// );
///
/// let mut ctx = GuardContext::new(HostRef::new(1));
/// guard.check(&mut ctx).unwrap();
/// assert!(!ctx.is_terminated());
/// ```
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    first: A,
    second: B,
    schedule: Schedule,
}

impl<A: Guard, B: Guard> Or<A, B> {
    /// Combines two guards with the sequential schedule.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            schedule: Schedule::default(),
        }
    }

    /// Sets how the operands are run.
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }
}

impl<A: Guard, B: Guard> Guard for Or<A, B> {
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        let log = GuardLog::new(scope.host_ref());
        if scope.is_terminated() {
            log.trace(format_args!("or: scope already terminated, operands skipped"));
            return Ok(());
        }

        let (first, second) =
            evaluate_branches(&*scope, &self.first, &self.second, self.schedule)?;

        match (first.is_terminated(), second.is_terminated()) {
            (true, true) => merge(scope, &first, Operand::First, log),
            (first_terminated, second_terminated) => {
                log.trace(format_args!(
                    "or: discarding branch decisions (first: {}, second: {})",
                    first_terminated, second_terminated
                ));
                Ok(())
            }
        }
    }
}

/// Shorthand for [`And::new`].
pub fn and<A: Guard, B: Guard>(first: A, second: B) -> And<A, B> {
    And::new(first, second)
}

/// Shorthand for [`Or::new`].
pub fn or<A: Guard, B: Guard>(first: A, second: B) -> Or<A, B> {
    Or::new(first, second)
}

/// [`And`] with both operands run concurrently.
pub fn par_and<A: Guard, B: Guard>(first: A, second: B) -> And<A, B> {
    And::new(first, second).schedule(Schedule::Parallel)
}

/// [`Or`] with both operands run concurrently.
pub fn par_or<A: Guard, B: Guard>(first: A, second: B) -> Or<A, B> {
    Or::new(first, second).schedule(Schedule::Parallel)
}

/// Folds guards into left-nested [`And`]s.
///
/// The result terminates when any guard terminates, with the earliest
/// terminating guard's decision. Returns `None` for an empty list.
pub fn all(guards: Vec<BoxedGuard>) -> Option<BoxedGuard> {
    let mut guards = guards.into_iter();
    let first = guards.next()?;
    Some(guards.fold(first, |acc, next| {
        Box::new(And::new(acc, next)) as BoxedGuard
    }))
}

/// Folds guards into left-nested [`Or`]s.
///
/// The result terminates only when every guard terminates, with the first
/// guard's decision. Returns `None` for an empty list.
pub fn any(guards: Vec<BoxedGuard>) -> Option<BoxedGuard> {
    let mut guards = guards.into_iter();
    let first = guards.next()?;
    Some(guards.fold(first, |acc, next| {
        Box::new(Or::new(acc, next)) as BoxedGuard
    }))
}
