//! The operand capability external guard authors implement.

use std::fmt;
use std::sync::Arc;

use crate::combinator::{And, Or};
use crate::context::GuardScope;
use crate::error::Fault;

/// A unit of request-handling logic that may terminate the request.
///
/// A guard denies a request by calling exactly one termination method on
/// its scope, and allows it by returning without terminating. Denial is not
/// an error: `Err` is reserved for [`Fault`]s, which abort the whole
/// evaluation.
///
/// Guards must be `Send + Sync` so combinators can evaluate operands on
/// separate threads.
///
/// # Examples
///
/// ```
/// use guard_combinators::{Fault, Guard, GuardContext, GuardScope, HostRef};
///
/// struct RequireAdmin {
///     is_admin: bool,
/// }
///
/// impl Guard for RequireAdmin {
///     fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
///         if !self.is_admin {
///             scope.abort_with_status(403)?;
///         }
///         Ok(())
///     }
/// }
///
/// let mut ctx = GuardContext::new(HostRef::new(1));
/// RequireAdmin { is_admin: false }.check(&mut ctx).unwrap();
/// assert_eq!(ctx.status_code(), Some(403));
/// ```
pub trait Guard: Send + Sync {
    /// Inspects the request and terminates `scope` to deny it.
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault>;
}

/// A type-erased guard.
pub type BoxedGuard = Box<dyn Guard>;

impl<G: Guard + ?Sized> Guard for &G {
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        (**self).check(scope)
    }
}

impl<G: Guard + ?Sized> Guard for Box<G> {
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        (**self).check(scope)
    }
}

impl<G: Guard + ?Sized> Guard for Arc<G> {
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        (**self).check(scope)
    }
}

/// Guard built from a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnGuard<F> {
    f: F,
}

impl<F> fmt::Debug for FnGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGuard").finish_non_exhaustive()
    }
}

impl<F> Guard for FnGuard<F>
where
    F: Fn(&mut dyn GuardScope) -> Result<(), Fault> + Send + Sync,
{
    fn check(&self, scope: &mut dyn GuardScope) -> Result<(), Fault> {
        (self.f)(scope)
    }
}

/// Wraps a closure as a [`Guard`].
///
/// # Examples
///
/// ```
/// use guard_combinators::{from_fn, Guard, GuardContext, GuardScope, HostRef};
///
/// let not_found = from_fn(|scope| scope.abort_with_status(404));
///
/// let mut ctx = GuardContext::new(HostRef::new(1));
/// not_found.check(&mut ctx).unwrap();
/// assert!(ctx.is_terminated());
/// ```
pub fn from_fn<F>(f: F) -> FnGuard<F>
where
    F: Fn(&mut dyn GuardScope) -> Result<(), Fault> + Send + Sync,
{
    FnGuard { f }
}

/// Combinator methods available on every guard.
pub trait GuardExt: Guard + Sized {
    /// Terminates when either guard terminates. See [`And`].
    fn and<G: Guard>(self, other: G) -> And<Self, G> {
        And::new(self, other)
    }

    /// Terminates only when both guards terminate. See [`Or`].
    fn or<G: Guard>(self, other: G) -> Or<Self, G> {
        Or::new(self, other)
    }

    /// Erases the guard's type.
    fn boxed(self) -> BoxedGuard
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Guard> GuardExt for T {}
