//! Property tests for guard composition.
//!
//! Random guard trees are evaluated and compared against a reference model
//! of the And/Or rules, under both schedules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use guard_combinators::host::{evaluate, Outcome, RecordingHost};
use guard_combinators::{
    from_fn, And, BoxedGuard, Guard, GuardContext, GuardExt, GuardScope, HostRef, Or, Schedule,
};
use proptest::prelude::*;

/// Shape of a guard tree; a leaf either denies with a status or allows.
#[derive(Debug, Clone)]
enum Tree {
    Leaf(Option<u16>),
    And(Box<Tree>, Box<Tree>),
    Or(Box<Tree>, Box<Tree>),
}

fn arb_status() -> impl Strategy<Value = u16> {
    400u16..600
}

fn arb_tree() -> impl Strategy<Value = Tree> {
    let leaf = prop::option::of(arb_status()).prop_map(Tree::Leaf);
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Tree::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Tree::Or(Box::new(a), Box::new(b))),
        ]
    })
}

fn arb_schedule() -> impl Strategy<Value = Schedule> {
    prop_oneof![Just(Schedule::Sequential), Just(Schedule::Parallel)]
}

/// Reference semantics: And takes the first decision, Or needs both and
/// keeps the first.
fn model(tree: &Tree) -> Option<u16> {
    match tree {
        Tree::Leaf(decision) => *decision,
        Tree::And(a, b) => model(a).or_else(|| model(b)),
        Tree::Or(a, b) => match (model(a), model(b)) {
            (Some(first), Some(_)) => Some(first),
            _ => None,
        },
    }
}

fn build(tree: &Tree, schedule: Schedule, calls: &Arc<AtomicUsize>) -> BoxedGuard {
    match tree {
        Tree::Leaf(decision) => {
            let decision = *decision;
            let calls = Arc::clone(calls);
            from_fn(move |scope| {
                calls.fetch_add(1, Ordering::SeqCst);
                match decision {
                    Some(status) => scope.abort_with_status(status),
                    None => Ok(()),
                }
            })
            .boxed()
        }
        Tree::And(a, b) => And::new(build(a, schedule, calls), build(b, schedule, calls))
            .schedule(schedule)
            .boxed(),
        Tree::Or(a, b) => Or::new(build(a, schedule, calls), build(b, schedule, calls))
            .schedule(schedule)
            .boxed(),
    }
}

fn leaves(tree: &Tree) -> usize {
    match tree {
        Tree::Leaf(_) => 1,
        Tree::And(a, b) | Tree::Or(a, b) => leaves(a) + leaves(b),
    }
}

proptest! {
    /// Property: any tree resolves to the model's decision under any schedule
    #[test]
    fn proptest_tree_matches_model(tree in arb_tree(), schedule in arb_schedule()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let guard = build(&tree, schedule, &calls);

        let mut ctx = GuardContext::new(HostRef::fresh());
        guard.check(&mut ctx).expect("well-behaved leaves never fault");

        prop_assert_eq!(ctx.status_code(), model(&tree));
        prop_assert_eq!(ctx.is_terminated(), model(&tree).is_some());
    }

    /// Property: every leaf runs exactly once on an undecided request
    #[test]
    fn proptest_every_operand_runs_once(tree in arb_tree(), schedule in arb_schedule()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let guard = build(&tree, schedule, &calls);

        let mut ctx = GuardContext::new(HostRef::fresh());
        guard.check(&mut ctx).expect("no fault");

        prop_assert_eq!(calls.load(Ordering::SeqCst), leaves(&tree));
    }

    /// Property: a terminated request never invokes any operand and keeps
    /// its original decision
    #[test]
    fn proptest_terminated_request_is_untouched(
        tree in arb_tree(),
        schedule in arb_schedule(),
        status in arb_status(),
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        // Wrapped so the root is always a combinator; a bare leaf has no pre-check
        let guard = And::new(build(&tree, schedule, &calls), from_fn(|_| Ok(())).boxed());

        let mut ctx = GuardContext::new(HostRef::fresh());
        ctx.abort_with_status(status).expect("first termination");
        guard.check(&mut ctx).expect("no fault");

        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        prop_assert_eq!(ctx.status_code(), Some(status));
    }

    /// Property: an operand never observes its sibling's termination
    #[test]
    fn proptest_branches_are_isolated(status in arb_status(), deny_first in any::<bool>()) {
        let leaked = Arc::new(AtomicUsize::new(0));
        let observer = {
            let leaked = Arc::clone(&leaked);
            from_fn(move |scope| {
                if scope.is_terminated() {
                    leaked.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            })
        };
        let denier = from_fn(move |scope| scope.abort_with_status(status));

        let guard = if deny_first {
            And::new(denier.boxed(), observer.boxed())
        } else {
            And::new(observer.boxed(), denier.boxed())
        };

        let mut ctx = GuardContext::new(HostRef::fresh());
        guard.check(&mut ctx).expect("no fault");

        prop_assert_eq!(leaked.load(Ordering::SeqCst), 0);
        prop_assert_eq!(ctx.status_code(), Some(status));
    }

    /// Property: the host is written at most once, with the model's status
    #[test]
    fn proptest_host_written_at_most_once(tree in arb_tree(), schedule in arb_schedule()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let guard = build(&tree, schedule, &calls);

        let mut host = RecordingHost::new();
        let outcome = evaluate(&*guard, &mut host).expect("no fault");

        match model(&tree) {
            Some(status) => {
                prop_assert!(matches!(outcome, Outcome::Terminated(_)));
                prop_assert_eq!(host.abort_count(), 1);
                prop_assert_eq!(host.response().and_then(|r| r.status), Some(status));
            }
            None => {
                prop_assert!(outcome.is_passed());
                prop_assert_eq!(host.abort_count(), 0);
            }
        }
    }
}
