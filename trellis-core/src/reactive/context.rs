//! Reactive Context
//!
//! The reactive context tracks which computation is currently running and
//! which owner new computations belong to. When a signal is read, the current
//! computation (if any) becomes one of its observers.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running a computation pushes an entry naming
//! it as both subscriber and owner; `create_root` pushes an owner without a
//! subscriber; `untrack` pushes an entry with the enclosing owner and no
//! subscriber. The entry is popped when the guard drops, so the stack stays
//! balanced when user code returns early or panics.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::graph::{ComputationId, Owner, SignalId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// Owner for computations created while this entry is on top.
    owner: Option<Owner>,
    /// The computation collecting dependencies, if tracking.
    subscriber: Option<ComputationId>,
    /// Signals read during this entry, without duplicates.
    dependencies: SmallVec<[SignalId; 4]>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber: Option<ComputationId>,
}

impl ReactiveContext {
    /// Enter a new context for a running computation. Dependencies read while
    /// the guard lives are recorded for `subscriber`.
    pub(crate) fn enter(subscriber: ComputationId) -> Self {
        Self::push(Some(Owner::Computation(subscriber)), Some(subscriber))
    }

    /// Enter an ownership scope that does not track reads.
    pub(crate) fn enter_owner(owner: Owner) -> Self {
        Self::push(Some(owner), None)
    }

    /// Enter an untracked scope that keeps the current owner.
    pub(crate) fn untracked() -> Self {
        Self::push(Self::current_owner(), None)
    }

    fn push(owner: Option<Owner>, subscriber: Option<ComputationId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                owner,
                subscriber,
                dependencies: SmallVec::new(),
            });
        });

        Self { subscriber }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// The computation collecting dependencies, if any.
    pub fn current_subscriber() -> Option<ComputationId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.subscriber))
    }

    /// The owner new computations attach to, if any.
    pub fn current_owner() -> Option<Owner> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.owner))
    }

    /// Record a dependency on the given signal.
    ///
    /// Returns the subscriber when this is the first read of `signal` in the
    /// current run, so the caller can register the observer edge.
    pub(crate) fn track_dependency(signal: SignalId) -> Option<ComputationId> {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let entry = stack.last_mut()?;
            let subscriber = entry.subscriber?;
            if entry.dependencies.contains(&signal) {
                return None;
            }
            entry.dependencies.push(signal);
            Some(subscriber)
        })
    }

    /// Whether `computation` is running and has already read `signal` during
    /// the current run.
    pub(crate) fn has_read(computation: ComputationId, signal: SignalId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|entry| entry.subscriber == Some(computation))
                .is_some_and(|entry| entry.dependencies.contains(&signal))
        })
    }

    /// Take the dependencies collected by this context.
    pub(crate) fn take_dependencies(&self) -> SmallVec<[SignalId; 4]> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .map(|entry| std::mem::take(&mut entry.dependencies))
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The stack is gone during thread teardown; nothing to pop then.
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber, self.subscriber,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber, entry.subscriber
                );
            }
        });
    }
}
