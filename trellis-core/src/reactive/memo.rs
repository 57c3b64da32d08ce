//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. Nothing runs at creation. On first access, the memo runs its
//!    computation and caches the result.
//!
//! 2. When accessed again, if no dependencies have changed, the cached value
//!    is returned.
//!
//! 3. When a dependency changes, the memo is marked stale. If something
//!    observes the memo, the flush recomputes it; otherwise it stays stale
//!    until the next read.
//!
//! 4. After recomputing, the memo compares the new value with the cached one
//!    through its [`Equality`]. Only a real change notifies the memo's
//!    observers.
//!
//! # Why This Matters
//!
//! In a diamond (`a -> b, a -> c, (b, c) -> d`) the sink pulls `b` and `c`
//! when it reads them, so it never sees one updated and the other not.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::batch::batch;
use super::equality::Equality;
use super::runtime;
use crate::error::{Error, Result};
use crate::graph::{Body, ComputationId, NodeState, SignalId};

/// Lifecycle state of a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up to date.
    Clean,

    /// Never computed, or a dependency changed since the last computation.
    Stale,

    /// The owning scope was disposed.
    Disposed,
}

struct MemoCell<T> {
    value: RefCell<Option<T>>,
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Example
///
/// ```
/// use trellis_core::{create_memo, Signal};
///
/// let count = Signal::new(2);
/// let count_c = count.clone();
/// let doubled = create_memo(move || Ok(count_c.get() * 2));
///
/// assert_eq!(doubled.get().unwrap(), 4);
/// count.set(5).unwrap();
/// assert_eq!(doubled.get().unwrap(), 10);
/// ```
pub struct Memo<T: 'static> {
    id: ComputationId,
    signal: SignalId,
    cell: Rc<MemoCell<T>>,
}

/// Create a memo that skips notifying when the new value equals the old one.
pub fn create_memo<T, F>(f: F) -> Memo<T>
where
    T: PartialEq + 'static,
    F: FnMut() -> Result<T> + 'static,
{
    create_memo_with(f, Equality::value())
}

/// Create a memo with a custom equality gate.
pub fn create_memo_with<T, F>(mut f: F, equals: Equality<T>) -> Memo<T>
where
    T: 'static,
    F: FnMut() -> Result<T> + 'static,
{
    let cell = Rc::new(MemoCell {
        value: RefCell::new(None),
    });

    let body_cell = Rc::clone(&cell);
    let body: Body = Rc::new(RefCell::new(move || {
        let next = f()?;
        let mut slot = body_cell.value.borrow_mut();
        let changed = match slot.as_ref() {
            Some(current) => !equals.same(current, &next),
            None => true,
        };
        if changed {
            *slot = Some(next);
        }
        Ok(changed)
    }));

    let (id, signal) = runtime::create_memo_node(body);
    Memo { id, signal, cell }
}

impl<T: 'static> Memo<T> {
    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, recomputing if necessary.
    ///
    /// Errors from the computation are returned here, and the memo stays
    /// stale. Reading a memo from inside its own computation fails with
    /// [`Error::Cycle`].
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        batch(|| runtime::refresh(self.id))?;
        runtime::track(self.signal);

        let value = self.cell.value.borrow();
        match value.as_ref() {
            Some(value) => Ok(f(value)),
            None => Err(Error::Disposed),
        }
    }

    /// Get the current state.
    pub fn state(&self) -> MemoState {
        match runtime::computation_state(self.id) {
            Some(NodeState::Clean) => MemoState::Clean,
            Some(NodeState::Stale) => MemoState::Stale,
            None => MemoState::Disposed,
        }
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.cell.value.borrow().is_some()
    }

    /// Get the number of computations reading this memo.
    pub fn dependent_count(&self) -> usize {
        runtime::with_runtime(|rt| {
            rt.graph
                .signal(self.signal)
                .map_or(0, |node| node.observers.len())
        })
    }

    /// Stop recomputing. The last cached value stays readable.
    pub fn dispose(&self) {
        runtime::dispose_computation(self.id);
    }
}

impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            signal: self.signal,
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::reactive::{create_computed, create_root, Signal};

    #[test]
    fn memo_computes_on_first_access() {
        create_root(|_| {
            let calls = Rc::new(Cell::new(0));
            let calls_c = calls.clone();

            let memo = create_memo(move || {
                calls_c.set(calls_c.get() + 1);
                Ok(42)
            });

            // Not computed yet
            assert!(!memo.has_value());
            assert_eq!(memo.state(), MemoState::Stale);
            assert_eq!(calls.get(), 0);

            assert_eq!(memo.get().unwrap(), 42);
            assert_eq!(calls.get(), 1);
            assert!(memo.has_value());
            assert_eq!(memo.state(), MemoState::Clean);
        });
    }

    #[test]
    fn memo_caches_value_when_clean() {
        create_root(|_| {
            let calls = Rc::new(Cell::new(0));
            let calls_c = calls.clone();

            let memo = create_memo(move || {
                calls_c.set(calls_c.get() + 1);
                Ok(42)
            });

            assert_eq!(memo.get().unwrap(), 42);
            assert_eq!(memo.get().unwrap(), 42);
            assert_eq!(memo.with(|v| v + 1).unwrap(), 43);
            assert_eq!(calls.get(), 1);
        });
    }

    #[test]
    fn memo_recomputes_after_source_change() {
        create_root(|_| {
            let source = Signal::new(1);
            let calls = Rc::new(Cell::new(0));

            let (source_c, calls_c) = (source.clone(), calls.clone());
            let memo = create_memo(move || {
                calls_c.set(calls_c.get() + 1);
                Ok(source_c.get() * 10)
            });

            assert_eq!(memo.get().unwrap(), 10);

            // Unobserved: stays stale until read.
            source.set(2).unwrap();
            assert_eq!(memo.state(), MemoState::Stale);
            assert_eq!(calls.get(), 1);

            assert_eq!(memo.get().unwrap(), 20);
            assert_eq!(calls.get(), 2);
        });
    }

    #[test]
    fn equal_result_does_not_rerun_dependents() {
        create_root(|_| {
            let source = Signal::new(1);
            let source_c = source.clone();
            let parity = create_memo(move || Ok(source_c.get() % 2));

            let runs = Rc::new(Cell::new(0));
            let (parity_c, runs_c) = (parity.clone(), runs.clone());
            create_computed(move || {
                parity_c.get()?;
                runs_c.set(runs_c.get() + 1);
                Ok(())
            })
            .unwrap();
            assert_eq!(runs.get(), 1);
            assert_eq!(parity.dependent_count(), 1);

            source.set(3).unwrap();
            assert_eq!(runs.get(), 1);

            source.set(4).unwrap();
            assert_eq!(runs.get(), 2);
        });
    }

    #[test]
    fn never_equality_always_propagates() {
        create_root(|_| {
            let source = Signal::new(1);
            let source_c = source.clone();
            let memo = create_memo_with(move || Ok(source_c.get() % 2), Equality::Never);

            let runs = Rc::new(Cell::new(0));
            let (memo_c, runs_c) = (memo.clone(), runs.clone());
            create_computed(move || {
                memo_c.get()?;
                runs_c.set(runs_c.get() + 1);
                Ok(())
            })
            .unwrap();

            source.set(3).unwrap();
            assert_eq!(runs.get(), 2);
        });
    }

    #[test]
    fn diamond_runs_sink_once() {
        create_root(|_| {
            let a = Signal::new(1);
            let (a1, a2) = (a.clone(), a.clone());
            let b = create_memo(move || Ok(a1.get() + 1));
            let c = create_memo(move || Ok(a2.get() * 2));

            let seen = Rc::new(RefCell::new(Vec::new()));
            let (b_c, c_c, seen_c) = (b.clone(), c.clone(), seen.clone());
            create_computed(move || {
                seen_c.borrow_mut().push((b_c.get()?, c_c.get()?));
                Ok(())
            })
            .unwrap();

            a.set(5).unwrap();
            assert_eq!(*seen.borrow(), vec![(2, 2), (6, 10)]);
        });
    }

    #[test]
    fn self_read_is_a_cycle() {
        create_root(|_| {
            let slot: Rc<RefCell<Option<Memo<i32>>>> = Rc::new(RefCell::new(None));
            let slot_c = slot.clone();
            let memo = create_memo(move || match slot_c.borrow().as_ref() {
                Some(me) => me.get(),
                None => Ok(0),
            });
            *slot.borrow_mut() = Some(memo.clone());

            assert_eq!(memo.get(), Err(Error::Cycle));
            assert_eq!(memo.state(), MemoState::Stale);
            slot.borrow_mut().take();
        });
    }

    #[test]
    fn failed_compute_retries_on_next_read() {
        create_root(|_| {
            let source = Signal::new(-1);
            let source_c = source.clone();
            let memo = create_memo(move || {
                let v = source_c.get();
                if v < 0 {
                    Err(Error::user("negative"))
                } else {
                    Ok(v)
                }
            });

            assert_eq!(memo.get(), Err(Error::user("negative")));
            source.set(3).unwrap();
            assert_eq!(memo.get().unwrap(), 3);
        });
    }

    #[test]
    fn disposed_memo_keeps_last_value() {
        let source = Signal::new(1);
        let memo = create_root(|_| {
            let source_c = source.clone();
            create_memo(move || Ok(source_c.get()))
        });
        assert_eq!(memo.get().unwrap(), 1);

        memo.dispose();
        assert_eq!(memo.state(), MemoState::Disposed);
        source.set(2).unwrap();
        assert_eq!(memo.get().unwrap(), 1);
        assert_eq!(source.observer_count(), 0);
    }

    #[test]
    fn disposed_before_compute_errors() {
        let memo = create_root(|root| {
            let memo = create_memo(|| Ok(1));
            root.dispose();
            memo
        });
        assert_eq!(memo.get(), Err(Error::Disposed));
    }
}
