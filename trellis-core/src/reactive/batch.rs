//! Batching and untracked reads.

use super::context::ReactiveContext;
use super::runtime;
use crate::error::Result;

/// Group writes so their observers run once, after `f` returns.
///
/// Values written inside the batch are visible immediately; only
/// re-execution is deferred. Nested batches compose: the queue is flushed when
/// the outermost one closes. An error from `f` is returned after the flush;
/// a flush error is returned when `f` succeeded.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use trellis_core::{batch, create_computed, create_root, Signal};
///
/// create_root(|_| {
///     let a = Signal::new(1);
///     let b = Signal::new(2);
///     let runs = Rc::new(Cell::new(0));
///
///     let (a2, b2, runs2) = (a.clone(), b.clone(), runs.clone());
///     create_computed(move || {
///         let _ = a2.get() + b2.get();
///         runs2.set(runs2.get() + 1);
///         Ok(())
///     })
///     .unwrap();
///
///     batch(|| {
///         a.set(10)?;
///         b.set(20)
///     })
///     .unwrap();
///
///     assert_eq!(runs.get(), 2);
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    runtime::begin_batch();

    // Pops the depth if `f` unwinds.
    struct BatchGuard {
        armed: bool,
    }

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            if self.armed {
                runtime::abandon_batch();
            }
        }
    }

    let mut guard = BatchGuard { armed: true };
    let result = f();
    guard.armed = false;

    let flushed = runtime::end_batch();
    let value = result?;
    flushed?;
    Ok(value)
}

/// Whether writes are currently deferred (inside a batch or a flush).
pub fn is_batching() -> bool {
    runtime::is_batching()
}

/// Run `f` without registering dependencies for the running computation.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}
