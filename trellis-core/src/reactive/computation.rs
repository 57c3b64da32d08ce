//! Computations and Effects
//!
//! A computation runs its body once at creation and again whenever a signal
//! it read during its last run changes.
//!
//! # Computations vs Effects
//!
//! Both re-run when their sources change; they differ in when:
//!
//! - A computation runs in the update lane, as soon as the flush reaches it.
//! - An effect runs in the effect lane, after every queued computation and
//!   observed memo has settled. Its first run is deferred to the end of the
//!   enclosing batch, if any.
//!
//! # Cleanup
//!
//! Cleanups registered with [`on_cleanup`](super::on_cleanup) while the body
//! runs are called before the next run and when the computation is disposed.
//! Computations created during a run are owned by it and disposed first.

use std::cell::RefCell;
use std::rc::Rc;

use super::batch::batch;
use super::runtime;
use crate::error::Result;
use crate::graph::{Body, ComputationId, NodeKind, NodeState};

/// Handle to a running computation or effect.
///
/// Dropping the handle does not stop the computation; dispose it or its
/// owning root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computation {
    id: ComputationId,
}

impl Computation {
    /// The computation's graph handle.
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// Current state, or `None` once disposed.
    pub fn state(&self) -> Option<NodeState> {
        runtime::computation_state(self.id)
    }

    /// Whether the computation has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state().is_none()
    }

    /// Stop the computation: it unsubscribes from every source, its children
    /// are disposed and its cleanups run.
    pub fn dispose(&self) {
        runtime::dispose_computation(self.id);
    }
}

fn into_body(mut f: impl FnMut() -> Result<()> + 'static) -> Body {
    Rc::new(RefCell::new(move || f().map(|()| false)))
}

/// Create a computation and run it immediately.
///
/// An error from the first run is returned, with the computation left stale;
/// a later write to anything it read before failing retries it.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use trellis_core::{create_computed, create_root, Signal};
///
/// create_root(|_| {
///     let count = Signal::new(0);
///     let seen = Rc::new(Cell::new(-1));
///
///     let (count_c, seen_c) = (count.clone(), seen.clone());
///     create_computed(move || {
///         seen_c.set(count_c.get());
///         Ok(())
///     })
///     .unwrap();
///     assert_eq!(seen.get(), 0);
///
///     count.set(5).unwrap();
///     assert_eq!(seen.get(), 5);
/// });
/// ```
pub fn create_computed<F>(f: F) -> Result<Computation>
where
    F: FnMut() -> Result<()> + 'static,
{
    let id = runtime::create_computation(NodeKind::Computed, into_body(f));
    batch(|| runtime::run_computation(id))?;
    Ok(Computation { id })
}

/// Create an effect. Its first run happens when the current batch closes,
/// or before this call returns when no batch is open.
pub fn create_effect<F>(f: F) -> Result<Computation>
where
    F: FnMut() -> Result<()> + 'static,
{
    let id = runtime::create_computation(NodeKind::Effect, into_body(f));
    batch(|| {
        runtime::schedule(id);
        Ok(())
    })?;
    Ok(Computation { id })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
