//! Ownership roots.
//!
//! Every computation belongs to the root or computation that was current when
//! it was created. Disposing a root disposes everything it owns, depth first,
//! then runs the root's own cleanups.

use super::context::ReactiveContext;
use super::runtime;
use crate::graph::{Owner, RootId};

/// Handle to an ownership scope created by [`create_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Root {
    id: RootId,
}

impl Root {
    pub fn id(&self) -> RootId {
        self.id
    }

    /// Dispose every computation created inside the root. Idempotent.
    pub fn dispose(&self) {
        runtime::dispose_root(self.id);
    }

    pub fn is_disposed(&self) -> bool {
        !runtime::root_exists(self.id)
    }
}

/// Run `f` inside a new ownership scope.
///
/// The root outlives `f`; it stays alive until [`Root::dispose`] is called.
/// Roots created inside a computation are not owned by it.
pub fn create_root<R>(f: impl FnOnce(Root) -> R) -> R {
    let root = Root {
        id: runtime::create_root_node(),
    };
    let _ctx = ReactiveContext::enter_owner(Owner::Root(root.id));
    f(root)
}

/// Register `f` to run when the current owner re-runs or is disposed.
///
/// Cleanups run newest first and without tracking. Outside any owner the
/// cleanup is dropped without running.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    runtime::register_cleanup(Box::new(f));
}
