//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph and
//! the handles used to address them.
//!
//! Nodes are stored in slab arenas. A handle carries the slab slot plus a
//! stamp drawn from a global counter when the node was inserted, so a handle
//! that outlives its node never resolves to whatever later reuses the slot.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::error::Result;

/// Generate a new unique node stamp.
pub(crate) fn next_stamp() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            slot: usize,
            stamp: u64,
        }

        impl $name {
            pub(crate) fn new(slot: usize, stamp: u64) -> Self {
                Self { slot, stamp }
            }

            pub(crate) fn slot(self) -> usize {
                self.slot
            }

            pub(crate) fn stamp(self) -> u64 {
                self.stamp
            }
        }
    };
}

arena_id! {
    /// Handle to a signal node.
    SignalId
}

arena_id! {
    /// Handle to a computation node (plain computation, memo or effect).
    ComputationId
}

arena_id! {
    /// Handle to an ownership root.
    RootId
}

/// Who disposes a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// An explicit root created by `create_root`.
    Root(RootId),
    /// The computation that was running when this one was created.
    Computation(ComputationId),
}

/// The kind of computation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Runs synchronously when its sources change.
    Computed,

    /// A cached derived value, recomputed lazily when read while stale.
    /// Exposes its result through its own signal node.
    Memo,

    /// Runs in the effect lane, after all pending computations and memos.
    Effect,
}

/// Freshness of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// The last run saw the current values of all its sources.
    Clean,

    /// A source changed (or the last run failed). Needs to run again.
    Stale,
}

/// A computation body. Returns whether the produced value changed, which is
/// only meaningful for memos.
pub(crate) type Body = Rc<RefCell<dyn FnMut() -> Result<bool>>>;

/// A cleanup registered through `on_cleanup`.
pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// A signal in the dependency graph.
///
/// The value itself lives in the user-facing handle; the graph only keeps the
/// observer set.
#[derive(Debug)]
pub(crate) struct SignalNode {
    pub(crate) stamp: u64,

    /// Computations that read this signal, in subscription order.
    pub(crate) observers: IndexSet<ComputationId>,
}

/// A computation in the dependency graph.
pub(crate) struct ComputationNode {
    pub(crate) stamp: u64,
    pub(crate) kind: NodeKind,
    pub(crate) state: NodeState,

    /// Whether the node currently sits in the update queue.
    pub(crate) queued: bool,

    /// Whether the body is executing right now.
    pub(crate) running: bool,

    /// Signals read during the last completed run.
    pub(crate) sources: SmallVec<[SignalId; 4]>,

    pub(crate) body: Body,

    /// The signal exposing a memo's value to its readers.
    pub(crate) memo_signal: Option<SignalId>,

    /// Who disposes this node. Set when it enters the graph.
    pub(crate) owner: Option<Owner>,

    /// Computations created during the last run.
    pub(crate) owned: Vec<ComputationId>,

    pub(crate) cleanups: Vec<Cleanup>,
}

impl ComputationNode {
    pub(crate) fn new(kind: NodeKind, body: Body, memo_signal: Option<SignalId>) -> Self {
        Self {
            stamp: next_stamp(),
            kind,
            state: NodeState::Stale,
            queued: false,
            running: false,
            sources: SmallVec::new(),
            body,
            memo_signal,
            owner: None,
            owned: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    /// Whether the node is stale.
    pub(crate) fn is_stale(&self) -> bool {
        self.state == NodeState::Stale
    }
}

/// An ownership root.
pub(crate) struct RootNode {
    pub(crate) stamp: u64,
    pub(crate) owned: Vec<ComputationId>,
    pub(crate) cleanups: Vec<Cleanup>,
}

impl RootNode {
    pub(crate) fn new() -> Self {
        Self {
            stamp: next_stamp(),
            owned: Vec::new(),
            cleanups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_body() -> Body {
        Rc::new(RefCell::new(|| Ok(false)))
    }

    #[test]
    fn stamps_are_unique() {
        let a = next_stamp();
        let b = next_stamp();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_compare_slot_and_stamp() {
        let a = ComputationId::new(3, 10);
        let b = ComputationId::new(3, 11);
        assert_ne!(a, b);
        assert_eq!(a.slot(), b.slot());
        assert_eq!(a, ComputationId::new(3, 10));
    }

    #[test]
    fn computation_starts_stale() {
        let node = ComputationNode::new(NodeKind::Memo, noop_body(), None);
        assert_eq!(node.kind, NodeKind::Memo);
        assert!(node.is_stale());
        assert!(!node.queued);
        assert!(node.sources.is_empty());
    }
}
