//! Dependency Graph
//!
//! This module implements the dependency graph that links signals to the
//! computations reading them.
//!
//! # Overview
//!
//! - Signal nodes are the leaves. They carry no value here, only observers.
//! - Computation nodes (computeds, memos, effects) carry their sources, their
//!   body, and whatever they own.
//! - Root nodes own computations and bound their lifetime.
//!
//! # Design Decisions
//!
//! 1. Signals and computations reference each other in both directions, so
//!    every node lives in a slab arena and edges are stored as handles. Tearing
//!    down a node removes handles; no reference cycles need breaking.
//!
//! 2. Observer sets are insertion ordered. Re-execution after a write follows
//!    subscription order.
//!
//! 3. The graph never runs user code. The runtime takes what it needs out of
//!    the arena, releases it, and only then calls into bodies and cleanups.

mod arena;
mod node;
mod scheduler;

pub(crate) use arena::Graph;
pub(crate) use node::{Body, Cleanup, ComputationNode};
pub use node::{ComputationId, NodeKind, NodeState, Owner, RootId, SignalId};
pub(crate) use scheduler::UpdateQueue;
