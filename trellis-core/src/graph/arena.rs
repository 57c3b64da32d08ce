//! Node Arenas
//!
//! [`Graph`] owns every signal, computation and root node and maintains the
//! edges between them. Edges are stored on both ends: a signal keeps its
//! observers, a computation keeps its sources. Removing a node unlinks it
//! from the other end so no dangling handle survives in either set.

use slab::Slab;
use smallvec::SmallVec;

use super::node::{
    next_stamp, ComputationId, ComputationNode, Owner, RootId, RootNode, SignalId, SignalNode,
};

/// Arena storage for the dependency graph.
#[derive(Default)]
pub(crate) struct Graph {
    signals: Slab<SignalNode>,
    computations: Slab<ComputationNode>,
    roots: Slab<RootNode>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    pub(crate) fn insert_signal(&mut self) -> SignalId {
        let stamp = next_stamp();
        let slot = self.signals.insert(SignalNode {
            stamp,
            observers: Default::default(),
        });
        SignalId::new(slot, stamp)
    }

    pub(crate) fn signal(&self, id: SignalId) -> Option<&SignalNode> {
        self.signals
            .get(id.slot())
            .filter(|node| node.stamp == id.stamp())
    }

    fn signal_mut(&mut self, id: SignalId) -> Option<&mut SignalNode> {
        self.signals
            .get_mut(id.slot())
            .filter(|node| node.stamp == id.stamp())
    }

    /// Remove a signal and drop it from its observers' source lists.
    pub(crate) fn remove_signal(&mut self, id: SignalId) {
        if self.signal(id).is_none() {
            return;
        }
        let node = self.signals.remove(id.slot());
        for observer in node.observers {
            if let Some(computation) = self.computation_mut(observer) {
                computation.sources.retain(|source| *source != id);
            }
        }
    }

    /// Observers of a signal in subscription order.
    pub(crate) fn observers(&self, id: SignalId) -> Vec<ComputationId> {
        self.signal(id)
            .map(|node| node.observers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn signal_count(&self) -> usize {
        self.signals.len()
    }

    // ------------------------------------------------------------------
    // Computations
    // ------------------------------------------------------------------

    /// Insert a computation and register it with its owner.
    pub(crate) fn insert_computation(
        &mut self,
        mut node: ComputationNode,
        owner: Option<Owner>,
    ) -> ComputationId {
        node.owner = owner;
        let stamp = node.stamp;
        let slot = self.computations.insert(node);
        let id = ComputationId::new(slot, stamp);

        match owner {
            Some(Owner::Root(root)) => {
                if let Some(root) = self.root_mut(root) {
                    root.owned.push(id);
                }
            }
            Some(Owner::Computation(parent)) => {
                if let Some(parent) = self.computation_mut(parent) {
                    parent.owned.push(id);
                }
            }
            None => {}
        }

        id
    }

    pub(crate) fn computation(&self, id: ComputationId) -> Option<&ComputationNode> {
        self.computations
            .get(id.slot())
            .filter(|node| node.stamp == id.stamp())
    }

    pub(crate) fn computation_mut(&mut self, id: ComputationId) -> Option<&mut ComputationNode> {
        self.computations
            .get_mut(id.slot())
            .filter(|node| node.stamp == id.stamp())
    }

    /// Remove a computation, unlinking it from every source and from its
    /// owner. A memo's own signal goes with it.
    pub(crate) fn remove_computation(&mut self, id: ComputationId) -> Option<ComputationNode> {
        self.computation(id)?;
        let node = self.computations.remove(id.slot());
        match node.owner {
            Some(Owner::Root(root)) => {
                if let Some(root) = self.root_mut(root) {
                    root.owned.retain(|owned| *owned != id);
                }
            }
            Some(Owner::Computation(parent)) => {
                if let Some(parent) = self.computation_mut(parent) {
                    parent.owned.retain(|owned| *owned != id);
                }
            }
            None => {}
        }
        for source in &node.sources {
            if let Some(signal) = self.signal_mut(*source) {
                signal.observers.shift_remove(&id);
            }
        }
        if let Some(memo_signal) = node.memo_signal {
            self.remove_signal(memo_signal);
        }
        Some(node)
    }

    /// Whether anything currently reads the memo's value.
    pub(crate) fn memo_has_observers(&self, id: ComputationId) -> bool {
        self.computation(id)
            .and_then(|node| node.memo_signal)
            .and_then(|signal| self.signal(signal))
            .is_some_and(|signal| !signal.observers.is_empty())
    }

    pub(crate) fn computation_count(&self) -> usize {
        self.computations.len()
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Subscribe `computation` to `signal`. Existing subscriptions keep their
    /// position in the observer order.
    pub(crate) fn add_edge(&mut self, signal: SignalId, computation: ComputationId) {
        if self.computation(computation).is_none() {
            return;
        }
        if let Some(node) = self.signal_mut(signal) {
            node.observers.insert(computation);
        }
    }

    /// Install the sources read by a completed run, unsubscribing from every
    /// previous source that was not read again.
    pub(crate) fn replace_sources(&mut self, id: ComputationId, sources: SmallVec<[SignalId; 4]>) {
        let Some(node) = self.computation_mut(id) else {
            return;
        };
        let previous = std::mem::replace(&mut node.sources, sources.clone());
        for stale in previous.into_iter().filter(|s| !sources.contains(s)) {
            if let Some(signal) = self.signal_mut(stale) {
                signal.observers.shift_remove(&id);
            }
        }
    }

    /// Keep previous sources and add the new ones. Used after a failed run so
    /// that any relevant write retries the computation.
    pub(crate) fn merge_sources(&mut self, id: ComputationId, sources: SmallVec<[SignalId; 4]>) {
        let Some(node) = self.computation_mut(id) else {
            return;
        };
        for source in sources {
            if !node.sources.contains(&source) {
                node.sources.push(source);
            }
        }
    }

    // ------------------------------------------------------------------
    // Roots
    // ------------------------------------------------------------------

    pub(crate) fn insert_root(&mut self) -> RootId {
        let node = RootNode::new();
        let stamp = node.stamp;
        let slot = self.roots.insert(node);
        RootId::new(slot, stamp)
    }

    pub(crate) fn root_mut(&mut self, id: RootId) -> Option<&mut RootNode> {
        self.roots
            .get_mut(id.slot())
            .filter(|node| node.stamp == id.stamp())
    }

    pub(crate) fn remove_root(&mut self, id: RootId) -> Option<RootNode> {
        self.root_mut(id)?;
        Some(self.roots.remove(id.slot()))
    }

    pub(crate) fn contains_root(&self, id: RootId) -> bool {
        self.roots
            .get(id.slot())
            .is_some_and(|node| node.stamp == id.stamp())
    }
}
