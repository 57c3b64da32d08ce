//! Update Queue
//!
//! The queue holds stale computations waiting for the next flush.
//!
//! # Ordering
//!
//! There are two FIFO lanes. Pure computations and memos go to the update
//! lane; effects go to the effect lane. [`UpdateQueue::pop`] always empties
//! the update lane first, so effects observe a settled graph.
//!
//! Within a lane, computations run in the order they were enqueued. When one
//! write stales several observers they are enqueued in subscription order.
//! This approximates topological order; memos cover the rest by recomputing
//! on read.
//!
//! Deduplication is the caller's job: a node carries a `queued` flag and is
//! only pushed while the flag is clear.

use std::collections::VecDeque;

use super::node::{ComputationId, NodeKind};

/// FIFO of stale computations, split into an update lane and an effect lane.
#[derive(Debug, Default)]
pub(crate) struct UpdateQueue {
    updates: VecDeque<ComputationId>,
    effects: VecDeque<ComputationId>,
}

impl UpdateQueue {
    /// Create an empty queue.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enqueue a computation in the lane matching its kind.
    pub(crate) fn push(&mut self, id: ComputationId, kind: NodeKind) {
        match kind {
            NodeKind::Effect => self.effects.push_back(id),
            NodeKind::Computed | NodeKind::Memo => self.updates.push_back(id),
        }
    }

    /// Take the next computation to run.
    pub(crate) fn pop(&mut self) -> Option<ComputationId> {
        self.updates
            .pop_front()
            .or_else(|| self.effects.pop_front())
    }

    /// Remove everything, returning what was queued.
    pub(crate) fn clear(&mut self) -> Vec<ComputationId> {
        self.updates.drain(..).chain(self.effects.drain(..)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.updates.len() + self.effects.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fifo_order() {
        let mut queue = UpdateQueue::new();
        let a = ComputationId::new(0, 1);
        let b = ComputationId::new(1, 2);

        queue.push(a, NodeKind::Computed);
        queue.push(b, NodeKind::Memo);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(a));
        assert_eq!(queue.pop(), Some(b));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn effects_run_after_updates() {
        let mut queue = UpdateQueue::new();
        let effect = ComputationId::new(0, 1);
        let computed = ComputationId::new(1, 2);

        queue.push(effect, NodeKind::Effect);
        queue.push(computed, NodeKind::Computed);

        assert_eq!(queue.pop(), Some(computed));
        assert_eq!(queue.pop(), Some(effect));
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_returns_everything() {
        let mut queue = UpdateQueue::new();
        queue.push(ComputationId::new(0, 1), NodeKind::Effect);
        queue.push(ComputationId::new(1, 2), NodeKind::Computed);

        assert_eq!(queue.clear().len(), 2);
        assert!(queue.is_empty());
    }
}
