//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! computations. It owns the dependency graph and the update queue and
//! decides when queued computations run.
//!
//! # How It Works
//!
//! 1. Reading a signal inside a running computation records the edge in both
//!    directions: the signal gains an observer, the run gains a source.
//!
//! 2. Writing a signal marks each observer stale and enqueues it, in
//!    subscription order. A node already in the queue is not enqueued twice.
//!
//! 3. When the outermost batch closes (every write opens an implicit one),
//!    the queue is flushed: pure computations and memos first, effects after.
//!    Writes made while flushing only enqueue; the running flush picks them up.
//!
//! 4. Memos are pulled. A stale memo recomputes when read, and only notifies
//!    its own observers when its value actually changed. A queued memo that
//!    nobody observes is left stale for the next read.
//!
//! 5. After a run, signals the computation no longer read drop it. After a
//!    failed run, old and new edges are both kept and the node stays stale,
//!    so the next relevant write retries it.
//!
//! # Thread Model
//!
//! Everything is thread-local and single-threaded. No user code ever runs
//! while the runtime is borrowed: bodies, cleanups and disposed closures are
//! taken out of the arena first.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::context::ReactiveContext;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::graph::{
    Body, Cleanup, ComputationId, ComputationNode, Graph, NodeKind, NodeState, Owner, RootId,
    SignalId, UpdateQueue,
};

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// Thread-local runtime state.
pub(crate) struct Runtime {
    pub(crate) graph: Graph,
    pub(crate) queue: UpdateQueue,
    pub(crate) batch_depth: u32,
    pub(crate) flushing: bool,
    pub(crate) config: RuntimeConfig,
}

/// Everything `run_computation` needs, taken out of the arena.
struct Prepared {
    body: Body,
    kind: NodeKind,
    memo_signal: Option<SignalId>,
    owned: Vec<ComputationId>,
    cleanups: Vec<Cleanup>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            queue: UpdateQueue::new(),
            batch_depth: 0,
            flushing: false,
            config: RuntimeConfig::default(),
        }
    }

    /// Mark every observer of `signal` stale.
    fn mark_observers(&mut self, signal: SignalId) {
        let observers = self.graph.observers(signal);
        let count = observers.len();
        for observer in observers {
            self.mark_stale(observer, Some(signal));
        }
        trace!(?signal, observers = count, queued = self.queue.len(), "signal changed");
    }

    /// Mark a computation stale and enqueue it.
    ///
    /// A running computation is only re-queued when `cause` is a signal it
    /// already read during this run; otherwise it will see the new value
    /// when it gets there.
    fn mark_stale(&mut self, id: ComputationId, cause: Option<SignalId>) {
        let Some(node) = self.graph.computation_mut(id) else {
            return;
        };
        if node.running && !cause.is_some_and(|signal| ReactiveContext::has_read(id, signal)) {
            return;
        }
        node.state = NodeState::Stale;
        if !node.queued {
            node.queued = true;
            let kind = node.kind;
            self.queue.push(id, kind);
        }
    }

    /// Pop the next computation that still needs to run.
    fn next_runnable(&mut self) -> Option<ComputationId> {
        while let Some(id) = self.queue.pop() {
            let Some(node) = self.graph.computation_mut(id) else {
                continue;
            };
            node.queued = false;
            if !node.is_stale() {
                continue;
            }
            if node.kind == NodeKind::Memo && !self.graph.memo_has_observers(id) {
                continue;
            }
            return Some(id);
        }
        None
    }

    /// Drop everything queued, returning how many entries were discarded.
    fn clear_queue(&mut self) -> usize {
        let dropped = self.queue.clear();
        for id in &dropped {
            if let Some(node) = self.graph.computation_mut(*id) {
                node.queued = false;
            }
        }
        dropped.len()
    }

    fn begin_run(&mut self, id: ComputationId) -> Option<Prepared> {
        let node = self.graph.computation_mut(id)?;
        if node.running {
            return None;
        }
        node.running = true;
        node.state = NodeState::Clean;
        Some(Prepared {
            body: Rc::clone(&node.body),
            kind: node.kind,
            memo_signal: node.memo_signal,
            owned: std::mem::take(&mut node.owned),
            cleanups: std::mem::take(&mut node.cleanups),
        })
    }

    fn finish_run(&mut self, id: ComputationId, sources: SmallVec<[SignalId; 4]>, ok: bool) {
        let Some(node) = self.graph.computation_mut(id) else {
            return;
        };
        node.running = false;
        if ok {
            self.graph.replace_sources(id, sources);
        } else {
            node.state = NodeState::Stale;
            self.graph.merge_sources(id, sources);
        }
    }
}

/// Run `f` with mutable access to this thread's runtime.
///
/// `f` must not call back into user code.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> R {
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

/// Like [`with_runtime`], but does nothing during thread teardown or while
/// the runtime is already borrowed. For use from `Drop` impls.
fn try_with_runtime(f: impl FnOnce(&mut Runtime)) {
    let _ = RUNTIME.try_with(|rt| match rt.try_borrow_mut() {
        Ok(mut rt) => f(&mut rt),
        Err(_) => debug!("runtime busy; skipping teardown bookkeeping"),
    });
}

// ----------------------------------------------------------------------------
// Signals
// ----------------------------------------------------------------------------

/// Register a new signal node.
pub(crate) fn create_signal_node() -> SignalId {
    with_runtime(|rt| rt.graph.insert_signal())
}

/// Release a signal node and unlink its observers.
pub(crate) fn release_signal(id: SignalId) {
    try_with_runtime(|rt| rt.graph.remove_signal(id));
}

/// Record a read of `signal` by the running computation, if any.
pub(crate) fn track(signal: SignalId) {
    if let Some(subscriber) = ReactiveContext::track_dependency(signal) {
        with_runtime(|rt| rt.graph.add_edge(signal, subscriber));
    }
}

/// Propagate a change of `signal` to its observers.
///
/// Runs the affected computations before returning unless a batch is open
/// or a flush is already in progress.
pub(crate) fn notify(signal: SignalId) -> Result<()> {
    with_runtime(|rt| {
        rt.batch_depth += 1;
        rt.mark_observers(signal);
    });
    end_batch()
}

// ----------------------------------------------------------------------------
// Batching and flushing
// ----------------------------------------------------------------------------

pub(crate) fn begin_batch() {
    with_runtime(|rt| rt.batch_depth += 1);
}

/// Close a batch, flushing when it was the outermost one.
pub(crate) fn end_batch() -> Result<()> {
    let should_flush = with_runtime(|rt| {
        rt.batch_depth = rt.batch_depth.saturating_sub(1);
        rt.batch_depth == 0 && !rt.flushing && !rt.queue.is_empty()
    });
    if should_flush {
        flush()
    } else {
        Ok(())
    }
}

/// Close a batch that is being unwound by a panic. Does not flush.
pub(crate) fn abandon_batch() {
    try_with_runtime(|rt| rt.batch_depth = rt.batch_depth.saturating_sub(1));
}

pub(crate) fn is_batching() -> bool {
    with_runtime(|rt| rt.batch_depth > 0 || rt.flushing)
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        try_with_runtime(|rt| rt.flushing = false);
    }
}

/// Run queued computations until the queue is empty.
fn flush() -> Result<()> {
    let limit = with_runtime(|rt| {
        rt.flushing = true;
        rt.config.max_updates_per_flush
    });
    let _guard = FlushGuard;

    let mut ran = 0usize;
    while let Some(id) = with_runtime(|rt| rt.next_runnable()) {
        ran += 1;
        if ran > limit {
            let dropped = with_runtime(|rt| rt.clear_queue());
            warn!(limit, dropped, "flush exceeded its update limit; aborting");
            return Err(Error::RunawayUpdates { limit });
        }
        if let Err(err) = run_computation(id) {
            let dropped = with_runtime(|rt| rt.clear_queue());
            debug!(computation = ?id, %err, dropped, "flush aborted by a failing computation");
            return Err(err);
        }
    }

    if ran > 0 {
        debug!(ran, "flush complete");
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Computations
// ----------------------------------------------------------------------------

/// Register a computation owned by the current owner.
pub(crate) fn create_computation(kind: NodeKind, body: Body) -> ComputationId {
    insert_computation(kind, body, None)
}

/// Register a memo along with the signal that exposes its value.
pub(crate) fn create_memo_node(body: Body) -> (ComputationId, SignalId) {
    let signal = create_signal_node();
    (insert_computation(NodeKind::Memo, body, Some(signal)), signal)
}

fn insert_computation(kind: NodeKind, body: Body, memo_signal: Option<SignalId>) -> ComputationId {
    let owner = ReactiveContext::current_owner();
    with_runtime(|rt| {
        if owner.is_none() && rt.config.warn_unowned {
            warn!(?kind, "computation created outside a root will never be disposed");
        }
        let node = ComputationNode::new(kind, body, memo_signal);
        rt.graph.insert_computation(node, owner)
    })
}

/// Enqueue a computation for the next flush.
pub(crate) fn schedule(id: ComputationId) {
    with_runtime(|rt| rt.mark_stale(id, None));
}

pub(crate) fn computation_state(id: ComputationId) -> Option<NodeState> {
    with_runtime(|rt| rt.graph.computation(id).map(|node| node.state))
}

/// Leaves the node stale if its body unwinds.
struct RunGuard {
    id: ComputationId,
    finished: bool,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let id = self.id;
        try_with_runtime(|rt| {
            if let Some(node) = rt.graph.computation_mut(id) {
                node.running = false;
                node.state = NodeState::Stale;
            }
        });
    }
}

/// Execute a computation's body with dependency tracking.
pub(crate) fn run_computation(id: ComputationId) -> Result<()> {
    let Some(prepared) = with_runtime(|rt| rt.begin_run(id)) else {
        return Ok(());
    };
    let Prepared {
        body,
        kind,
        memo_signal,
        owned,
        cleanups,
    } = prepared;

    let mut guard = RunGuard {
        id,
        finished: false,
    };
    dispose_all(owned);
    run_cleanups(cleanups);

    let ctx = ReactiveContext::enter(id);
    let result = match body.try_borrow_mut() {
        Ok(mut body) => (&mut *body)(),
        Err(_) => Err(Error::Cycle),
    };
    let sources = ctx.take_dependencies();
    drop(ctx);
    guard.finished = true;

    with_runtime(|rt| rt.finish_run(id, sources, result.is_ok()));

    match result {
        Ok(changed) => {
            trace!(computation = ?id, ?kind, changed, "computation ran");
            match memo_signal {
                Some(signal) if changed => notify(signal),
                _ => Ok(()),
            }
        }
        Err(err) => {
            debug!(computation = ?id, ?kind, %err, "computation failed; left stale");
            Err(err)
        }
    }
}

/// Bring a memo up to date if it is stale.
pub(crate) fn refresh(id: ComputationId) -> Result<()> {
    let status = with_runtime(|rt| {
        rt.graph
            .computation(id)
            .map(|node| (node.running, node.is_stale()))
    });
    match status {
        Some((true, _)) => Err(Error::Cycle),
        Some((false, true)) => run_computation(id),
        Some((false, false)) | None => Ok(()),
    }
}

// ----------------------------------------------------------------------------
// Ownership
// ----------------------------------------------------------------------------

pub(crate) fn create_root_node() -> RootId {
    with_runtime(|rt| rt.graph.insert_root())
}

pub(crate) fn root_exists(id: RootId) -> bool {
    with_runtime(|rt| rt.graph.contains_root(id))
}

/// Dispose a root: its computations stop observing everything and never run
/// again, then its cleanups run.
pub(crate) fn dispose_root(id: RootId) {
    let Some(root) = with_runtime(|rt| rt.graph.remove_root(id)) else {
        return;
    };
    debug!(root = ?id, computations = root.owned.len(), "root disposed");
    dispose_all(root.owned);
    run_cleanups(root.cleanups);
}

/// Dispose a single computation along with everything it owns.
pub(crate) fn dispose_computation(id: ComputationId) {
    let Some(node) = with_runtime(|rt| rt.graph.remove_computation(id)) else {
        return;
    };
    trace!(computation = ?id, kind = ?node.kind, "computation disposed");
    dispose_all(node.owned);
    run_cleanups(node.cleanups);
    drop(node.body);
}

fn dispose_all(ids: Vec<ComputationId>) {
    for id in ids {
        dispose_computation(id);
    }
}

/// Run cleanups newest first, without tracking.
fn run_cleanups(cleanups: Vec<Cleanup>) {
    if cleanups.is_empty() {
        return;
    }
    let _untracked = ReactiveContext::untracked();
    for cleanup in cleanups.into_iter().rev() {
        cleanup();
    }
}

/// Attach a cleanup to the current owner.
pub(crate) fn register_cleanup(cleanup: Cleanup) {
    let owner = ReactiveContext::current_owner();
    let orphan = with_runtime(|rt| {
        let cleanups = match owner {
            Some(Owner::Root(root)) => rt.graph.root_mut(root).map(|node| &mut node.cleanups),
            Some(Owner::Computation(c)) => rt.graph.computation_mut(c).map(|node| &mut node.cleanups),
            None => None,
        };
        match cleanups {
            Some(cleanups) => {
                cleanups.push(cleanup);
                None
            }
            None => {
                if rt.config.warn_unowned {
                    warn!("cleanup registered outside an owner will never run");
                }
                Some(cleanup)
            }
        }
    });
    drop(orphan);
}

/// Number of live signal and computation nodes on this thread.
pub(crate) fn node_counts() -> (usize, usize) {
    with_runtime(|rt| (rt.graph.signal_count(), rt.graph.computation_count()))
}

/// How many live computations a root still owns.
#[cfg(test)]
pub(crate) fn root_owned_count(id: RootId) -> Option<usize> {
    with_runtime(|rt| rt.graph.root_mut(id).map(|root| root.owned.len()))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
