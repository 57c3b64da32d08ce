//! Per-target signal storage.
//!
//! Every wrapped container carries one [`Nodes`] table, created the first
//! time it is wrapped and dropped with the container. A key gets a signal
//! only when a computation reads it, so untracked reads cost nothing. The
//! signal mirrors the raw value so writes of an identical value are
//! filtered by the signal's equality gate.

use std::cell::RefCell;
use std::hash::Hash;

use indexmap::IndexMap;

use super::value::Value;
use crate::error::Result;
use crate::reactive::{Equality, ReactiveContext, Signal};

pub(crate) struct Nodes<K> {
    /// Tracked keys in the order they were first read.
    nodes: RefCell<IndexMap<K, Signal<Value>>>,
    /// Notified whenever a key is added or removed.
    keys: Signal<()>,
}

impl<K: Hash + Eq + Clone> Nodes<K> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: RefCell::new(IndexMap::new()),
            keys: Signal::with_equality((), Equality::Never),
        }
    }

    /// Track `key` for the running computation, creating its signal from
    /// `current` on first use. Does nothing when no computation is running.
    pub(crate) fn track(&self, key: &K, current: impl FnOnce() -> Value) {
        if !ReactiveContext::is_active() {
            return;
        }
        let signal = self
            .nodes
            .borrow_mut()
            .entry(key.clone())
            .or_insert_with(|| Signal::new(current()))
            .clone();
        signal.track();
    }

    /// Push a new value to `key`'s signal, if anyone ever tracked it.
    pub(crate) fn write(&self, key: &K, value: Value) -> Result<()> {
        let signal = self.nodes.borrow().get(key).cloned();
        match signal {
            Some(signal) => signal.set(value),
            None => Ok(()),
        }
    }

    pub(crate) fn track_keys(&self) {
        if ReactiveContext::is_active() {
            self.keys.track();
        }
    }

    pub(crate) fn notify_keys(&self) -> Result<()> {
        self.keys.set(())
    }

    /// Every tracked key with its signal, in first-read order.
    pub(crate) fn tracked(&self) -> Vec<(K, Signal<Value>)> {
        self.nodes
            .borrow()
            .iter()
            .map(|(key, signal)| (key.clone(), signal.clone()))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.borrow().len()
    }
}
