//! Reactive arrays.
//!
//! [`MutableArray`] tracks each index and the length as separate keys.
//! Mutators edit the raw [`Array`] in place and then, inside one batch, push
//! the new contents to every tracked key. Keys whose value did not change
//! are filtered by their signal's equality gate, so a `push` reruns readers
//! of `len()` and of the new index but not readers of untouched indices.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::nodes::Nodes;
use super::raw::{len_for_index, Array};
use super::value::Value;
use super::wrap::{to_raw, wrap};
use crate::error::Result;
use crate::reactive::batch;

/// A tracked position in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ArrayKey {
    Index(usize),
    Length,
}

/// A reactive view over a plain [`Array`].
#[derive(Clone)]
pub struct MutableArray {
    target: Array,
    nodes: Rc<Nodes<ArrayKey>>,
}

impl MutableArray {
    pub(crate) fn new(target: Array) -> Self {
        let nodes = target.nodes();
        Self { target, nodes }
    }

    /// The raw target. Reading it is not tracked.
    pub fn raw(&self) -> &Array {
        &self.target
    }

    /// Read the item at `index`; `Undefined` past the end. Tracked.
    pub fn get(&self, index: usize) -> Value {
        let key = ArrayKey::Index(index);
        self.nodes.track(&key, || self.current(key));
        wrap(self.current(key))
    }

    /// Tracked length.
    pub fn len(&self) -> usize {
        self.nodes.track(&ArrayKey::Length, || self.current(ArrayKey::Length));
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items, wrapped. Tracks the length and every index.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    /// Store `value` at `index`, growing the array with `Undefined` if
    /// needed. Fails with [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange) past
    /// [`MAX_ARRAY_LEN`](super::raw::MAX_ARRAY_LEN).
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let len = len_for_index(index)?;
        let value = to_raw(&value.into());
        if self.target.get(index).as_ref() == Some(&value) {
            return Ok(());
        }
        self.mutate(|items| {
            if len > items.len() {
                items.resize(len, Value::Undefined);
            }
            items[index] = value;
        })
    }

    /// Grow with `Undefined` or cut down to `len` items.
    pub fn set_len(&self, len: usize) -> Result<()> {
        if len > 0 {
            len_for_index(len - 1)?;
        }
        self.mutate(|items| items.resize(len, Value::Undefined))
    }

    /// Append an item, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let value = to_raw(&value.into());
        self.mutate(|items| {
            items.push(value);
            items.len()
        })
    }

    /// Remove the last item; `Undefined` when empty.
    pub fn pop(&self) -> Result<Value> {
        self.mutate(|items| items.pop().unwrap_or_default())
    }

    /// Remove the first item; `Undefined` when empty.
    pub fn shift(&self) -> Result<Value> {
        self.mutate(|items| {
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        })
    }

    /// Prepend an item, returning the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> Result<usize> {
        let value = to_raw(&value.into());
        self.mutate(|items| {
            items.insert(0, value);
            items.len()
        })
    }

    /// Insert before `index`, clamped to the length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = to_raw(&value.into());
        self.mutate(|items| {
            let index = index.min(items.len());
            items.insert(index, value);
        })
    }

    /// Remove the item at `index`; `Undefined` when out of bounds.
    pub fn remove(&self, index: usize) -> Result<Value> {
        self.mutate(|items| {
            if index < items.len() {
                items.remove(index)
            } else {
                Value::Undefined
            }
        })
    }

    /// Remove `delete_count` items starting at `start` and insert `items` in
    /// their place. Both bounds are clamped. Returns the removed items.
    pub fn splice<I>(&self, start: usize, delete_count: usize, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inserted: Vec<Value> = items.into_iter().map(|item| to_raw(&item.into())).collect();
        self.mutate(|current| {
            let start = start.min(current.len());
            let end = start.saturating_add(delete_count).min(current.len());
            current.splice(start..end, inserted).collect()
        })
    }

    pub fn reverse(&self) -> Result<()> {
        self.mutate(|items| items.reverse())
    }

    /// Stable sort of the raw items. The sort runs on a snapshot, so
    /// `compare` may read this array.
    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) -> Result<()> {
        self.target.check_frozen()?;
        let mut sorted = self.target.to_vec();
        sorted.sort_by(compare);
        self.mutate(|items| *items = sorted)
    }

    pub fn truncate(&self, len: usize) -> Result<()> {
        self.mutate(|items| items.truncate(len))
    }

    pub fn clear(&self) -> Result<()> {
        self.mutate(Vec::clear)
    }

    /// Whether both proxies wrap the same target.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.target.ptr_eq(&other.target)
    }

    /// Apply `f` to the raw items, then bring every tracked key up to date
    /// inside one batch.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> Result<R> {
        self.target.check_frozen()?;
        let (out, old_len) = {
            let mut items = self.target.0.items.borrow_mut();
            let old_len = items.len();
            (f(&mut items), old_len)
        };

        batch(|| {
            for (key, signal) in self.nodes.tracked() {
                signal.set(self.current(key))?;
            }
            if self.target.len() != old_len {
                self.nodes.notify_keys()?;
            }
            Ok(())
        })?;
        Ok(out)
    }

    fn current(&self, key: ArrayKey) -> Value {
        match key {
            ArrayKey::Index(index) => self.target.get(index).unwrap_or_default(),
            ArrayKey::Length => Value::from(self.target.len()),
        }
    }
}

impl PartialEq for MutableArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MutableArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableArray").field(&self.target).finish()
    }
}
