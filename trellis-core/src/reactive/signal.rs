//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a running computation, the computation
//!    becomes one of its observers.
//!
//! 2. When a signal is written with a value that differs from the current one
//!    (per its [`Equality`]), every observer is marked stale.
//!
//! 3. Stale observers re-run before the write returns, or when the enclosing
//!    batch closes.
//!
//! # Memory Layout
//!
//! The value sits behind an `Rc` shared by all clones of the handle. The
//! graph only holds the signal's observer set, addressed by [`SignalId`].
//! Dropping the last handle removes the node from the graph.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::equality::Equality;
use super::runtime;
use crate::error::Result;
use crate::graph::SignalId;

struct SignalInner<T> {
    id: SignalId,
    value: RefCell<T>,
    equals: Equality<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        runtime::release_signal(self.id);
    }
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```
/// use trellis_core::Signal;
///
/// let count = Signal::new(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5).unwrap();
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal that drops writes equal to the current value.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(value, Equality::value())
    }

    /// Create a signal with a custom equality gate.
    pub fn with_equality(value: T, equals: Equality<T>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: runtime::create_signal_node(),
                value: RefCell::new(value),
                equals,
            }),
        }
    }

    /// The signal's graph handle.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Register a read without looking at the value.
    pub fn track(&self) {
        runtime::track(self.inner.id);
    }

    /// Get the current value, tracking the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.track();
        self.get_untracked()
    }

    /// Borrow the current value, tracking the read.
    ///
    /// Writing this signal from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Get the current value without tracking.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Store a new value and notify observers if it changed.
    ///
    /// Errors from computations re-run by this write are returned here.
    pub fn set(&self, value: T) -> Result<()> {
        if self.inner.equals.same(&self.inner.value.borrow(), &value) {
            return Ok(());
        }
        let previous = self.inner.value.replace(value);
        drop(previous);
        runtime::notify(self.inner.id)
    }

    /// Update the value using a function of the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    /// Number of computations currently observing this signal.
    pub fn observer_count(&self) -> usize {
        runtime::with_runtime(|rt| {
            rt.graph
                .signal(self.inner.id)
                .map_or(0, |node| node.observers.len())
        })
    }

    /// Whether both handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

/// Read half of a signal created by [`create_signal`].
pub struct ReadSignal<T: 'static>(Signal<T>);

impl<T: 'static> ReadSignal<T> {
    /// Get the current value, tracking the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.get()
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    /// Get the current value without tracking.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.0.get_untracked()
    }
}

impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Write half of a signal created by [`create_signal`].
pub struct WriteSignal<T: 'static>(Signal<T>);

impl<T: 'static> WriteSignal<T> {
    /// Store a new value and notify observers if it changed.
    pub fn set(&self, value: T) -> Result<()> {
        self.0.set(value)
    }

    /// Update the value using a function of the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        self.0.update(f)
    }
}

impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Create a signal and split it into a reader and a writer.
pub fn create_signal<T: PartialEq + 'static>(value: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let signal = Signal::new(value);
    (ReadSignal(signal.clone()), WriteSignal(signal))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
