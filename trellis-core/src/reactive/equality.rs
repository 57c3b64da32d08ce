//! Equality gates for signals and memos.

use std::fmt;
use std::rc::Rc;

/// Decides whether a write actually changed a value.
///
/// A write that compares equal to the current value is dropped without
/// notifying anyone.
pub enum Equality<T: ?Sized> {
    /// Every write notifies.
    Never,
    /// Writes are compared with the given function.
    By(Rc<dyn Fn(&T, &T) -> bool>),
}

impl<T: ?Sized> Equality<T> {
    /// Compare with a custom function, e.g. `Rc::ptr_eq` for reference
    /// equality.
    pub fn by(f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::By(Rc::new(f))
    }

    /// Whether `current` and `next` count as the same value.
    pub fn same(&self, current: &T, next: &T) -> bool {
        match self {
            Self::Never => false,
            Self::By(f) => f(current, next),
        }
    }
}

impl<T: PartialEq + ?Sized + 'static> Equality<T> {
    /// Compare with `PartialEq`.
    pub fn value() -> Self {
        Self::by(|a: &T, b: &T| a == b)
    }
}

impl<T: PartialEq + ?Sized + 'static> Default for Equality<T> {
    fn default() -> Self {
        Self::value()
    }
}

impl<T: ?Sized> Clone for Equality<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Never => Self::Never,
            Self::By(f) => Self::By(Rc::clone(f)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Equality::Never"),
            Self::By(_) => f.write_str("Equality::By(..)"),
        }
    }
}
