//! Reactive Primitives
//!
//! This module implements the graph-facing half of the engine: signals,
//! computations, memos, effects, batches and ownership roots.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while a computation runs, the signal registers that computation as an
//! observer. When the value changes, every observer is re-run.
//!
//! ## Computations and Effects
//!
//! A computation is a closure that re-runs whenever a signal it read last
//! time changes. Effects are computations that run after everything else in
//! the same flush has settled.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates lazily,
//! on the first read after one of its dependencies changed, and only notifies
//! its own readers when the result differs.
//!
//! ## Batches and Roots
//!
//! [`batch`] defers re-execution until the outermost batch closes, so
//! dependents run once and see every write. [`create_root`] opens an
//! ownership scope whose disposal stops all computations created in it.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies. When a signal is read, we check for an active tracking
//! context and, if there is one, register the dependency.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod batch;
mod computation;
mod context;
mod equality;
mod memo;
mod root;
pub(crate) mod runtime;
mod signal;

pub use batch::{batch, is_batching, untrack};
pub use computation::{create_computed, create_effect, Computation};
pub use context::ReactiveContext;
pub use equality::Equality;
pub use memo::{create_memo, create_memo_with, Memo, MemoState};
pub use root::{create_root, on_cleanup, Root};
pub use signal::{create_signal, ReadSignal, Signal, WriteSignal};
