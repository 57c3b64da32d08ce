//! Trellis Core
//!
//! A fine-grained reactive state engine. Programs mutate nested objects and
//! arrays, and only the computations that read the changed parts re-run.
//! It implements:
//!
//! - Reactive primitives (signals, memos, computations, effects)
//! - Batching with a single deduplicated flush per outermost batch
//! - Ownership roots with disposal and cleanups
//! - Mutable stores: per-key reactive proxies over plain data
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: arena-backed dependency graph and the update queue
//! - `reactive`: tracking context, runtime, and the user-facing primitives
//! - `store`: the value model, object/array proxies and wrap/unwrap
//! - `config`: per-thread runtime tunables
//!
//! Everything is single-threaded. Each thread has its own runtime; handles
//! are `!Send`.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use trellis_core::{create_computed, create_memo, create_root, Signal};
//!
//! create_root(|root| {
//!     let count = Signal::new(1);
//!
//!     let count_c = count.clone();
//!     let doubled = create_memo(move || Ok(count_c.get() * 2));
//!
//!     let log = Rc::new(RefCell::new(Vec::new()));
//!     let (count_c, log_c) = (count.clone(), log.clone());
//!     create_computed(move || {
//!         log_c.borrow_mut().push((count_c.get(), doubled.get()?));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//!     count.set(5).unwrap();
//!     assert_eq!(*log.borrow(), vec![(1, 2), (5, 10)]);
//!
//!     root.dispose();
//! });
//! ```

pub mod config;
mod error;
mod graph;
pub mod reactive;
pub mod store;

pub use config::{configure, RuntimeConfig};
pub use error::{Error, Result};
pub use graph::{ComputationId, NodeKind, NodeState, Owner, RootId, SignalId};
pub use reactive::{
    batch, create_computed, create_effect, create_memo, create_memo_with, create_root,
    create_signal, is_batching, on_cleanup, untrack, Computation, Equality, Memo, MemoState,
    ReadSignal, Root, Signal, WriteSignal,
};
pub use store::{create_mutable, unwrap, wrap, Mutable, Value, RAW_KEY};
