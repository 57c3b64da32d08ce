//! Mutable Stores
//!
//! This module turns plain nested data into reactive data. A store is a
//! proxy ([`MutableObject`] or [`MutableArray`]) over a raw container. Each
//! key read through the proxy inside a computation gets its own signal, so a
//! write reruns only the computations that read that key.
//!
//! # Layout
//!
//! - `value`: the dynamic [`Value`] model and its strict equality.
//! - `raw`: plain [`Object`] and [`Array`] containers, untracked.
//! - `nodes`: the per-container key -> signal table, created lazily.
//! - `object`, `array`: the two proxy types.
//! - `wrap`: [`wrap`], [`unwrap`] and [`create_mutable`].
//!
//! Reads and writes through [`Object`] and [`Array`] bypass tracking. Use
//! them to build initial data or for deliberate untracked access.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use serde_json::json;
//! use trellis_core::{create_computed, create_root};
//! use trellis_core::store::create_mutable;
//!
//! create_root(|_| {
//!     let state = create_mutable(json!({"todos": []})).unwrap().into_object().unwrap();
//!     let lengths = Rc::new(RefCell::new(Vec::new()));
//!
//!     let (state_c, lengths_c) = (state.clone(), lengths.clone());
//!     create_computed(move || {
//!         let todos = state_c.get("todos")?;
//!         let len = todos.as_mutable_array().map_or(0, |todos| todos.len());
//!         lengths_c.borrow_mut().push(len);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//!     let todos = state.get("todos").unwrap();
//!     todos.as_mutable_array().unwrap().push("write docs").unwrap();
//!     assert_eq!(*lengths.borrow(), vec![0, 1]);
//! });
//! ```

mod array;
mod nodes;
mod object;
mod raw;
mod value;
mod wrap;

pub use array::MutableArray;
pub use object::{MutableObject, RAW_KEY};
pub use raw::{Accessor, Array, Getter, Object, Property, Setter, MAX_ARRAY_LEN};
pub use value::{Function, Value};
pub use wrap::{create_mutable, is_wrappable, unwrap, wrap, Mutable};
