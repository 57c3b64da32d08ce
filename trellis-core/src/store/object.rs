//! Reactive objects.
//!
//! [`MutableObject`] is the keyed proxy. Reads through it are tracked per
//! key, writes go to the raw [`Object`] and then to the key's signal, and
//! adding or removing a key also notifies anything that enumerated the keys.

use std::fmt;
use std::rc::Rc;

use super::nodes::Nodes;
use super::raw::{Object, Property};
use super::value::Value;
use super::wrap::{to_raw, wrap};
use crate::error::{Error, Result};
use crate::reactive::batch;

/// Reserved key that reads the raw target through a proxy, untracked.
///
/// It cannot be written or deleted and is never listed among the keys.
pub const RAW_KEY: &str = "$raw";

/// A reactive view over a plain [`Object`].
///
/// Wrapping the same object twice yields proxies that compare equal and
/// share their signals.
#[derive(Clone)]
pub struct MutableObject {
    target: Object,
    nodes: Rc<Nodes<Rc<str>>>,
}

impl MutableObject {
    pub(crate) fn new(target: Object) -> Self {
        let nodes = target.nodes();
        Self { target, nodes }
    }

    /// The raw target. Reading it is not tracked.
    pub fn raw(&self) -> &Object {
        &self.target
    }

    /// Read a property.
    ///
    /// Getters run with this proxy as `this`. Data properties are tracked
    /// and nested plain containers come back wrapped. Missing keys read as
    /// `Undefined` and are tracked too, so a later write reruns the reader.
    pub fn get(&self, key: &str) -> Result<Value> {
        if key == RAW_KEY {
            return Ok(Value::Object(self.target.clone()));
        }
        if let Some(Property::Accessor(accessor)) = self.target.property(key) {
            return match accessor.get {
                Some(getter) => getter(self),
                None => Ok(Value::Undefined),
            };
        }
        self.nodes.track(&Rc::from(key), || self.raw_value(key));
        Ok(wrap(self.raw_value(key)))
    }

    /// Write a property.
    ///
    /// Setters run inside a batch with this proxy as `this`. Writing
    /// `Undefined` deletes the key.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        if key == RAW_KEY {
            return Err(Error::ReservedKey {
                key: key.to_string(),
            });
        }
        let value = value.into();
        if let Some(Property::Accessor(accessor)) = self.target.property(key) {
            return match accessor.set {
                Some(setter) => batch(|| setter(self, value)),
                None => Err(Error::ReadOnlyProperty {
                    key: key.to_string(),
                }),
            };
        }

        let value = to_raw(&value);
        if value.is_undefined() {
            return self.delete(key).map(|_| ());
        }

        let previous = self.target.get(key);
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }
        let added = !self.target.contains_key(key);
        self.target.insert(key, value.clone())?;

        let key: Rc<str> = Rc::from(key);
        batch(|| {
            self.nodes.write(&key, value)?;
            if added {
                self.nodes.notify_keys()?;
            }
            Ok(())
        })
    }

    /// Remove a property. Returns whether it existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        if key == RAW_KEY {
            return Err(Error::ReservedKey {
                key: key.to_string(),
            });
        }
        if self.target.remove(key)?.is_none() {
            return Ok(false);
        }

        let key: Rc<str> = Rc::from(key);
        batch(|| {
            self.nodes.write(&key, Value::Undefined)?;
            self.nodes.notify_keys()
        })?;
        Ok(true)
    }

    /// Whether the key exists. Tracked on the key itself, so a reader reruns
    /// when the key appears or disappears.
    pub fn has(&self, key: &str) -> bool {
        if key == RAW_KEY {
            return true;
        }
        self.nodes.track(&Rc::from(key), || self.raw_value(key));
        self.target.contains_key(key)
    }

    /// Own keys in insertion order. Tracked on the key set.
    pub fn keys(&self) -> Vec<String> {
        self.nodes.track_keys();
        self.target.keys()
    }

    /// Number of keys. Tracked on the key set.
    pub fn len(&self) -> usize {
        self.nodes.track_keys();
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key with its value, read as [`get`](Self::get) would.
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key)?;
                Ok((key, value))
            })
            .collect()
    }

    /// A plain object holding the current values, like `{ ...proxy }`.
    ///
    /// Getters are evaluated; nested containers stay proxies.
    pub fn spread(&self) -> Result<Object> {
        let object = Object::new();
        for (key, value) in self.entries()? {
            object.insert(&key, value)?;
        }
        Ok(object)
    }

    /// Whether both proxies wrap the same target.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.target.ptr_eq(&other.target)
    }

    fn raw_value(&self, key: &str) -> Value {
        self.target.get(key).unwrap_or_default()
    }
}

impl PartialEq for MutableObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MutableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableObject").field(&self.target).finish()
    }
}
