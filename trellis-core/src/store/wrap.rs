//! The boundary between plain and reactive values.
//!
//! Only non-frozen plain objects and arrays are ever wrapped. Everything
//! else (frozen containers, dates, functions, primitives) passes through
//! untouched in both directions.

use std::collections::HashMap;
use std::fmt;

use super::array::MutableArray;
use super::object::MutableObject;
use super::raw::{Array, Object, Property};
use super::value::Value;
use crate::error::{Error, Result};

/// A reactive proxy, keyed or ordered.
#[derive(Clone, PartialEq)]
pub enum Mutable {
    Object(MutableObject),
    Array(MutableArray),
}

impl Mutable {
    pub fn as_object(&self) -> Option<&MutableObject> {
        match self {
            Mutable::Object(object) => Some(object),
            Mutable::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&MutableArray> {
        match self {
            Mutable::Array(array) => Some(array),
            Mutable::Object(_) => None,
        }
    }

    pub fn into_object(self) -> Option<MutableObject> {
        match self {
            Mutable::Object(object) => Some(object),
            Mutable::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<MutableArray> {
        match self {
            Mutable::Array(array) => Some(array),
            Mutable::Object(_) => None,
        }
    }

    /// The raw target as a plain value.
    pub fn raw(&self) -> Value {
        match self {
            Mutable::Object(object) => Value::Object(object.raw().clone()),
            Mutable::Array(array) => Value::Array(array.raw().clone()),
        }
    }
}

impl fmt::Debug for Mutable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutable::Object(object) => object.fmt(f),
            Mutable::Array(array) => array.fmt(f),
        }
    }
}

/// Whether [`wrap`] would turn `value` into a proxy.
pub fn is_wrappable(value: &Value) -> bool {
    match value {
        Value::Object(object) => !object.is_frozen(),
        Value::Array(array) => !array.is_frozen(),
        _ => false,
    }
}

/// Proxy a plain container. Wrapping the same container again gives an
/// equal proxy sharing the same signals. Anything else, proxies included,
/// is returned unchanged.
pub fn wrap(value: Value) -> Value {
    match value {
        Value::Object(object) if !object.is_frozen() => {
            Value::Mutable(Mutable::Object(MutableObject::new(object)))
        }
        Value::Array(array) if !array.is_frozen() => {
            Value::Mutable(Mutable::Array(MutableArray::new(array)))
        }
        other => other,
    }
}

/// Create a reactive store from plain data.
///
/// The input is unwrapped first, so passing a proxy wraps a plain copy of
/// its data.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_core::store::create_mutable;
///
/// let state = create_mutable(json!({"count": 1})).unwrap();
/// let state = state.into_object().unwrap();
/// state.set("count", 2).unwrap();
/// assert_eq!(state.get("count").unwrap().as_f64(), Some(2.0));
/// ```
pub fn create_mutable(value: impl Into<Value>) -> Result<Mutable> {
    let value = unwrap(&value.into());
    match wrap(value) {
        Value::Mutable(mutable) => Ok(mutable),
        other => Err(Error::NotWrappable { kind: other.kind() }),
    }
}

/// Strip every proxy out of `value`.
///
/// A proxy becomes a fresh container holding its raw data, with children
/// unwrapped in turn. A plain container is kept, by reference, and any
/// proxies stored inside it are replaced in place. Frozen containers and
/// everything that is not a container are returned as they are. Shared and
/// cyclic structure is visited once.
pub fn unwrap(value: &Value) -> Value {
    Unwrapper::copying().unwrap(value)
}

/// Strip proxies the way a store write does: a proxy becomes its own raw
/// target, so the stored value stays shared with every other view of it.
/// Proxies nested in plain containers are replaced in place.
pub(crate) fn to_raw(value: &Value) -> Value {
    Unwrapper::sharing().unwrap(value)
}

struct Unwrapper {
    /// Container address -> its unwrapped counterpart.
    seen: HashMap<usize, Value>,
    /// Whether proxies turn into fresh copies or into their targets.
    copy: bool,
}

impl Unwrapper {
    fn copying() -> Self {
        Self {
            seen: HashMap::new(),
            copy: true,
        }
    }

    fn sharing() -> Self {
        Self {
            seen: HashMap::new(),
            copy: false,
        }
    }

    fn unwrap(&mut self, value: &Value) -> Value {
        match value {
            Value::Mutable(Mutable::Object(proxy)) if self.copy => self.copy_object(proxy.raw()),
            Value::Mutable(Mutable::Array(proxy)) if self.copy => self.copy_array(proxy.raw()),
            Value::Mutable(Mutable::Object(proxy)) => {
                self.walk_object(proxy.raw());
                Value::Object(proxy.raw().clone())
            }
            Value::Mutable(Mutable::Array(proxy)) => {
                self.walk_array(proxy.raw());
                Value::Array(proxy.raw().clone())
            }
            Value::Object(object) if !object.is_frozen() => {
                self.walk_object(object);
                value.clone()
            }
            Value::Array(array) if !array.is_frozen() => {
                self.walk_array(array);
                value.clone()
            }
            other => other.clone(),
        }
    }

    fn copy_object(&mut self, raw: &Object) -> Value {
        if let Some(done) = self.seen.get(&raw.addr()) {
            return done.clone();
        }
        let copy = Object::new();
        self.seen.insert(raw.addr(), Value::Object(copy.clone()));
        for (key, property) in raw.entries() {
            let property = match property {
                Property::Data(value) => Property::Data(self.unwrap(&value)),
                accessor => accessor,
            };
            let _ = copy.define(&key, property);
        }
        Value::Object(copy)
    }

    fn copy_array(&mut self, raw: &Array) -> Value {
        if let Some(done) = self.seen.get(&raw.addr()) {
            return done.clone();
        }
        let copy = Array::new();
        self.seen.insert(raw.addr(), Value::Array(copy.clone()));
        let items: Vec<Value> = raw.to_vec().iter().map(|item| self.unwrap(item)).collect();
        *copy.0.items.borrow_mut() = items;
        Value::Array(copy)
    }

    fn walk_object(&mut self, object: &Object) {
        if self.seen.contains_key(&object.addr()) {
            return;
        }
        self.seen.insert(object.addr(), Value::Object(object.clone()));
        for (key, property) in object.entries() {
            let Property::Data(value) = property else {
                continue;
            };
            let unwrapped = self.unwrap(&value);
            if unwrapped != value {
                let _ = object.insert(&key, unwrapped);
            }
        }
    }

    fn walk_array(&mut self, array: &Array) {
        if self.seen.contains_key(&array.addr()) {
            return;
        }
        self.seen.insert(array.addr(), Value::Array(array.clone()));
        for (index, item) in array.to_vec().into_iter().enumerate() {
            let unwrapped = self.unwrap(&item);
            if unwrapped != item {
                let _ = array.set(index, unwrapped);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;

    use super::*;
    use crate::store::{Function, RAW_KEY};

    #[test]
    fn wrap_is_identity_stable() {
        let target = Value::from(Object::new().with("a", 1));
        let first = wrap(target.clone());
        let second = wrap(target.clone());
        assert_eq!(first, second);
        assert_ne!(first, target);

        // Proxies pass through.
        assert_eq!(wrap(first.clone()), first);
    }

    #[test]
    fn pass_through_values_are_not_wrapped() {
        let frozen = Value::from(Object::new().freeze());
        let date = Value::from(SystemTime::UNIX_EPOCH);
        let function = Value::from(Function::new(|_| Ok(Value::Null)));

        for value in [frozen, date, function, Value::from(1), Value::Null] {
            assert!(!is_wrappable(&value));
            assert_eq!(wrap(value.clone()), value);
        }
        assert!(is_wrappable(&Value::from(Array::new())));
    }

    #[test]
    fn create_mutable_rejects_non_containers() {
        assert_eq!(
            create_mutable(3).unwrap_err(),
            Error::NotWrappable { kind: "number" }
        );
        assert_eq!(
            create_mutable(Object::new().freeze()).unwrap_err(),
            Error::NotWrappable {
                kind: "frozen object"
            }
        );
        assert!(create_mutable(json!([1, 2])).unwrap().as_array().is_some());
    }

    #[test]
    fn unwrap_copies_proxies() {
        let raw = Object::new().with("n", 1);
        let proxy = wrap(Value::from(raw.clone()));

        let plain = unwrap(&proxy);
        let plain = plain.as_object().unwrap();
        assert!(!plain.ptr_eq(&raw));
        assert_eq!(plain.get("n"), Some(Value::from(1)));
        assert!(!plain.contains_key(RAW_KEY));
    }

    #[test]
    fn unwrap_keeps_pass_through_by_reference() {
        let frozen = Object::new().with("deep", 1).freeze();
        let date = Value::from(SystemTime::UNIX_EPOCH);
        let state = create_mutable(
            Object::new()
                .with("frozen", frozen.clone())
                .with("when", date.clone()),
        )
        .unwrap()
        .into_object()
        .unwrap();

        let spread = Value::from(state.spread().unwrap());
        let plain = unwrap(&spread);
        let plain = plain.as_object().unwrap();

        let kept = plain.get("frozen").unwrap();
        assert!(kept.as_object().unwrap().ptr_eq(&frozen));
        assert_eq!(plain.get("when").unwrap(), date);
    }

    #[test]
    fn unwrap_replaces_nested_proxies_in_place() {
        let inner = Object::new().with("x", 1);
        let proxy = wrap(Value::from(inner.clone()));
        let outer = Object::new().with("inner", proxy);

        let result = unwrap(&Value::from(outer.clone()));
        assert!(result.as_object().unwrap().ptr_eq(&outer));

        let replaced = outer.get("inner").unwrap();
        assert!(replaced.as_mutable().is_none());
        assert_eq!(replaced.as_object().unwrap().get("x"), Some(Value::from(1)));
    }

    #[test]
    fn unwrap_handles_cycles() {
        let object = Object::new();
        object.insert("me", wrap(Value::from(object.clone()))).unwrap();

        let plain = unwrap(&Value::from(object.clone()));
        let plain = plain.as_object().unwrap();
        let me = plain.get("me").unwrap();
        let me = me.as_object().unwrap();
        // The proxy resolves to the object already being walked.
        assert!(me.ptr_eq(&object));
        assert!(plain.ptr_eq(&object));

        // Break the cycle so the test does not leak.
        object.remove("me").unwrap();
    }

    #[test]
    fn to_raw_shares_the_target() {
        let inner = Object::new().with("x", 1);
        let proxy = wrap(Value::from(inner.clone()));

        let raw = to_raw(&proxy);
        assert!(raw.as_object().unwrap().ptr_eq(&inner));

        let holder = Array::from_vec(vec![proxy]);
        let raw = to_raw(&Value::from(holder.clone()));
        assert!(raw.as_array().unwrap().ptr_eq(&holder));
        let item = holder.get(0).unwrap();
        assert!(item.as_object().unwrap().ptr_eq(&inner));
    }
}
