//! Raw containers.
//!
//! [`Object`] and [`Array`] are plain, untracked, reference-counted
//! containers. Cloning a handle shares the container; equality between
//! handles is identity. Reads and writes through these types bypass
//! tracking entirely; wrap a container to get reactive access.

use std::cell::{Cell, OnceCell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use super::array::ArrayKey;
use super::nodes::Nodes;
use super::object::MutableObject;
use super::value::Value;
use crate::error::{Error, Result};

/// Longest array that index writes and `set_len` may grow to. Gaps are
/// stored densely, so a write far past the end is refused rather than
/// allocated.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

/// The length needed to hold `index`, if it is within [`MAX_ARRAY_LEN`].
pub(crate) fn len_for_index(index: usize) -> Result<usize> {
    index
        .checked_add(1)
        .filter(|len| *len <= MAX_ARRAY_LEN)
        .ok_or(Error::IndexOutOfRange {
            index,
            limit: MAX_ARRAY_LEN,
        })
}

/// Computes an accessor property. Receives the proxy the property was read
/// through.
pub type Getter = Rc<dyn Fn(&MutableObject) -> Result<Value>>;

/// Handles writes to an accessor property. Receives the proxy the property
/// was written through.
pub type Setter = Rc<dyn Fn(&MutableObject, Value) -> Result<()>>;

/// A getter/setter pair. Either half may be missing.
#[derive(Clone, Default)]
pub struct Accessor {
    pub get: Option<Getter>,
    pub set: Option<Setter>,
}

impl Accessor {
    pub fn getter(get: impl Fn(&MutableObject) -> Result<Value> + 'static) -> Self {
        Self {
            get: Some(Rc::new(get)),
            set: None,
        }
    }

    pub fn with_setter(mut self, set: impl Fn(&MutableObject, Value) -> Result<()> + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// An object property.
#[derive(Debug, Clone)]
pub enum Property {
    Data(Value),
    Accessor(Accessor),
}

pub(crate) struct ObjectData {
    pub(crate) props: RefCell<IndexMap<Rc<str>, Property>>,
    frozen: Cell<bool>,
    pub(crate) nodes: OnceCell<Rc<Nodes<Rc<str>>>>,
}

/// A plain keyed container. Keys keep insertion order.
///
/// The [`with`](Self::with) builders are meant for fresh data and never
/// fail: on a frozen object they leave it unchanged and log a warning. Use
/// [`define`](Self::define) or [`insert`](Self::insert) to get
/// [`Error::Frozen`] instead.
#[derive(Clone)]
pub struct Object(pub(crate) Rc<ObjectData>);

impl Object {
    pub fn new() -> Self {
        Self(Rc::new(ObjectData {
            props: RefCell::new(IndexMap::new()),
            frozen: Cell::new(false),
            nodes: OnceCell::new(),
        }))
    }

    /// Builder-style data property. See [`Object`] for frozen objects.
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.build(key, Property::Data(value.into()))
    }

    /// Builder-style accessor property. See [`Object`] for frozen objects.
    pub fn with_accessor(self, key: &str, accessor: Accessor) -> Self {
        self.build(key, Property::Accessor(accessor))
    }

    fn build(self, key: &str, property: Property) -> Self {
        if self.define(key, property).is_err() {
            warn!(key, "builder ignored on a frozen object");
        }
        self
    }

    /// Define or replace a property.
    pub fn define(&self, key: &str, property: Property) -> Result<()> {
        self.check_frozen()?;
        self.0.props.borrow_mut().insert(Rc::from(key), property);
        Ok(())
    }

    /// Store a data value, returning the previous data value if any.
    pub fn insert(&self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        self.check_frozen()?;
        let previous = self
            .0
            .props
            .borrow_mut()
            .insert(Rc::from(key), Property::Data(value.into()));
        Ok(match previous {
            Some(Property::Data(value)) => Some(value),
            _ => None,
        })
    }

    /// Remove a property, keeping the order of the others.
    pub fn remove(&self, key: &str) -> Result<Option<Property>> {
        self.check_frozen()?;
        Ok(self.0.props.borrow_mut().shift_remove(key))
    }

    /// The data value under `key`. Accessors and missing keys read as `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.0.props.borrow().get(key) {
            Some(Property::Data(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn property(&self, key: &str) -> Option<Property> {
        self.0.props.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().map(|key| key.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the object immutable. Frozen objects are never wrapped.
    pub fn freeze(&self) -> Self {
        self.0.frozen.set(true);
        self.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    /// Whether both handles share one container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn nodes(&self) -> Rc<Nodes<Rc<str>>> {
        Rc::clone(self.0.nodes.get_or_init(|| Rc::new(Nodes::new())))
    }

    pub(crate) fn entries(&self) -> Vec<(Rc<str>, Property)> {
        self.0
            .props
            .borrow()
            .iter()
            .map(|(key, property)| (Rc::clone(key), property.clone()))
            .collect()
    }

    fn check_frozen(&self) -> Result<()> {
        if self.is_frozen() {
            Err(Error::Frozen)
        } else {
            Ok(())
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Object::new(), |object, (key, value)| object.with(key.as_ref(), value))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props = self.0.props.borrow();
        let mut map = f.debug_map();
        for (key, property) in props.iter() {
            match property {
                Property::Data(value) => map.entry(key, value),
                Property::Accessor(accessor) => map.entry(key, accessor),
            };
        }
        map.finish()
    }
}

pub(crate) struct ArrayData {
    pub(crate) items: RefCell<Vec<Value>>,
    frozen: Cell<bool>,
    pub(crate) nodes: OnceCell<Rc<Nodes<ArrayKey>>>,
}

/// A plain ordered container.
#[derive(Clone)]
pub struct Array(pub(crate) Rc<ArrayData>);

impl Array {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayData {
            items: RefCell::new(items),
            frozen: Cell::new(false),
            nodes: OnceCell::new(),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Store `value` at `index`, filling any gap with `Undefined`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.check_frozen()?;
        let mut items = self.0.items.borrow_mut();
        if index >= items.len() {
            items.resize(len_for_index(index)?, Value::Undefined);
        }
        items[index] = value.into();
        Ok(())
    }

    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.check_frozen()?;
        self.0.items.borrow_mut().push(value.into());
        Ok(())
    }

    /// Borrow the items. Writing the array while the borrow lives panics.
    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.0.items.borrow()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Make the array immutable. Frozen arrays are never wrapped.
    pub fn freeze(&self) -> Self {
        self.0.frozen.set(true);
        self.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    /// Whether both handles share one container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn nodes(&self) -> Rc<Nodes<ArrayKey>> {
        Rc::clone(self.0.nodes.get_or_init(|| Rc::new(Nodes::new())))
    }

    pub(crate) fn check_frozen(&self) -> Result<()> {
        if self.is_frozen() {
            Err(Error::Frozen)
        } else {
            Ok(())
        }
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.borrow().iter()).finish()
    }
}
