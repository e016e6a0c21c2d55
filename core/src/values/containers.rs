//! Shared containers carried by [`Value::Array`], [`Value::Map`] and
//! [`Value::MapRef`].
//!
//! Both containers are handles: cloning shares the storage, writes through any
//! handle are visible through all of them, and the storage is freed with the
//! last strong handle. Runtime adapters keep one such handle in every foreign
//! wrapper, which is what makes identity survive a round trip.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::{
    error::{Error, Result},
    values::{Value, value::Equality},
};

/// Insertion-ordered, shared list of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replaces the element at `index`, or appends when `index == len()`.
    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        let previous = {
            let mut items = self.0.borrow_mut();
            let len = items.len();
            if index < len {
                Some(core::mem::replace(&mut items[index], value))
            } else if index == len {
                items.push(value);
                None
            } else {
                return Err(Error::argument(format!(
                    "Index {} out of range for array of length {}",
                    index, len
                )));
            }
        };
        drop(previous);
        Ok(())
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn pop(&self) -> Option<Value> {
        self.0.borrow_mut().pop()
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        Equality::default().arrays(self, other)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::from_vec(iter.into_iter().collect())
    }
}

impl core::fmt::Debug for Array {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&Value::Array(self.clone()).repr())
    }
}

type MapStorage = RefCell<BTreeMap<String, Value>>;

/// Key-ordered, shared string-keyed dictionary.
#[derive(Clone, Default)]
pub struct Map(Rc<MapStorage>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the current entries, in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn borrow(&self) -> Ref<'_, BTreeMap<String, Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, BTreeMap<String, Value>> {
        self.0.borrow_mut()
    }

    /// Non-owning reference to this map.
    pub fn downgrade(&self) -> WeakMap {
        WeakMap(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Map) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        Equality::default().maps(self, other)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(key, value)| (key.into(), value));
        Map(Rc::new(RefCell::new(entries.collect())))
    }
}

impl core::fmt::Debug for Map {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&Value::Map(self.clone()).repr())
    }
}

/// Weak reference to a [`Map`]; never keeps the map alive.
#[derive(Clone, Default)]
pub struct WeakMap(Weak<MapStorage>);

impl WeakMap {
    pub fn upgrade(&self) -> Option<Map> {
        self.0.upgrade().map(Map)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn ptr_eq(&self, other: &WeakMap) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl core::fmt::Debug for WeakMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&Value::MapRef(self.clone()).repr())
    }
}
