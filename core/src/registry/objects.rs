use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    values::{Binder, Map, Value, binder},
};

/// Named objects (`session`, `db`, `shell`, ...) made visible to scripts.
///
/// Scripts see the registry through [`ObjectRegistry::as_value_ref`], a
/// `MapRef`, so no scripting handle keeps the registry alive once the
/// application drops it.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: Map,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ObjectRegistryBuilder {
        ObjectRegistryBuilder::default()
    }

    /// Adds `name`; fails if it is already registered.
    pub fn register(&self, name: &str, value: Value) -> Result<()> {
        if self.objects.contains_key(name) {
            return Err(Error::logic(format!("Object '{}' is already registered", name)));
        }
        self.objects.set(name, value);
        Ok(())
    }

    /// Adds or replaces `name`, returning the previous value.
    pub fn replace(&self, name: &str, value: Value) -> Option<Value> {
        self.objects.set(name, value)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.objects.get(name)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.objects.remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.keys()
    }

    pub fn as_value_ref(&self) -> Value {
        Value::MapRef(self.objects.downgrade())
    }
}

#[derive(Default)]
pub struct ObjectRegistryBuilder {
    objects: BTreeMap<String, Value>,
    duplicates: Vec<String>,
}

impl Binder for ObjectRegistryBuilder {
    type Output = ObjectRegistry;

    fn bind(mut self, name: &str, value: Value) -> Self {
        let repeated = self.objects.insert(name.to_string(), value).is_some();
        if repeated && !self.duplicates.iter().any(|duplicate| duplicate == name) {
            self.duplicates.push(name.to_string());
        }
        self
    }

    fn build(self) -> core::result::Result<ObjectRegistry, binder::Error> {
        if !self.duplicates.is_empty() {
            return Err(binder::Error::DuplicateBinding(self.duplicates));
        }
        let objects: Map = self.objects.into_iter().collect();
        Ok(ObjectRegistry { objects })
    }
}
