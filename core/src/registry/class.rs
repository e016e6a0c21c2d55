use std::{collections::BTreeMap, rc::Rc};

use crate::{
    bridge::{NativeFunction, ObjectBridge},
    error::{Error, Result},
    values::{Map, Value, ValueType},
};

/// Factory producing a new instance from script arguments.
pub type Constructor = dyn Fn(&[Value]) -> Result<Rc<dyn ObjectBridge>>;

/// Class factories, grouped by package.
#[derive(Default)]
pub struct ClassRegistry {
    packages: BTreeMap<String, BTreeMap<String, Rc<Constructor>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for `package.class_name`. Registering the same
    /// class twice is a logic error.
    pub fn register_factory(
        &mut self,
        package: &str,
        class_name: &str,
        constructor: impl Fn(&[Value]) -> Result<Rc<dyn ObjectBridge>> + 'static,
    ) -> Result<()> {
        let classes = self.packages.entry(package.to_string()).or_default();
        if classes.contains_key(class_name) {
            return Err(Error::logic(format!(
                "Factory for {}.{} is already registered",
                package, class_name
            )));
        }
        tracing::debug!(package, class = class_name, "Registered class factory");
        classes.insert(class_name.to_string(), Rc::new(constructor));
        Ok(())
    }

    pub fn has_factory(&self, package: &str, class_name: &str) -> bool {
        self.constructor(package, class_name).is_some()
    }

    fn constructor(&self, package: &str, class_name: &str) -> Option<Rc<Constructor>> {
        self.packages.get(package)?.get(class_name).cloned()
    }

    /// Creates an instance of `package.class_name`.
    pub fn call_constructor(
        &self,
        package: &str,
        class_name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let constructor = self.constructor(package, class_name).ok_or_else(|| {
            Error::UnknownFactory {
                package: package.to_string(),
                class: class_name.to_string(),
            }
        })?;
        constructor(args).map(Value::Object)
    }

    pub fn packages(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    pub fn classes(&self, package: &str) -> Vec<&str> {
        self.packages
            .get(package)
            .map(|classes| classes.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The constructors of `package` as callable values, keyed by class name,
    /// ready to be exposed to scripts.
    pub fn package_value(&self, package: &str) -> Result<Map> {
        let classes = self
            .packages
            .get(package)
            .ok_or_else(|| Error::Attribute(format!("Unknown package '{}'", package)))?;
        Ok(classes
            .iter()
            .map(|(class_name, constructor)| {
                let constructor = constructor.clone();
                let function = NativeFunction::variadic(
                    class_name.as_str(),
                    Some(ValueType::Object),
                    move |args| constructor(args).map(Value::Object),
                );
                (class_name.clone(), function.into_value())
            })
            .collect())
    }
}
