//! [`NativeObject`]: an [`ObjectBridge`] composed from a state value, a
//! method table, properties and an optional call-order chain.

use std::{
    cell::{Ref, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use ecow::EcoString;

use crate::{
    bridge::{BoundMethod, ChainState, MethodTable, ObjectBridge, Param},
    error::{Error, Result},
    values::Value,
};

/// Receiver passed to methods of a `NativeObject<T>`.
pub type This<T> = Rc<NativeObject<T>>;

type Getter<T> = Rc<dyn Fn(&T) -> Result<Value>>;
type Setter<T> = Rc<dyn Fn(&T, Value) -> Result<()>>;

struct Property<T> {
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

pub struct NativeObject<T: 'static> {
    class_name: EcoString,
    state: T,
    methods: MethodTable<This<T>>,
    properties: BTreeMap<String, Property<T>>,
    chain: Option<RefCell<ChainState>>,
    this: Weak<NativeObject<T>>,
}

impl<T: 'static> core::fmt::Debug for NativeObject<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeObject")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> NativeObject<T> {
    pub fn state(&self) -> &T {
        &self.state
    }

    /// A new strong reference to this object.
    ///
    /// Every `NativeObject` is created inside an `Rc` by [`ObjectBuilder`], so
    /// this only fails while the last reference is being dropped.
    pub fn this(&self) -> Result<This<T>> {
        self.this
            .upgrade()
            .ok_or_else(|| Error::logic(format!("{} is being destroyed", self.class_name)))
    }

    pub fn methods(&self) -> &MethodTable<This<T>> {
        &self.methods
    }

    /// The call-order state, for objects built with chain declarations.
    pub fn chain(&self) -> Option<Ref<'_, ChainState>> {
        self.chain.as_ref().map(RefCell::borrow)
    }

    fn method_enabled(&self, name: &str) -> bool {
        self.methods.contains(name)
            && self
                .chain
                .as_ref()
                .is_none_or(|chain| chain.borrow().is_enabled(name))
    }

    fn method_signature(&self, name: &str) -> Vec<Param> {
        self.methods
            .get(name)
            .map(|method| method.signature().to_vec())
            .unwrap_or_default()
    }
}

impl<T: 'static> ObjectBridge for NativeObject<T> {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn get_members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.properties.keys().cloned().collect();
        members.extend(
            self.methods
                .names()
                .filter(|name| self.method_enabled(name))
                .map(str::to_string),
        );
        members
    }

    fn has_member(&self, prop: &str) -> bool {
        self.properties.contains_key(prop) || self.method_enabled(prop)
    }

    fn get_member(&self, prop: &str) -> Result<Value> {
        if let Some(property) = self.properties.get(prop) {
            return (property.getter)(&self.state);
        }
        if self.method_enabled(prop) {
            let this: Rc<dyn ObjectBridge> = self.this()?;
            let method = BoundMethod::new(this, prop, self.method_signature(prop));
            return Ok(Value::function(method));
        }
        Err(Error::unknown_member(self.class_name.as_str(), prop))
    }

    fn set_member(&self, prop: &str, value: Value) -> Result<()> {
        match self.properties.get(prop) {
            Some(Property {
                setter: Some(setter),
                ..
            }) => setter(&self.state, value),
            Some(_) => Err(Error::read_only(self.class_name.as_str(), prop)),
            None if self.method_enabled(prop) => {
                Err(Error::read_only(self.class_name.as_str(), prop))
            }
            None => Err(Error::unknown_member(self.class_name.as_str(), prop)),
        }
    }

    fn has_method(&self, name: &str) -> bool {
        self.method_enabled(name)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if !self.method_enabled(name) {
            if self.methods.contains(name) {
                tracing::debug!(
                    class = %self.class_name,
                    method = name,
                    "Chain method called before any of its prerequisites"
                );
            }
            return Err(Error::unknown_member(self.class_name.as_str(), name));
        }
        let this = self.this()?;
        let result = self.methods.invoke(&this, &self.class_name, name, args)?;
        if let Some(chain) = &self.chain {
            chain.borrow_mut().update_functions(name);
        }
        Ok(result)
    }
}

/// Builds a [`NativeObject`].
///
/// ```ignore
/// let counter = ObjectBuilder::new("Counter", Cell::new(0))
///     .property("value", |state| Ok(Value::from(state.get())))
///     .method("increment", [], |this, _| {
///         this.state().set(this.state().get() + 1);
///         Ok(Value::Undefined)
///     })
///     .build();
/// ```
pub struct ObjectBuilder<T: 'static> {
    class_name: EcoString,
    state: T,
    methods: MethodTable<This<T>>,
    properties: BTreeMap<String, Property<T>>,
    chain: Option<ChainState>,
}

impl<T: 'static> ObjectBuilder<T> {
    pub fn new(class_name: impl Into<EcoString>, state: T) -> Self {
        Self {
            class_name: class_name.into(),
            state,
            methods: MethodTable::new(),
            properties: BTreeMap::new(),
            chain: None,
        }
    }

    pub fn method(
        mut self,
        name: &str,
        signature: impl IntoIterator<Item = Param>,
        callable: impl Fn(&This<T>, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.methods.add_method(name, callable, signature);
        self
    }

    pub fn varargs_method(
        mut self,
        name: &str,
        callable: impl Fn(&This<T>, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.methods.add_varargs_method(name, callable);
        self
    }

    pub fn property(mut self, name: &str, getter: impl Fn(&T) -> Result<Value> + 'static) -> Self {
        self.properties.insert(
            name.to_string(),
            Property {
                getter: Rc::new(getter),
                setter: None,
            },
        );
        self
    }

    pub fn writable_property(
        mut self,
        name: &str,
        getter: impl Fn(&T) -> Result<Value> + 'static,
        setter: impl Fn(&T, Value) -> Result<()> + 'static,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            Property {
                getter: Rc::new(getter),
                setter: Some(Rc::new(setter)),
            },
        );
        self
    }

    /// Declares the call-order prerequisites of method `name`; see
    /// [`ChainState::register_dynamic_function`].
    pub fn chain(mut self, name: &str, prerequisites: &str) -> Self {
        self.chain
            .get_or_insert_with(ChainState::new)
            .register_dynamic_function(name, prerequisites);
        self
    }

    pub fn build(self) -> This<T> {
        let ObjectBuilder {
            class_name,
            state,
            methods,
            properties,
            chain,
        } = self;
        Rc::new_cyclic(|this| NativeObject {
            class_name,
            state,
            methods,
            properties,
            chain: chain.map(RefCell::new),
            this: this.clone(),
        })
    }
}
