use std::{collections::BTreeMap, rc::Rc};

use crate::{
    bridge::{Param, Signature, validate_args},
    error::{Error, Result},
    values::Value,
};

/// Callable stored in a [`MethodTable`], receiving the object it is bound to.
pub type MethodFn<R> = dyn Fn(&R, &[Value]) -> Result<Value>;

pub struct Method<R> {
    signature: Signature,
    variadic: bool,
    callable: Rc<MethodFn<R>>,
}

impl<R> Clone for Method<R> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            variadic: self.variadic,
            callable: self.callable.clone(),
        }
    }
}

impl<R> Method<R> {
    pub fn signature(&self) -> &[Param] {
        &self.signature
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Named methods of a class, dispatched on a receiver of type `R`.
pub struct MethodTable<R> {
    methods: BTreeMap<String, Method<R>>,
}

impl<R> Default for MethodTable<R> {
    fn default() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }
}

impl<R> MethodTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callable` under `name`; a later registration replaces an
    /// earlier one.
    pub fn add_method(
        &mut self,
        name: &str,
        callable: impl Fn(&R, &[Value]) -> Result<Value> + 'static,
        signature: impl IntoIterator<Item = Param>,
    ) {
        self.insert(name, Rc::new(callable), signature.into_iter().collect(), false);
    }

    /// Registers a method that receives its arguments unchecked.
    pub fn add_varargs_method(
        &mut self,
        name: &str,
        callable: impl Fn(&R, &[Value]) -> Result<Value> + 'static,
    ) {
        self.insert(name, Rc::new(callable), Signature::new(), true);
    }

    fn insert(
        &mut self,
        name: &str,
        callable: Rc<MethodFn<R>>,
        signature: Signature,
        variadic: bool,
    ) {
        let method = Method {
            signature,
            variadic,
            callable,
        };
        if self.methods.insert(name.to_string(), method).is_some() {
            tracing::debug!(method = name, "Replacing existing method");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Method<R>> {
        self.methods.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Validates `args` against the method's signature and calls it.
    pub fn invoke(
        &self,
        receiver: &R,
        class_name: &str,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| Error::unknown_member(class_name, name))?;
        let args = validate_args(
            &format!("{}.{}", class_name, name),
            &method.signature,
            args,
            method.variadic,
        )?;
        let callable = method.callable.clone();
        callable(receiver, &args)
    }
}
