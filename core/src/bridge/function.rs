use std::rc::Rc;

use ecow::EcoString;

use crate::{
    bridge::{FunctionBase, ObjectBridge, Param, Signature, validate_args},
    error::Result,
    values::{Value, ValueType},
};

/// Body of a [`NativeFunction`].
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A Rust closure exposed as a [`FunctionBase`].
///
/// ```ignore
/// let upper = NativeFunction::new(
///     "upper",
///     [Param::new("s", ValueType::String)],
///     Some(ValueType::String),
///     |args| Ok(Value::from(args[0].as_string()?.to_uppercase())),
/// );
/// ```
pub struct NativeFunction {
    name: EcoString,
    signature: Signature,
    return_type: Option<ValueType>,
    variadic: bool,
    body: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<EcoString>,
        signature: impl IntoIterator<Item = Param>,
        return_type: Option<ValueType>,
        body: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature: signature.into_iter().collect(),
            return_type,
            variadic: false,
            body: Box::new(body),
        }
    }

    /// A function that receives its arguments unchecked.
    pub fn variadic(
        name: impl Into<EcoString>,
        return_type: Option<ValueType>,
        body: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature: Signature::new(),
            return_type,
            variadic: true,
            body: Box::new(body),
        }
    }

    pub fn into_value(self) -> Value {
        Value::function(self)
    }
}

impl FunctionBase for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &[Param] {
        &self.signature
    }

    fn return_type(&self) -> Option<ValueType> {
        self.return_type
    }

    fn is_variadic(&self) -> bool {
        self.variadic
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        let args = validate_args(&self.name, &self.signature, args, self.variadic)?;
        (self.body)(&args)
    }
}

/// A method of an object, detached as a callable value.
///
/// Holds a strong reference to the object, so the object outlives every
/// handle to one of its methods. Arguments are checked by the object's
/// `call`, against the method's own signature.
pub struct BoundMethod {
    object: Rc<dyn ObjectBridge>,
    name: EcoString,
    signature: Signature,
}

impl BoundMethod {
    pub fn new(
        object: Rc<dyn ObjectBridge>,
        name: impl Into<EcoString>,
        signature: impl IntoIterator<Item = Param>,
    ) -> Self {
        Self {
            object,
            name: name.into(),
            signature: signature.into_iter().collect(),
        }
    }

    pub fn object(&self) -> &Rc<dyn ObjectBridge> {
        &self.object
    }
}

impl FunctionBase for BoundMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &[Param] {
        &self.signature
    }

    fn return_type(&self) -> Option<ValueType> {
        None
    }

    fn equals(&self, other: &dyn FunctionBase) -> bool {
        match other.as_any().downcast_ref::<BoundMethod>() {
            Some(other) => self.name == other.name && self.object.equals(other.object.as_ref()),
            None => false,
        }
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        self.object.call(&self.name, args)
    }
}
