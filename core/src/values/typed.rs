//! Mapping between Rust types and value tags.
//!
//! `Bridge` is what lets `#[bridge_fn]` turn a plain Rust signature into a
//! checked [`FunctionBase`](crate::bridge::FunctionBase): parameter types give
//! the declared signature, and `from_value`/`into_value` do the conversions.

use std::rc::Rc;

use ecow::EcoString;

use crate::{
    bridge::{FunctionBase, ObjectBridge},
    error::Result,
    values::{Array, Map, Value, ValueType},
};

pub trait Bridge: Sized {
    /// Tag this type is declared as; `None` accepts any value.
    const VALUE_TYPE: Option<ValueType>;

    fn from_value(value: &Value) -> Result<Self>;

    fn into_value(self) -> Value;
}

impl Bridge for Value {
    const VALUE_TYPE: Option<ValueType> = None;

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }

    fn into_value(self) -> Value {
        self
    }
}

impl Bridge for () {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Undefined);

    fn from_value(value: &Value) -> Result<Self> {
        value.check_type(ValueType::Undefined)
    }

    fn into_value(self) -> Value {
        Value::Undefined
    }
}

impl Bridge for bool {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Bool);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl Bridge for i64 {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Integer);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_int()
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl Bridge for f64 {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Float);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_double()
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl Bridge for String {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::String);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_string().map(str::to_string)
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl Bridge for EcoString {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::String);

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => other.check_type(ValueType::String).map(|_| EcoString::new()),
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl Bridge for Array {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Array);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_array()
    }

    fn into_value(self) -> Value {
        Value::Array(self)
    }
}

impl Bridge for Map {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Map);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_map()
    }

    fn into_value(self) -> Value {
        Value::Map(self)
    }
}

impl Bridge for Rc<dyn ObjectBridge> {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Object);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_object_bridge()
    }

    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl Bridge for Rc<dyn FunctionBase> {
    const VALUE_TYPE: Option<ValueType> = Some(ValueType::Function);

    fn from_value(value: &Value) -> Result<Self> {
        value.as_function()
    }

    fn into_value(self) -> Value {
        Value::Function(self)
    }
}
