use std::rc::Rc;

use ecow::EcoString;

use crate::{
    bridge::{FunctionBase, ObjectBridge},
    error::{Error, Result},
    values::{Array, Map, WeakMap},
};

/// Tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined,
    Null,
    Bool,
    String,
    Integer,
    Float,
    Object,
    Array,
    Map,
    MapRef,
    Function,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Undefined => "Undefined",
            ValueType::Null => "Null",
            ValueType::Bool => "Bool",
            ValueType::String => "String",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Object => "Object",
            ValueType::Array => "Array",
            ValueType::Map => "Map",
            ValueType::MapRef => "MapRef",
            ValueType::Function => "Function",
        }
    }
}

impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value crossing a language boundary.
///
/// Primitives are held inline. Arrays, Maps, Objects and Functions are shared:
/// cloning a `Value` clones the handle, not the payload, and the payload lives
/// as long as its last owner, native or foreign. `MapRef` observes a Map
/// without owning it.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    String(EcoString),
    Integer(i64),
    Float(f64),
    Object(Rc<dyn ObjectBridge>),
    Array(Array),
    Map(Map),
    MapRef(WeakMap),
    Function(Rc<dyn FunctionBase>),
}

static_assertions::assert_not_impl_any!(Value: Send, Sync);

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::MapRef(_) => ValueType::MapRef,
            Value::Function(_) => ValueType::Function,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().as_str()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    // ============================================================================
    // Construction
    // ============================================================================

    pub fn string(s: impl Into<EcoString>) -> Self {
        Value::String(s.into())
    }

    pub fn object(object: impl ObjectBridge) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn function(function: impl FunctionBase) -> Self {
        Value::Function(Rc::new(function))
    }

    pub fn new_array() -> Self {
        Value::Array(Array::new())
    }

    pub fn new_map() -> Self {
        Value::Map(Map::new())
    }

    // ============================================================================
    // Extraction
    // ============================================================================

    /// Fails with a type error unless the value carries `expected`.
    pub fn check_type(&self, expected: ValueType) -> Result<()> {
        let actual = self.value_type();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::TypeMismatch { expected, actual })
        }
    }

    fn mismatch<T>(&self, expected: ValueType) -> Result<T> {
        Err(Error::TypeMismatch {
            expected,
            actual: self.value_type(),
        })
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => self.mismatch(ValueType::Bool),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            _ => self.mismatch(ValueType::Integer),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            _ => self.mismatch(ValueType::Float),
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            _ => self.mismatch(ValueType::String),
        }
    }

    pub fn as_object_bridge(&self) -> Result<Rc<dyn ObjectBridge>> {
        match self {
            Value::Object(object) => Ok(object.clone()),
            _ => self.mismatch(ValueType::Object),
        }
    }

    /// Returns the object as its concrete class.
    pub fn as_object<T: ObjectBridge>(&self) -> Result<Rc<T>> {
        let object = self.as_object_bridge()?;
        let class_name = object.class_name().to_string();
        object.into_any_rc().downcast::<T>().map_err(|_| {
            Error::Type(format!(
                "Invalid typecast: {} is not a {}",
                class_name,
                core::any::type_name::<T>()
            ))
        })
    }

    pub fn as_array(&self) -> Result<Array> {
        match self {
            Value::Array(array) => Ok(array.clone()),
            _ => self.mismatch(ValueType::Array),
        }
    }

    /// Returns the Map, resolving a `MapRef` whose target is still alive.
    pub fn as_map(&self) -> Result<Map> {
        match self {
            Value::Map(map) => Ok(map.clone()),
            Value::MapRef(weak) => weak
                .upgrade()
                .ok_or_else(|| Error::logic("Referenced map no longer exists")),
            _ => self.mismatch(ValueType::Map),
        }
    }

    pub fn as_function(&self) -> Result<Rc<dyn FunctionBase>> {
        match self {
            Value::Function(function) => Ok(function.clone()),
            _ => self.mismatch(ValueType::Function),
        }
    }
}

impl PartialEq for Value {
    /// Tag-aware structural equality. Values of different tags are never equal,
    /// so `Bool(true) != Integer(1)` and `Integer(1) != Float(1.0)`. NaN equals
    /// NaN, so every value equals what its `repr` parses back to.
    fn eq(&self, other: &Self) -> bool {
        Equality::default().values(self, other)
    }
}

/// Structural comparison that terminates on self-referencing containers:
/// a pair of containers already being compared further up counts as equal.
#[derive(Default)]
pub(crate) struct Equality {
    active: Vec<(*const (), *const ())>,
}

impl Equality {
    pub(crate) fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Object(a), Value::Object(b)) => a.equals(b.as_ref()),
            (Value::Array(a), Value::Array(b)) => self.arrays(a, b),
            (Value::Map(a), Value::Map(b)) => self.maps(a, b),
            (Value::MapRef(a), Value::MapRef(b)) => {
                a.ptr_eq(b)
                    || match (a.upgrade(), b.upgrade()) {
                        (Some(a), Some(b)) => self.maps(&a, &b),
                        _ => false,
                    }
            }
            (Value::Function(a), Value::Function(b)) => a.equals(b.as_ref()),
            _ => false,
        }
    }

    pub(crate) fn arrays(&mut self, a: &Array, b: &Array) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        let (left, right) = (a.to_vec(), b.to_vec());
        if left.len() != right.len() {
            return false;
        }
        self.nested((a.addr(), b.addr()), |this| {
            left.iter().zip(&right).all(|(x, y)| this.values(x, y))
        })
    }

    pub(crate) fn maps(&mut self, a: &Map, b: &Map) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        let (left, right) = (a.entries(), b.entries());
        if left.len() != right.len() {
            return false;
        }
        self.nested((a.addr(), b.addr()), |this| {
            left.iter()
                .zip(&right)
                .all(|((ka, va), (kb, vb))| ka == kb && this.values(va, vb))
        })
    }

    fn nested(
        &mut self,
        pair: (*const (), *const ()),
        compare: impl FnOnce(&mut Self) -> bool,
    ) -> bool {
        if self.active.contains(&pair) {
            return true;
        }
        self.active.push(pair);
        let equal = compare(self);
        self.active.pop();
        equal
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.repr())
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.descr(false))
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<EcoString> for Value {
    fn from(s: EcoString) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl From<Rc<dyn ObjectBridge>> for Value {
    fn from(object: Rc<dyn ObjectBridge>) -> Self {
        Value::Object(object)
    }
}

impl From<Rc<dyn FunctionBase>> for Value {
    fn from(function: Rc<dyn FunctionBase>) -> Self {
        Value::Function(function)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Value::Null, Into::into)
    }
}
