//! Contract implemented by every scripting-runtime adapter.
//!
//! An adapter turns shared native payloads into foreign handles and back.
//! Wrapping stores a [`NativeRef`] (a strong reference, weak for `MapRef`)
//! in a private slot of the foreign handle, tagged with its [`WrapperKind`];
//! the runtime releases it exactly once when the handle is reclaimed.
//! Unwrapping checks the tag and hands back the very same payload, so
//! identity survives a round trip.

use std::rc::Rc;

use crate::{
    bridge::{FunctionBase, ObjectBridge},
    error::Result,
    values::{Array, Map, Value, WeakMap},
};

/// Marker stored next to the payload of a foreign wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    Object,
    Array,
    Map,
    Function,
}

/// The strong native reference owned by a foreign wrapper.
#[derive(Clone)]
pub enum NativeRef {
    Object(Rc<dyn ObjectBridge>),
    Array(Array),
    Map(Map),
    /// A map exposed without ownership; the wrapper goes stale with it.
    MapRef(WeakMap),
    Function(Rc<dyn FunctionBase>),
}

impl NativeRef {
    pub fn kind(&self) -> WrapperKind {
        match self {
            NativeRef::Object(_) => WrapperKind::Object,
            NativeRef::Array(_) => WrapperKind::Array,
            NativeRef::Map(_) | NativeRef::MapRef(_) => WrapperKind::Map,
            NativeRef::Function(_) => WrapperKind::Function,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            NativeRef::Object(object) => Value::Object(object),
            NativeRef::Array(array) => Value::Array(array),
            NativeRef::Map(map) => Value::Map(map),
            NativeRef::MapRef(map) => Value::MapRef(map),
            NativeRef::Function(function) => Value::Function(function),
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn ObjectBridge>> {
        match self {
            NativeRef::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            NativeRef::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The referenced map, if any and still alive.
    pub fn map(&self) -> Option<Map> {
        match self {
            NativeRef::Map(map) => Some(map.clone()),
            NativeRef::MapRef(map) => map.upgrade(),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<dyn FunctionBase>> {
        match self {
            NativeRef::Function(function) => Some(function),
            _ => None,
        }
    }
}

pub trait RuntimeAdapter {
    /// Foreign value handle.
    type Handle;

    fn wrap_object(&self, object: Rc<dyn ObjectBridge>) -> Self::Handle;

    /// The wrapped object, or `None` if `handle` is not an object wrapper.
    fn unwrap_object(&self, handle: &Self::Handle) -> Option<Rc<dyn ObjectBridge>>;

    fn wrap_array(&self, array: Array) -> Self::Handle;

    fn unwrap_array(&self, handle: &Self::Handle) -> Option<Array>;

    fn wrap_map(&self, map: Map) -> Self::Handle;

    /// Wraps `map` without keeping it alive.
    fn wrap_map_ref(&self, map: WeakMap) -> Self::Handle;

    /// The wrapped map, or `None` if `handle` is not a map wrapper or its
    /// weakly referenced map is gone.
    fn unwrap_map(&self, handle: &Self::Handle) -> Option<Map>;

    fn wrap_function(&self, function: Rc<dyn FunctionBase>) -> Self::Handle;

    fn unwrap_function(&self, handle: &Self::Handle) -> Option<Rc<dyn FunctionBase>>;

    /// Converts a native value into a foreign handle. Shared payloads are
    /// wrapped, never copied.
    fn to_foreign(&self, value: &Value) -> Self::Handle;

    /// Converts a foreign handle into a native value. Wrappers unwrap to
    /// their original payload; plain foreign containers are copied.
    fn to_native(&self, handle: &Self::Handle) -> Result<Value>;
}
