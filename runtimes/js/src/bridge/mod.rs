//! Exposes native values to the JavaScript engine and back.
//!
//! Objects, arrays, maps and functions are wrapped, never copied: each
//! wrapper is a template instance carrying a [`WrapperKind`] marker in
//! internal field 0 and a [`NativeRef`] in field 1 (strong except for
//! `MapRef`). A weak callback releases the reference when the collector
//! reclaims the wrapper. Scalars are converted by value and plain script
//! arrays/objects are copied.

mod errors;
mod function;
mod interceptors;

#[cfg(test)]
mod bridge_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;
use once_cell::unsync::OnceCell;
use shellbridge_core::{
    Array, Error, Map, MarshalOptions, Result, Value, WeakMap,
    bridge::{Capabilities, FunctionBase, ObjectBridge},
    runtime::{NativeRef, RuntimeAdapter, WrapperKind},
};

use crate::engine::{Handle, JsContext, JsValue, ObjectTemplate, TemplateId};

pub use function::JsFunction;

pub(crate) const KIND_FIELD: usize = 0;
pub(crate) const PAYLOAD_FIELD: usize = 1;

/// Largest integer a JS number represents exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

struct Templates {
    object: TemplateId,
    indexed_object: TemplateId,
    array: TemplateId,
    map: TemplateId,
    function: TemplateId,
}

impl Templates {
    fn register(ctx: &JsContext) -> Self {
        let object = ObjectTemplate::new("Object")
            .internal_fields(2)
            .named(interceptors::object_get, interceptors::object_set)
            .enumerator(interceptors::object_keys)
            .callable(interceptors::object_call);
        let indexed_object = object
            .clone()
            .indexed(interceptors::object_get_index, interceptors::object_set_index);
        Self {
            object: ctx.register_template(object),
            indexed_object: ctx.register_template(indexed_object),
            array: ctx.register_template(
                ObjectTemplate::new("Array")
                    .internal_fields(2)
                    .named(interceptors::array_get, interceptors::array_set)
                    .indexed(interceptors::array_get_index, interceptors::array_set_index)
                    .enumerator(interceptors::array_keys),
            ),
            map: ctx.register_template(
                ObjectTemplate::new("Map")
                    .internal_fields(2)
                    .named(interceptors::map_get, interceptors::map_set)
                    .enumerator(interceptors::map_keys),
            ),
            function: ctx.register_template(
                ObjectTemplate::new("Function")
                    .internal_fields(2)
                    .named(interceptors::function_get, interceptors::function_set)
                    .callable(interceptors::function_call),
            ),
        }
    }
}

/// Per-context state, stored as the context's embedder data.
pub(crate) struct BridgeState {
    templates: OnceCell<Templates>,
    /// Script callables referenced from native code, by key.
    callables: RefCell<HashMap<u64, Handle>>,
    next_callable: Cell<u64>,
    marshal: MarshalOptions,
}

impl BridgeState {
    pub(crate) fn register_callable(&self, handle: Handle) -> u64 {
        let key = self.next_callable.get();
        self.next_callable.set(key + 1);
        self.callables.borrow_mut().insert(key, handle);
        key
    }

    pub(crate) fn callable(&self, key: u64) -> Option<Handle> {
        self.callables.borrow().get(&key).copied()
    }

    pub(crate) fn forget_callable(&self, key: u64) -> bool {
        self.callables.borrow_mut().remove(&key).is_some()
    }
}

/// [`RuntimeAdapter`] for a [`JsContext`].
///
/// Cheap to create: every bridge over the same context shares one state.
#[derive(Clone)]
pub struct JsBridge {
    ctx: JsContext,
    state: Rc<BridgeState>,
}

impl JsBridge {
    pub fn new(ctx: &JsContext) -> Self {
        let state = match ctx.embedder_data::<BridgeState>() {
            Some(state) => state,
            None => {
                let state = Rc::new(BridgeState {
                    templates: OnceCell::new(),
                    callables: RefCell::new(HashMap::new()),
                    next_callable: Cell::new(0),
                    marshal: ctx.options().marshal,
                });
                ctx.set_embedder_data(state.clone());
                state
            }
        };
        Self {
            ctx: ctx.clone(),
            state,
        }
    }

    pub fn context(&self) -> &JsContext {
        &self.ctx
    }

    pub(crate) fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Number of script callables currently referenced from native code.
    pub fn callable_count(&self) -> usize {
        self.state.callables.borrow().len()
    }

    fn templates(&self) -> &Templates {
        self.state
            .templates
            .get_or_init(|| Templates::register(&self.ctx))
    }

    /// Publishes `value` as global `name`.
    pub fn set_global(&self, name: &str, value: &Value) {
        let handle = self.to_foreign(value);
        self.ctx.set_global(name, handle);
    }

    pub fn get_global(&self, name: &str) -> Result<Value> {
        self.to_native(&self.ctx.get_global(name))
    }

    fn wrap(&self, template: TemplateId, native: NativeRef) -> JsValue {
        let kind = native.kind();
        let handle = self.ctx.new_instance(template);
        self.ctx.set_internal_field(handle, KIND_FIELD, Box::new(kind));
        self.ctx
            .set_internal_field(handle, PAYLOAD_FIELD, Box::new(native));
        self.ctx.set_weak(handle, move |info| {
            if info.take_internal_field::<NativeRef>(PAYLOAD_FIELD).is_some() {
                tracing::trace!(?kind, "Released native reference of collected wrapper");
            }
        });
        JsValue::Object(handle)
    }

    fn unwrap(&self, handle: &JsValue, kind: WrapperKind) -> Option<NativeRef> {
        native_ref(&self.ctx, handle.as_object()?, kind)
    }

    fn any_native_ref(&self, handle: Handle) -> Option<NativeRef> {
        let kind = self.ctx.internal_field::<WrapperKind>(handle, KIND_FIELD)?;
        native_ref(&self.ctx, handle, kind)
    }

    /// Builds the error object that reports `error` to scripts.
    pub fn throw(&self, error: &Error) -> JsValue {
        errors::throw_native(&self.ctx, error)
    }

    /// Converts a value thrown by script code into a native error.
    pub fn error_from_thrown(&self, thrown: &JsValue) -> Error {
        errors::error_from_thrown(&self.ctx, thrown)
    }

    fn to_native_at(&self, handle: &JsValue, depth: usize) -> Result<Value> {
        let value = match handle {
            JsValue::Undefined => Value::Undefined,
            JsValue::Null => Value::Null,
            JsValue::Bool(b) => Value::Bool(*b),
            JsValue::Number(n) => number_to_value(*n),
            JsValue::BigInt(i) => Value::Integer(*i),
            JsValue::String(s) => Value::from(&**s),
            JsValue::Object(object) => {
                let object = *object;
                if !self.ctx.is_alive(object) {
                    return Err(Error::logic("Script object no longer exists"));
                }
                if let Some(native) = self.any_native_ref(object) {
                    return Ok(native.into_value());
                }
                if self.ctx.is_callable(object) {
                    let function = JsFunction::register(self, object);
                    return Ok(Value::Function(Rc::new(function)));
                }
                if depth >= self.state.marshal.max_depth {
                    return Err(Error::argument(format!(
                        "Script value nesting exceeds the maximum depth of {}",
                        self.state.marshal.max_depth
                    )));
                }
                self.copy_container(object, depth + 1)?
            }
        };
        Ok(value)
    }

    fn copy_container(&self, object: Handle, depth: usize) -> Result<Value> {
        if let Some(items) = self.ctx.array_elements(object) {
            let array = items
                .iter()
                .map(|item| self.to_native_at(item, depth))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::from(array));
        }
        let target = JsValue::Object(object);
        let keys = self
            .ctx
            .keys(&target)
            .map_err(|thrown| self.error_from_thrown(&thrown))?;
        let map = Map::new();
        for key in keys {
            let item = self
                .ctx
                .get(&target, &key)
                .map_err(|thrown| self.error_from_thrown(&thrown))?;
            map.set(key, self.to_native_at(&item, depth)?);
        }
        Ok(Value::Map(map))
    }
}

pub(crate) fn native_ref(ctx: &JsContext, handle: Handle, kind: WrapperKind) -> Option<NativeRef> {
    let marker = ctx.internal_field::<WrapperKind>(handle, KIND_FIELD)?;
    if marker != kind {
        return None;
    }
    ctx.internal_field::<NativeRef>(handle, PAYLOAD_FIELD)
}

/// Integral numbers within the safe range become integers. Negative zero
/// stays a Float.
fn number_to_value(n: f64) -> Value {
    let negative_zero = n == 0.0 && n.is_sign_negative();
    if n.is_finite()
        && n.fract() == 0.0
        && n.abs() <= MAX_SAFE_INTEGER as f64
        && !negative_zero
    {
        Value::Integer(n as i64)
    } else {
        Value::Float(n)
    }
}

fn integer_to_js(i: i64) -> JsValue {
    if i.unsigned_abs() <= MAX_SAFE_INTEGER {
        JsValue::Number(i as f64)
    } else {
        JsValue::BigInt(i)
    }
}

impl RuntimeAdapter for JsBridge {
    type Handle = JsValue;

    fn wrap_object(&self, object: Rc<dyn ObjectBridge>) -> JsValue {
        let Capabilities { indexed, .. } = object.capabilities();
        let templates = self.templates();
        let template = if indexed {
            templates.indexed_object
        } else {
            templates.object
        };
        self.wrap(template, NativeRef::Object(object))
    }

    fn unwrap_object(&self, handle: &JsValue) -> Option<Rc<dyn ObjectBridge>> {
        self.unwrap(handle, WrapperKind::Object)?.as_object().cloned()
    }

    fn wrap_array(&self, array: Array) -> JsValue {
        self.wrap(self.templates().array, NativeRef::Array(array))
    }

    fn unwrap_array(&self, handle: &JsValue) -> Option<Array> {
        self.unwrap(handle, WrapperKind::Array)?.as_array().cloned()
    }

    fn wrap_map(&self, map: Map) -> JsValue {
        self.wrap(self.templates().map, NativeRef::Map(map))
    }

    fn wrap_map_ref(&self, map: WeakMap) -> JsValue {
        if !map.is_alive() {
            return JsValue::Null;
        }
        self.wrap(self.templates().map, NativeRef::MapRef(map))
    }

    fn unwrap_map(&self, handle: &JsValue) -> Option<Map> {
        self.unwrap(handle, WrapperKind::Map)?.map()
    }

    fn wrap_function(&self, function: Rc<dyn FunctionBase>) -> JsValue {
        self.wrap(self.templates().function, NativeRef::Function(function))
    }

    fn unwrap_function(&self, handle: &JsValue) -> Option<Rc<dyn FunctionBase>> {
        self.unwrap(handle, WrapperKind::Function)?
            .as_function()
            .cloned()
    }

    fn to_foreign(&self, value: &Value) -> JsValue {
        match value {
            Value::Undefined => JsValue::Undefined,
            Value::Null => JsValue::Null,
            Value::Bool(b) => JsValue::Bool(*b),
            Value::Integer(i) => integer_to_js(*i),
            Value::Float(f) => JsValue::Number(*f),
            Value::String(s) => JsValue::string(s),
            Value::Object(object) => self.wrap_object(object.clone()),
            Value::Array(array) => self.wrap_array(array.clone()),
            Value::Map(map) => self.wrap_map(map.clone()),
            Value::MapRef(map) => self.wrap_map_ref(map.clone()),
            Value::Function(function) => self.wrap_function(function.clone()),
        }
    }

    fn to_native(&self, handle: &JsValue) -> Result<Value> {
        self.to_native_at(handle, 0)
    }
}
