//! Exposes native values to the Python interpreter and back.
//!
//! Objects, arrays, maps and functions become instances of four extension
//! types whose payload is the [`NativeRef`] they wrap (strong except for
//! `MapRef`). The types' dealloc slot releases that reference when the
//! instance's last reference is dropped. Scalars are converted by value and
//! plain lists/dicts are copied.

mod errors;
mod function;
mod slots;


use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;
use once_cell::unsync::OnceCell;
use shellbridge_core::{
    Array, Error, Map, MarshalOptions, Result, Value, WeakMap,
    bridge::{FunctionBase, ObjectBridge},
    runtime::{NativeRef, RuntimeAdapter, WrapperKind},
};

use crate::interp::{PyErr, PyInterpreter, PyKind, PyRef, PyType, PyWeak, TypeId};

pub use function::PyFunction;

struct Types {
    object: TypeId,
    list: TypeId,
    dict: TypeId,
    function: TypeId,
}

impl Types {
    fn register(interp: &PyInterpreter) -> Self {
        Self {
            object: interp.register_type(PyType {
                getattr: Some(slots::object_getattr),
                setattr: Some(slots::object_setattr),
                dir: Some(slots::object_dir),
                len: Some(slots::object_len),
                getitem: Some(slots::object_getitem),
                setitem: Some(slots::object_setitem),
                call: Some(slots::object_call),
                dealloc: Some(slots::release),
                ..PyType::new("NativeObject")
            }),
            list: interp.register_type(PyType {
                getattr: Some(slots::list_getattr),
                dir: Some(slots::list_dir),
                len: Some(slots::list_len),
                getitem: Some(slots::list_getitem),
                setitem: Some(slots::list_setitem),
                dealloc: Some(slots::release),
                ..PyType::new("NativeList")
            }),
            dict: interp.register_type(PyType {
                getattr: Some(slots::dict_getattr),
                dir: Some(slots::dict_dir),
                len: Some(slots::dict_len),
                getitem: Some(slots::dict_getitem),
                setitem: Some(slots::dict_setitem),
                dealloc: Some(slots::release),
                ..PyType::new("NativeDict")
            }),
            function: interp.register_type(PyType {
                getattr: Some(slots::function_getattr),
                dir: Some(slots::function_dir),
                call: Some(slots::function_call),
                dealloc: Some(slots::release),
                ..PyType::new("NativeFunction")
            }),
        }
    }
}

/// Per-interpreter state, stored as the interpreter's embedder data.
pub(crate) struct BridgeState {
    types: OnceCell<Types>,
    /// Python callables referenced from native code, by key.
    callables: RefCell<HashMap<u64, PyWeak>>,
    next_callable: Cell<u64>,
    marshal: MarshalOptions,
}

impl BridgeState {
    pub(crate) fn register_callable(&self, callable: PyWeak) -> u64 {
        let key = self.next_callable.get();
        self.next_callable.set(key + 1);
        self.callables.borrow_mut().insert(key, callable);
        key
    }

    pub(crate) fn callable(&self, key: u64) -> Option<PyWeak> {
        self.callables.borrow().get(&key).cloned()
    }

    pub(crate) fn forget_callable(&self, key: u64) -> bool {
        self.callables.borrow_mut().remove(&key).is_some()
    }
}

/// [`RuntimeAdapter`] for a [`PyInterpreter`].
///
/// Every bridge over the same interpreter shares one state.
#[derive(Clone)]
pub struct PyBridge {
    interp: PyInterpreter,
    state: Rc<BridgeState>,
}

impl PyBridge {
    pub fn new(interp: &PyInterpreter) -> Self {
        let state = match interp.embedder_data::<BridgeState>() {
            Some(state) => state,
            None => {
                let state = Rc::new(BridgeState {
                    types: OnceCell::new(),
                    callables: RefCell::new(HashMap::new()),
                    next_callable: Cell::new(0),
                    marshal: interp.options().marshal,
                });
                interp.set_embedder_data(state.clone());
                state
            }
        };
        Self {
            interp: interp.clone(),
            state,
        }
    }

    pub fn interpreter(&self) -> &PyInterpreter {
        &self.interp
    }

    pub(crate) fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Number of Python callables currently referenced from native code.
    pub fn callable_count(&self) -> usize {
        self.state.callables.borrow().len()
    }

    fn types(&self) -> &Types {
        self.state
            .types
            .get_or_init(|| Types::register(&self.interp))
    }

    pub fn set_global(&self, name: &str, value: &Value) {
        self.interp.set_global(name, self.to_foreign(value));
    }

    pub fn get_global(&self, name: &str) -> Result<Value> {
        let value = self
            .interp
            .get_global(name)
            .map_err(|err| self.error_from_exception(&err))?;
        self.to_native(&value)
    }

    fn wrap(&self, type_id: TypeId, native: NativeRef) -> PyRef {
        self.interp.new_instance(type_id, Box::new(native))
    }

    fn unwrap(&self, handle: &PyRef, kind: WrapperKind) -> Option<NativeRef> {
        self.interp
            .payload::<NativeRef>(handle)
            .filter(|native| native.kind() == kind)
    }

    /// The exception that reports `error` to Python code.
    pub fn raise(&self, error: &Error) -> PyErr {
        errors::raise_native(error)
    }

    /// Converts an exception raised by Python code into a native error.
    pub fn error_from_exception(&self, err: &PyErr) -> Error {
        errors::error_from_exception(err)
    }

    fn to_native_at(&self, handle: &PyRef, depth: usize) -> Result<Value> {
        let interp = &self.interp;
        let value = match interp.kind(handle) {
            PyKind::None => Value::Null,
            PyKind::Bool => Value::Bool(interp.as_bool(handle).unwrap_or_default()),
            PyKind::Int => Value::Integer(interp.as_int(handle).unwrap_or_default()),
            PyKind::Float => Value::Float(interp.as_float(handle).unwrap_or_default()),
            PyKind::Str => Value::from(interp.as_str(handle).as_deref().unwrap_or_default()),
            PyKind::Function => Value::Function(Rc::new(PyFunction::register(self, handle))),
            PyKind::Instance(_) => {
                if let Some(native) = interp.payload::<NativeRef>(handle) {
                    return Ok(native.into_value());
                }
                if interp.is_callable(handle) {
                    return Ok(Value::Function(Rc::new(PyFunction::register(self, handle))));
                }
                return Err(Error::Type(format!(
                    "Cannot convert '{}' object to a native value",
                    interp.type_name(handle)
                )));
            }
            PyKind::List | PyKind::Dict => {
                if depth >= self.state.marshal.max_depth {
                    return Err(Error::argument(format!(
                        "Python value nesting exceeds the maximum depth of {}",
                        self.state.marshal.max_depth
                    )));
                }
                self.copy_container(handle, depth + 1)?
            }
        };
        Ok(value)
    }

    fn copy_container(&self, handle: &PyRef, depth: usize) -> Result<Value> {
        if let Some(items) = self.interp.list_items(handle) {
            let array = items
                .iter()
                .map(|item| self.to_native_at(item, depth))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::from(array));
        }
        let map = Map::new();
        for (key, item) in self.interp.dict_items(handle).unwrap_or_default() {
            map.set(key, self.to_native_at(&item, depth)?);
        }
        Ok(Value::Map(map))
    }
}

impl RuntimeAdapter for PyBridge {
    type Handle = PyRef;

    fn wrap_object(&self, object: Rc<dyn ObjectBridge>) -> PyRef {
        self.wrap(self.types().object, NativeRef::Object(object))
    }

    fn unwrap_object(&self, handle: &PyRef) -> Option<Rc<dyn ObjectBridge>> {
        self.unwrap(handle, WrapperKind::Object)?.as_object().cloned()
    }

    fn wrap_array(&self, array: Array) -> PyRef {
        self.wrap(self.types().list, NativeRef::Array(array))
    }

    fn unwrap_array(&self, handle: &PyRef) -> Option<Array> {
        self.unwrap(handle, WrapperKind::Array)?.as_array().cloned()
    }

    fn wrap_map(&self, map: Map) -> PyRef {
        self.wrap(self.types().dict, NativeRef::Map(map))
    }

    fn wrap_map_ref(&self, map: WeakMap) -> PyRef {
        if !map.is_alive() {
            return self.interp.none();
        }
        self.wrap(self.types().dict, NativeRef::MapRef(map))
    }

    fn unwrap_map(&self, handle: &PyRef) -> Option<Map> {
        self.unwrap(handle, WrapperKind::Map)?.map()
    }

    fn wrap_function(&self, function: Rc<dyn FunctionBase>) -> PyRef {
        self.wrap(self.types().function, NativeRef::Function(function))
    }

    fn unwrap_function(&self, handle: &PyRef) -> Option<Rc<dyn FunctionBase>> {
        self.unwrap(handle, WrapperKind::Function)?
            .as_function()
            .cloned()
    }

    fn to_foreign(&self, value: &Value) -> PyRef {
        let interp = &self.interp;
        match value {
            Value::Undefined | Value::Null => interp.none(),
            Value::Bool(b) => interp.bool(*b),
            Value::Integer(i) => interp.int(*i),
            Value::Float(f) => interp.float(*f),
            Value::String(s) => interp.str(s),
            Value::Object(object) => self.wrap_object(object.clone()),
            Value::Array(array) => self.wrap_array(array.clone()),
            Value::Map(map) => self.wrap_map(map.clone()),
            Value::MapRef(map) => self.wrap_map_ref(map.clone()),
            Value::Function(function) => self.wrap_function(function.clone()),
        }
    }

    fn to_native(&self, handle: &PyRef) -> Result<Value> {
        self.to_native_at(handle, 0)
    }
}
