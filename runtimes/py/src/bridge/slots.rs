//! Extension type slots for native wrappers.
//!
//! Native errors are raised as exceptions; see [`super::errors`].

use std::any::Any;
use std::rc::Rc;

use shellbridge_core::{
    Array, Error, Map, Result, Value,
    bridge::{FunctionBase, ObjectBridge},
    runtime::{NativeRef, RuntimeAdapter},
};

use super::PyBridge;
use crate::interp::{PyErr, PyInterpreter, PyRef, PyResult, normalize_index};

/// Dealloc slot shared by every wrapper type.
pub(super) fn release(payload: Box<dyn Any>) {
    if let Ok(native) = payload.downcast::<NativeRef>() {
        tracing::trace!(kind = ?native.kind(), "Released native reference of deallocated wrapper");
    }
}

fn payload(interp: &PyInterpreter, obj: &PyRef) -> PyResult<NativeRef> {
    interp.payload::<NativeRef>(obj).ok_or_else(|| {
        PyErr::type_error(format!(
            "descriptor requires a native wrapper, not '{}'",
            interp.type_name(obj)
        ))
    })
}

fn object_payload(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Rc<dyn ObjectBridge>> {
    let native = payload(interp, obj)?;
    native
        .as_object()
        .cloned()
        .ok_or_else(|| PyErr::type_error("expected a native object"))
}

fn native_args(bridge: &PyBridge, args: &[PyRef]) -> PyResult<Vec<Value>> {
    args.iter()
        .map(|arg| bridge.to_native(arg))
        .collect::<Result<Vec<_>>>()
        .map_err(|err| bridge.raise(&err))
}

fn to_native(bridge: &PyBridge, value: &PyRef) -> PyResult<Value> {
    bridge.to_native(value).map_err(|err| bridge.raise(&err))
}

fn to_foreign(bridge: &PyBridge, result: Result<Value>) -> PyResult<PyRef> {
    match result {
        Ok(value) => Ok(bridge.to_foreign(&value)),
        Err(err) => Err(bridge.raise(&err)),
    }
}

/// Resolves an integer subscript against `len`, raising like Python does.
fn subscript(
    interp: &PyInterpreter,
    key: &PyRef,
    len: usize,
    container: &str,
) -> PyResult<Option<usize>> {
    let Some(index) = interp.as_int(key) else {
        return Err(PyErr::type_error(format!(
            "{} indices must be integers, not {}",
            container,
            interp.type_name(key)
        )));
    };
    Ok(normalize_index(index, len))
}

// Objects

pub(super) fn object_getattr(interp: &PyInterpreter, obj: &PyRef, name: &str) -> PyResult<PyRef> {
    let object = object_payload(interp, obj)?;
    let bridge = PyBridge::new(interp);
    to_foreign(&bridge, object.get_member(name))
}

pub(super) fn object_setattr(
    interp: &PyInterpreter,
    obj: &PyRef,
    name: &str,
    value: PyRef,
) -> PyResult<()> {
    let object = object_payload(interp, obj)?;
    let bridge = PyBridge::new(interp);
    let value = to_native(&bridge, &value)?;
    object
        .set_member(name, value)
        .map_err(|err| bridge.raise(&err))
}

pub(super) fn object_dir(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Vec<String>> {
    Ok(object_payload(interp, obj)?.get_members())
}

fn indexed_object(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Rc<dyn ObjectBridge>> {
    let object = object_payload(interp, obj)?;
    if !object.capabilities().indexed {
        return Err(PyErr::type_error(format!(
            "'{}' object is not subscriptable",
            object.class_name()
        )));
    }
    Ok(object)
}

pub(super) fn object_len(interp: &PyInterpreter, obj: &PyRef) -> PyResult<usize> {
    let object = object_payload(interp, obj)?;
    if !object.capabilities().indexed {
        return Err(PyErr::type_error(format!(
            "object of type '{}' has no len()",
            object.class_name()
        )));
    }
    object
        .length()
        .map_err(|err| PyBridge::new(interp).raise(&err))
}

fn object_index(interp: &PyInterpreter, object: &dyn ObjectBridge, key: &PyRef) -> PyResult<usize> {
    let bridge = PyBridge::new(interp);
    let len = object.length().map_err(|err| bridge.raise(&err))?;
    subscript(interp, key, len, object.class_name())?
        .ok_or_else(|| PyErr::index_error(format!("{} index out of range", object.class_name())))
}

pub(super) fn object_getitem(interp: &PyInterpreter, obj: &PyRef, key: &PyRef) -> PyResult<PyRef> {
    let object = indexed_object(interp, obj)?;
    let index = object_index(interp, &*object, key)?;
    let bridge = PyBridge::new(interp);
    to_foreign(&bridge, object.get_member_index(index))
}

pub(super) fn object_setitem(
    interp: &PyInterpreter,
    obj: &PyRef,
    key: &PyRef,
    value: PyRef,
) -> PyResult<()> {
    let object = indexed_object(interp, obj)?;
    let index = object_index(interp, &*object, key)?;
    let bridge = PyBridge::new(interp);
    let value = to_native(&bridge, &value)?;
    object
        .set_member_index(index, value)
        .map_err(|err| bridge.raise(&err))
}

pub(super) fn object_call(interp: &PyInterpreter, obj: &PyRef, args: &[PyRef]) -> PyResult<PyRef> {
    let object = object_payload(interp, obj)?;
    if !object.capabilities().callable {
        return Err(PyErr::type_error(format!(
            "'{}' object is not callable",
            object.class_name()
        )));
    }
    let bridge = PyBridge::new(interp);
    let args = native_args(&bridge, args)?;
    to_foreign(&bridge, object.call_self(&args))
}

// Lists

fn array_payload(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Array> {
    let native = payload(interp, obj)?;
    native
        .as_array()
        .cloned()
        .ok_or_else(|| PyErr::type_error("expected a native list"))
}

pub(super) fn list_getattr(interp: &PyInterpreter, obj: &PyRef, name: &str) -> PyResult<PyRef> {
    let array = array_payload(interp, obj)?;
    if name != "append" {
        return Err(PyErr::attribute_error(format!(
            "'NativeList' object has no attribute '{}'",
            name
        )));
    }
    Ok(interp.function("append", move |interp, args| {
        let [item] = args else {
            return Err(PyErr::type_error(format!(
                "append() takes exactly one argument ({} given)",
                args.len()
            )));
        };
        let bridge = PyBridge::new(interp);
        array.push(to_native(&bridge, item)?);
        Ok(interp.none())
    }))
}

pub(super) fn list_dir(_: &PyInterpreter, _: &PyRef) -> PyResult<Vec<String>> {
    Ok(vec!["append".to_string()])
}

pub(super) fn list_len(interp: &PyInterpreter, obj: &PyRef) -> PyResult<usize> {
    Ok(array_payload(interp, obj)?.len())
}

pub(super) fn list_getitem(interp: &PyInterpreter, obj: &PyRef, key: &PyRef) -> PyResult<PyRef> {
    let array = array_payload(interp, obj)?;
    let item = subscript(interp, key, array.len(), "list")?.and_then(|index| array.get(index));
    match item {
        Some(item) => Ok(PyBridge::new(interp).to_foreign(&item)),
        None => Err(PyErr::index_error("list index out of range")),
    }
}

pub(super) fn list_setitem(
    interp: &PyInterpreter,
    obj: &PyRef,
    key: &PyRef,
    value: PyRef,
) -> PyResult<()> {
    let array = array_payload(interp, obj)?;
    let Some(index) = subscript(interp, key, array.len(), "list")? else {
        return Err(PyErr::index_error("list assignment index out of range"));
    };
    let bridge = PyBridge::new(interp);
    let value = to_native(&bridge, &value)?;
    array.set(index, value).map_err(|err| bridge.raise(&err))
}

// Dicts

fn map_payload(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Map> {
    let native = payload(interp, obj)?;
    native.map().ok_or_else(|| {
        PyBridge::new(interp).raise(&Error::logic("Referenced map no longer exists"))
    })
}

fn dict_key(interp: &PyInterpreter, key: &PyRef) -> PyResult<Rc<str>> {
    interp.as_str(key).ok_or_else(|| {
        PyErr::type_error(format!(
            "dict keys must be str, not {}",
            interp.type_name(key)
        ))
    })
}

/// Keys read as attributes too, so `registry.name` works.
pub(super) fn dict_getattr(interp: &PyInterpreter, obj: &PyRef, name: &str) -> PyResult<PyRef> {
    let map = map_payload(interp, obj)?;
    match map.get(name) {
        Some(item) => Ok(PyBridge::new(interp).to_foreign(&item)),
        None => Err(PyErr::attribute_error(format!(
            "'NativeDict' object has no attribute '{}'",
            name
        ))),
    }
}

pub(super) fn dict_dir(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Vec<String>> {
    Ok(map_payload(interp, obj)?.keys())
}

pub(super) fn dict_len(interp: &PyInterpreter, obj: &PyRef) -> PyResult<usize> {
    Ok(map_payload(interp, obj)?.len())
}

pub(super) fn dict_getitem(interp: &PyInterpreter, obj: &PyRef, key: &PyRef) -> PyResult<PyRef> {
    let map = map_payload(interp, obj)?;
    let key = dict_key(interp, key)?;
    match map.get(&key) {
        Some(item) => Ok(PyBridge::new(interp).to_foreign(&item)),
        None => Err(PyErr::key_error(&key)),
    }
}

pub(super) fn dict_setitem(
    interp: &PyInterpreter,
    obj: &PyRef,
    key: &PyRef,
    value: PyRef,
) -> PyResult<()> {
    let map = map_payload(interp, obj)?;
    let key = dict_key(interp, key)?;
    let bridge = PyBridge::new(interp);
    let value = to_native(&bridge, &value)?;
    map.set(&*key, value);
    Ok(())
}

// Functions

fn function_payload(interp: &PyInterpreter, obj: &PyRef) -> PyResult<Rc<dyn FunctionBase>> {
    let native = payload(interp, obj)?;
    native
        .as_function()
        .cloned()
        .ok_or_else(|| PyErr::type_error("expected a native function"))
}

pub(super) fn function_getattr(interp: &PyInterpreter, obj: &PyRef, name: &str) -> PyResult<PyRef> {
    let function = function_payload(interp, obj)?;
    if name != "__name__" {
        return Err(PyErr::attribute_error(format!(
            "'NativeFunction' object has no attribute '{}'",
            name
        )));
    }
    Ok(interp.str(function.name()))
}

pub(super) fn function_dir(_: &PyInterpreter, _: &PyRef) -> PyResult<Vec<String>> {
    Ok(vec!["__name__".to_string()])
}

pub(super) fn function_call(
    interp: &PyInterpreter,
    obj: &PyRef,
    args: &[PyRef],
) -> PyResult<PyRef> {
    let function = function_payload(interp, obj)?;
    let bridge = PyBridge::new(interp);
    let args = native_args(&bridge, args)?;
    tracing::trace!(function = function.name(), args = args.len(), "Calling native function");
    to_foreign(&bridge, function.invoke(&args))
}
