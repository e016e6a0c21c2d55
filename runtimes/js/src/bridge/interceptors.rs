//! Template interceptors for native wrappers.
//!
//! Native errors are thrown as error objects; see [`super::errors`].

use std::rc::Rc;

use shellbridge_core::{
    Array, Error, Result, Value,
    bridge::{FunctionBase, ObjectBridge},
    runtime::{NativeRef, RuntimeAdapter, WrapperKind},
};

use super::{JsBridge, native_ref};
use crate::engine::{CallInfo, Handle, JsContext, JsResult, JsValue};

fn payload(ctx: &JsContext, handle: Handle, kind: WrapperKind) -> JsResult<NativeRef> {
    native_ref(ctx, handle, kind).ok_or_else(|| ctx.type_error("Illegal invocation"))
}

fn object_payload(ctx: &JsContext, handle: Handle) -> JsResult<Rc<dyn ObjectBridge>> {
    payload(ctx, handle, WrapperKind::Object)?
        .as_object()
        .cloned()
        .ok_or_else(|| ctx.type_error("Illegal invocation"))
}

fn native_args(bridge: &JsBridge, args: &[JsValue]) -> JsResult<Vec<Value>> {
    args.iter()
        .map(|arg| bridge.to_native(arg))
        .collect::<Result<Vec<_>>>()
        .map_err(|err| bridge.throw(&err))
}

fn to_native(bridge: &JsBridge, value: &JsValue) -> JsResult<Value> {
    bridge.to_native(value).map_err(|err| bridge.throw(&err))
}

fn to_foreign(bridge: &JsBridge, result: Result<Value>) -> JsResult<JsValue> {
    match result {
        Ok(value) => Ok(bridge.to_foreign(&value)),
        Err(err) => Err(bridge.throw(&err)),
    }
}

// Objects

pub(super) fn object_get(ctx: &JsContext, handle: Handle, name: &str) -> JsResult<Option<JsValue>> {
    let object = object_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    if name == "length" && object.capabilities().indexed {
        let length = object.length().map(|len| Value::Integer(len as i64));
        return to_foreign(&bridge, length).map(Some);
    }
    if !object.has_member(name) {
        return Ok(None);
    }
    to_foreign(&bridge, object.get_member(name)).map(Some)
}

pub(super) fn object_set(
    ctx: &JsContext,
    handle: Handle,
    name: &str,
    value: JsValue,
) -> JsResult<bool> {
    let object = object_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    let value = to_native(&bridge, &value)?;
    object
        .set_member(name, value)
        .map_err(|err| bridge.throw(&err))?;
    Ok(true)
}

pub(super) fn object_keys(ctx: &JsContext, handle: Handle) -> JsResult<Vec<String>> {
    Ok(object_payload(ctx, handle)?.get_members())
}

pub(super) fn object_get_index(
    ctx: &JsContext,
    handle: Handle,
    index: u32,
) -> JsResult<Option<JsValue>> {
    let object = object_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    to_foreign(&bridge, object.get_member_index(index as usize)).map(Some)
}

pub(super) fn object_set_index(
    ctx: &JsContext,
    handle: Handle,
    index: u32,
    value: JsValue,
) -> JsResult<bool> {
    let object = object_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    let value = to_native(&bridge, &value)?;
    object
        .set_member_index(index as usize, value)
        .map_err(|err| bridge.throw(&err))?;
    Ok(true)
}

pub(super) fn object_call(ctx: &JsContext, info: &CallInfo<'_>) -> JsResult<JsValue> {
    let object = object_payload(ctx, info.callee)?;
    if !object.capabilities().callable {
        return Err(ctx.type_error(&format!("{} is not a function", object.class_name())));
    }
    let bridge = JsBridge::new(ctx);
    let args = native_args(&bridge, info.args)?;
    to_foreign(&bridge, object.call_self(&args))
}

// Arrays

fn array_payload(ctx: &JsContext, handle: Handle) -> JsResult<Array> {
    payload(ctx, handle, WrapperKind::Array)?
        .as_array()
        .cloned()
        .ok_or_else(|| ctx.type_error("Illegal invocation"))
}

pub(super) fn array_get(ctx: &JsContext, handle: Handle, name: &str) -> JsResult<Option<JsValue>> {
    if name != "length" {
        return Ok(None);
    }
    let array = array_payload(ctx, handle)?;
    Ok(Some(JsValue::Number(array.len() as f64)))
}

pub(super) fn array_set(ctx: &JsContext, _: Handle, name: &str, _: JsValue) -> JsResult<bool> {
    if name == "length" {
        return Err(ctx.type_error("Cannot assign to read only property 'length'"));
    }
    Ok(false)
}

pub(super) fn array_get_index(
    ctx: &JsContext,
    handle: Handle,
    index: u32,
) -> JsResult<Option<JsValue>> {
    let array = array_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    Ok(Some(match array.get(index as usize) {
        Some(item) => bridge.to_foreign(&item),
        None => JsValue::Undefined,
    }))
}

pub(super) fn array_set_index(
    ctx: &JsContext,
    handle: Handle,
    index: u32,
    value: JsValue,
) -> JsResult<bool> {
    let array = array_payload(ctx, handle)?;
    let bridge = JsBridge::new(ctx);
    let value = to_native(&bridge, &value)?;
    array
        .set(index as usize, value)
        .map_err(|err| bridge.throw(&err))?;
    Ok(true)
}

pub(super) fn array_keys(ctx: &JsContext, handle: Handle) -> JsResult<Vec<String>> {
    let array = array_payload(ctx, handle)?;
    Ok((0..array.len()).map(|index| index.to_string()).collect())
}

// Maps

pub(super) fn map_get(ctx: &JsContext, handle: Handle, name: &str) -> JsResult<Option<JsValue>> {
    let Some(map) = payload(ctx, handle, WrapperKind::Map)?.map() else {
        return Ok(None);
    };
    let bridge = JsBridge::new(ctx);
    Ok(map.get(name).map(|item| bridge.to_foreign(&item)))
}

pub(super) fn map_set(
    ctx: &JsContext,
    handle: Handle,
    name: &str,
    value: JsValue,
) -> JsResult<bool> {
    let bridge = JsBridge::new(ctx);
    let Some(map) = payload(ctx, handle, WrapperKind::Map)?.map() else {
        let err = Error::logic("Referenced map no longer exists");
        return Err(bridge.throw(&err));
    };
    let value = to_native(&bridge, &value)?;
    map.set(name, value);
    Ok(true)
}

pub(super) fn map_keys(ctx: &JsContext, handle: Handle) -> JsResult<Vec<String>> {
    let map = payload(ctx, handle, WrapperKind::Map)?.map();
    Ok(map.map(|map| map.keys()).unwrap_or_default())
}

// Functions

fn function_payload(ctx: &JsContext, handle: Handle) -> JsResult<Rc<dyn FunctionBase>> {
    payload(ctx, handle, WrapperKind::Function)?
        .as_function()
        .cloned()
        .ok_or_else(|| ctx.type_error("Illegal invocation"))
}

pub(super) fn function_get(
    ctx: &JsContext,
    handle: Handle,
    name: &str,
) -> JsResult<Option<JsValue>> {
    if name != "name" {
        return Ok(None);
    }
    let function = function_payload(ctx, handle)?;
    Ok(Some(JsValue::string(function.name())))
}

pub(super) fn function_set(_: &JsContext, _: Handle, _: &str, _: JsValue) -> JsResult<bool> {
    Ok(false)
}

pub(super) fn function_call(ctx: &JsContext, info: &CallInfo<'_>) -> JsResult<JsValue> {
    let function = function_payload(ctx, info.callee)?;
    let bridge = JsBridge::new(ctx);
    let args = native_args(&bridge, info.args)?;
    tracing::trace!(function = function.name(), args = args.len(), "Calling native function");
    to_foreign(&bridge, function.invoke(&args))
}
