use pretty_assertions::assert_eq;
use shellbridge_core::{
    Error, ErrorKind, MarshalOptions, Value, ValueType, runtime::RuntimeAdapter,
};

use super::*;
use crate::options::JsContextOptions;

fn bridge() -> JsBridge {
    JsBridge::new(&JsContext::new())
}

#[test]
fn test_scalars_to_foreign() {
    let bridge = bridge();
    assert_eq!(bridge.to_foreign(&Value::Undefined), JsValue::Undefined);
    assert_eq!(bridge.to_foreign(&Value::Null), JsValue::Null);
    assert_eq!(bridge.to_foreign(&Value::from(true)), JsValue::Bool(true));
    assert_eq!(bridge.to_foreign(&Value::from(5)), JsValue::Number(5.0));
    assert_eq!(bridge.to_foreign(&Value::from(0.5)), JsValue::Number(0.5));
    assert_eq!(bridge.to_foreign(&Value::from("s")), JsValue::string("s"));
    assert_eq!(
        bridge.to_foreign(&Value::Integer(1 << 60)),
        JsValue::BigInt(1 << 60)
    );
    assert_eq!(
        bridge.to_foreign(&Value::Integer(-(MAX_SAFE_INTEGER as i64))),
        JsValue::Number(-(MAX_SAFE_INTEGER as f64))
    );
}

#[test]
fn test_scalars_to_native() {
    let bridge = bridge();
    assert_eq!(bridge.to_native(&JsValue::Number(3.0)).unwrap(), Value::Integer(3));
    assert_eq!(bridge.to_native(&JsValue::Number(3.5)).unwrap(), Value::Float(3.5));
    let negative_zero = bridge.to_native(&JsValue::Number(-0.0)).unwrap();
    assert!(negative_zero.as_double().unwrap().is_sign_negative());
    assert_eq!(
        bridge.to_native(&JsValue::Number(2f64.powi(60))).unwrap(),
        Value::Float(2f64.powi(60))
    );
    assert_eq!(
        bridge.to_native(&JsValue::Number(f64::INFINITY)).unwrap(),
        Value::Float(f64::INFINITY)
    );
    assert_eq!(bridge.to_native(&JsValue::BigInt(-7)).unwrap(), Value::Integer(-7));
    assert_eq!(bridge.to_native(&JsValue::string("x")).unwrap(), Value::from("x"));
}

#[test]
fn test_plain_script_containers_are_copied() {
    let bridge = bridge();
    let ctx = bridge.context();
    let inner = JsValue::Object(ctx.new_object());
    ctx.set(&inner, "x", JsValue::Bool(true)).unwrap();
    let array = JsValue::Object(ctx.new_array(vec![
        JsValue::Number(1.0),
        JsValue::string("a"),
        inner,
    ]));

    let value = bridge.to_native(&array).unwrap();
    assert_eq!(value, Value::parse(r#"[1, "a", {"x": true}]"#).unwrap());

    // A copy: later script writes are not seen.
    ctx.set_index(&array, 0, JsValue::Null).unwrap();
    assert_eq!(value.as_array().unwrap().get(0), Some(Value::Integer(1)));
}

#[test]
fn test_copy_depth_is_limited() {
    let ctx = JsContext::with_options(JsContextOptions {
        marshal: MarshalOptions { max_depth: 2 },
        ..JsContextOptions::default()
    });
    let bridge = JsBridge::new(&ctx);
    let leaf = JsValue::Object(ctx.new_array(vec![JsValue::Number(1.0)]));
    let middle = JsValue::Object(ctx.new_array(vec![leaf]));
    let outer = JsValue::Object(ctx.new_array(vec![middle.clone()]));

    assert!(bridge.to_native(&middle).is_ok());
    let err = bridge.to_native(&outer).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

#[test]
fn test_cyclic_script_objects_are_rejected() {
    let bridge = bridge();
    let ctx = bridge.context();
    let object = JsValue::Object(ctx.new_object());
    ctx.set(&object, "self", object.clone()).unwrap();
    let err = bridge.to_native(&object).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

#[test]
fn test_native_errors_survive_a_script_round_trip() {
    let bridge = bridge();
    let ctx = bridge.context();

    let thrown = bridge.throw(&Error::argument("bad"));
    assert_eq!(ctx.get(&thrown, "name").unwrap(), JsValue::string("ArgumentError"));
    assert_eq!(ctx.get(&thrown, "type").unwrap(), JsValue::string("ArgumentError"));
    assert_eq!(ctx.get(&thrown, "message").unwrap(), JsValue::string("bad"));
    assert_eq!(ctx.get(&thrown, "cause").unwrap(), JsValue::Null);
    assert_eq!(bridge.error_from_thrown(&thrown), Error::argument("bad"));

    let error = Error::Scripting {
        message: "Access denied".into(),
        code: Some(1045),
        cause: Some(Box::new(Error::logic("inner"))),
    };
    let thrown = bridge.throw(&error);
    assert_eq!(ctx.get(&thrown, "code").unwrap(), JsValue::Number(1045.0));
    assert_eq!(bridge.error_from_thrown(&thrown), error);
}

#[test]
fn test_script_errors_become_scripting_errors() {
    let bridge = bridge();
    let ctx = bridge.context();

    let thrown = JsValue::Object(ctx.new_error("RangeError", "too far"));
    assert_eq!(
        bridge.error_from_thrown(&thrown),
        Error::scripting("RangeError: too far")
    );
    assert_eq!(
        bridge.error_from_thrown(&JsValue::string("oops")),
        Error::scripting("Uncaught oops")
    );
    let err = bridge.error_from_thrown(&JsValue::Object(ctx.new_object()));
    assert_eq!(err.kind(), ErrorKind::Scripting);
}

#[test]
fn test_bridges_share_state() {
    let ctx = JsContext::new();
    let first = JsBridge::new(&ctx);
    let second = JsBridge::new(&ctx);
    let array = shellbridge_core::Array::new();
    let handle = first.to_foreign(&Value::Array(array.clone()));
    assert!(second.unwrap_array(&handle).is_some_and(|a| a.ptr_eq(&array)));
    assert!(second.unwrap_map(&handle).is_none());
    assert_eq!(
        second.to_native(&handle).unwrap().value_type(),
        ValueType::Array
    );
}
