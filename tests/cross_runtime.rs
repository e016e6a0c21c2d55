//! One native value shared by both runtimes at once.

use std::cell::Cell;

use pretty_assertions::assert_eq;
use shellbridge::js::{JsBridge, JsContext, JsValue};
use shellbridge::py::{PyBridge, PyInterpreter};
use shellbridge::runtime::RuntimeAdapter;
use shellbridge::{Error, Value, ValueType, bridge::ObjectBuilder, bridge::Param, bridge_fn};

#[bridge_fn]
fn upper(s: String) -> String {
    s.to_uppercase()
}

#[test]
fn test_same_function_in_both_runtimes() {
    let upper = Upper::new().into_value();

    let ctx = JsContext::new();
    let js = JsBridge::new(&ctx);
    js.set_global("upper", &upper);
    let js_upper = ctx.get_global("upper");
    let result = ctx
        .call(&js_upper, &JsValue::Undefined, &[JsValue::string("hello")])
        .unwrap();
    assert_eq!(result, JsValue::string("HELLO"));

    let interp = PyInterpreter::new();
    let py = PyBridge::new(&interp);
    py.set_global("upper", &upper);
    let py_upper = interp.get_global("upper").unwrap();
    let result = interp.call(&py_upper, &[interp.str("hello")]).unwrap();
    assert_eq!(interp.as_str(&result).as_deref(), Some("HELLO"));

    let thrown = ctx
        .call(&js_upper, &JsValue::Undefined, &[JsValue::Null])
        .unwrap_err();
    let raised = interp.call(&py_upper, &[interp.none()]).unwrap_err();
    assert_eq!(js.error_from_thrown(&thrown), py.error_from_exception(&raised));
}

#[test]
fn test_object_state_is_shared() {
    let counter = ObjectBuilder::new("Counter", Cell::new(0))
        .method("add", [Param::new("n", ValueType::Integer)], |this, args| {
            let count = this.state();
            count.set(count.get() + args[0].as_int()?);
            Ok(Value::Integer(count.get()))
        })
        .build();
    let value = Value::Object(counter.clone());

    let ctx = JsContext::new();
    let js = JsBridge::new(&ctx);
    let js_counter = js.to_foreign(&value);
    ctx.call_method(&js_counter, "add", &[JsValue::Number(2.0)])
        .unwrap();

    let interp = PyInterpreter::new();
    let py = PyBridge::new(&interp);
    let py_counter = py.to_foreign(&value);
    let total = interp
        .call_method(&py_counter, "add", &[interp.int(3)])
        .unwrap();
    assert_eq!(interp.as_int(&total), Some(5));
    assert_eq!(counter.state().get(), 5);
}

#[test]
fn test_script_callable_passed_between_runtimes() {
    let ctx = JsContext::new();
    let js = JsBridge::new(&ctx);
    let greet = ctx.new_function("greet", |_, info| {
        Ok(JsValue::string(&format!("hello {}", info.arg(0))))
    });
    let greet = js.to_native(&JsValue::Object(greet)).unwrap();

    let interp = PyInterpreter::new();
    let py = PyBridge::new(&interp);
    py.set_global("greet", &greet);
    let handle = interp.get_global("greet").unwrap();
    let result = interp.call(&handle, &[interp.str("ann")]).unwrap();
    assert_eq!(interp.as_str(&result).as_deref(), Some("hello ann"));

    drop(js);
    drop(ctx);
    let err = interp.call(&handle, &[]).unwrap_err();
    assert_eq!(
        py.error_from_exception(&err),
        Error::scripting("Callable 'greet' no longer exists")
    );
}
