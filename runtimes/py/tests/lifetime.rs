//! Ownership across the two heaps: wrappers keep natives alive until their
//! last Python reference is dropped, and natives never keep Python callables
//! alive.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use shellbridge_core::{
    Error, Value, ValueType,
    bridge::{FunctionBase, NativeObject, ObjectBridge, ObjectBuilder, Param},
    runtime::RuntimeAdapter,
};
use shellbridge_py::{PyBridge, PyErr, PyInterpreter};

fn session() -> Rc<dyn ObjectBridge> {
    ObjectBuilder::new("Session", ())
        .method("close", [], |_, _| Ok(Value::Undefined))
        .build()
}

#[test]
fn test_wrappers_release_their_native_once() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);
    let session = session();

    let first = bridge.to_foreign(&Value::Object(session.clone()));
    let second = bridge.to_foreign(&Value::Object(session.clone()));
    assert_eq!(Rc::strong_count(&session), 3);

    let alias = first.clone();
    drop(first);
    assert_eq!(Rc::strong_count(&session), 3);
    drop(alias);
    assert_eq!(Rc::strong_count(&session), 2);
    drop(second);
    assert_eq!(Rc::strong_count(&session), 1);
    assert_eq!(interp.live_objects(), 0);
}

#[test]
fn test_containers_release_nested_wrappers() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);
    let session = session();

    let wrapper = bridge.to_foreign(&Value::Object(session.clone()));
    let list = interp.list(vec![wrapper]);
    assert_eq!(Rc::strong_count(&session), 2);
    drop(list);
    assert_eq!(Rc::strong_count(&session), 1);
}

#[test]
fn test_globals_keep_their_native() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);
    let session = session();

    bridge.set_global("session", &Value::Object(session.clone()));
    assert_eq!(Rc::strong_count(&session), 2);

    let held = bridge.get_global("session").unwrap();
    assert!(held.as_object_bridge().unwrap().equals(&*session));
    drop(held);

    assert!(interp.del_global("session"));
    assert_eq!(Rc::strong_count(&session), 1);
}

#[test]
fn test_interpreter_teardown_releases_natives() {
    let session = session();
    {
        let interp = PyInterpreter::new();
        let bridge = PyBridge::new(&interp);
        bridge.set_global("session", &Value::Object(session.clone()));
        assert_eq!(Rc::strong_count(&session), 2);
    }
    assert_eq!(Rc::strong_count(&session), 1);
}

#[test]
fn test_dropped_python_callable_is_gone() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);

    let handle = interp.function("greet", |interp, args| {
        let name = args
            .first()
            .and_then(|arg| interp.as_str(arg))
            .ok_or_else(|| PyErr::type_error("greet() expects a str"))?;
        Ok(interp.str(&format!("hello {}", name)))
    });
    let greet = bridge.to_native(&handle).unwrap().as_function().unwrap();
    assert_eq!(greet.name(), "greet");
    assert_eq!(bridge.callable_count(), 1);
    assert_eq!(
        greet.invoke(&[Value::from("ann")]).unwrap(),
        Value::from("hello ann")
    );
    assert_eq!(
        greet.invoke(&[Value::Integer(1)]).unwrap_err(),
        Error::scripting("TypeError: greet() expects a str")
    );

    drop(handle);
    let err = greet.invoke(&[]).unwrap_err();
    assert_eq!(err, Error::CallableGone("greet".into()));
    assert_eq!(err.to_string(), "Callable 'greet' no longer exists");

    drop(greet);
    assert_eq!(bridge.callable_count(), 0);
}

#[test]
fn test_callable_outlives_its_interpreter() {
    let greet = {
        let interp = PyInterpreter::new();
        let bridge = PyBridge::new(&interp);
        let greet = interp.function("greet", |interp, _| Ok(interp.none()));
        bridge.to_native(&greet).unwrap()
    };
    let err = greet.as_function().unwrap().invoke(&[]).unwrap_err();
    assert_eq!(err, Error::CallableGone("greet".into()));
}

#[derive(Default)]
struct Listeners {
    callbacks: RefCell<Vec<Rc<dyn FunctionBase>>>,
}

fn emitter() -> Rc<NativeObject<Listeners>> {
    ObjectBuilder::new("Emitter", Listeners::default())
        .method("on", [Param::new("callback", ValueType::Function)], |this, args| {
            let callback = args[0].as_function()?;
            this.state().callbacks.borrow_mut().push(callback);
            Ok(Value::Undefined)
        })
        .build()
}

fn emit(emitter: &NativeObject<Listeners>, value: Value) -> Vec<Result<Value, Error>> {
    let callbacks = emitter.state().callbacks.borrow().clone();
    callbacks
        .iter()
        .map(|callback| callback.invoke(std::slice::from_ref(&value)))
        .collect()
}

#[test]
fn test_native_listener_does_not_keep_python_callback_alive() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);
    let emitter = emitter();
    bridge.set_global("emitter", &Value::Object(emitter.clone()));

    let handler = interp.function("handler", |_, args| {
        args.first()
            .cloned()
            .ok_or_else(|| PyErr::type_error("handler() expects an argument"))
    });
    let target = interp.get_global("emitter").unwrap();
    interp
        .call_method(&target, "on", &[handler.clone()])
        .unwrap();
    assert_eq!(interp.refcount(&handler), 1);
    assert_eq!(emit(&emitter, Value::from(7)), vec![Ok(Value::from(7))]);

    drop(handler);
    assert_eq!(
        emit(&emitter, Value::from(7)),
        vec![Err(Error::CallableGone("handler".into()))]
    );
}

#[test]
fn test_python_callables_compare_by_target() {
    let interp = PyInterpreter::new();
    let bridge = PyBridge::new(&interp);
    let handle = interp.function("f", |interp, _| Ok(interp.none()));
    let other = interp.function("f", |interp, _| Ok(interp.none()));

    let a = bridge.to_native(&handle).unwrap().as_function().unwrap();
    let b = bridge.to_native(&handle).unwrap().as_function().unwrap();
    let c = bridge.to_native(&other).unwrap().as_function().unwrap();
    assert!(a.equals(&*b));
    assert!(!a.equals(&*c));
    assert_eq!(bridge.callable_count(), 3);
}
