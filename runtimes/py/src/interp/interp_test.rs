use std::cell::Cell;
use std::rc::Rc;

use expect_test::expect;
use pretty_assertions::assert_eq;

use super::*;
use crate::test_utils::init_test_logging;

#[test]
fn test_refcounts_follow_owners() {
    let interp = PyInterpreter::new();
    let item = interp.str("a");
    assert_eq!(interp.refcount(&item), 1);

    let list = interp.list(vec![item.clone()]);
    assert_eq!(interp.refcount(&item), 2);
    assert_eq!(interp.live_objects(), 2);

    drop(list);
    assert_eq!(interp.refcount(&item), 1);
    drop(item);
    assert_eq!(interp.live_objects(), 0);
}

#[test]
fn test_weak_references() {
    let interp = PyInterpreter::new();
    let value = interp.int(7);
    let weak = interp.downgrade(&value);
    assert!(weak.is_alive());
    let strong = interp.upgrade(&weak).unwrap();
    assert!(strong.is(&value));
    assert_eq!(interp.refcount(&value), 2);

    drop(strong);
    drop(value);
    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());

    // The freed slot is reused without resurrecting the weak reference.
    let _other = interp.int(8);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_lists_and_dicts() {
    let interp = PyInterpreter::new();
    let list = interp.list(vec![interp.int(1), interp.int(2)]);
    assert_eq!(interp.len(&list).unwrap(), 2);
    let last = interp.getitem(&list, &interp.int(-1)).unwrap();
    assert_eq!(interp.as_int(&last), Some(2));

    interp.setitem(&list, &interp.int(0), interp.str("x")).unwrap();
    interp.call_method(&list, "append", &[interp.none()]).unwrap();
    assert_eq!(interp.len(&list).unwrap(), 3);
    let first = interp.getitem(&list, &interp.int(0)).unwrap();
    assert_eq!(interp.as_str(&first).as_deref(), Some("x"));

    let err = interp.getitem(&list, &interp.int(3)).unwrap_err();
    assert_eq!(err, PyErr::index_error("list index out of range"));

    let dict = interp.dict([("k".to_string(), interp.bool(true))]);
    let value = interp.getitem(&dict, &interp.str("k")).unwrap();
    assert_eq!(interp.as_bool(&value), Some(true));
    let err = interp.getitem(&dict, &interp.str("missing")).unwrap_err();
    expect![[r#"KeyError: 'missing'"#]].assert_eq(&err.to_string());
    let err = interp.getitem(&dict, &interp.int(1)).unwrap_err();
    expect![[r#"TypeError: dict keys must be str, not int"#]].assert_eq(&err.to_string());
}

#[test]
fn test_builtin_protocol_errors() {
    let interp = PyInterpreter::new();
    let number = interp.int(1);
    let errors = [
        interp.len(&number).unwrap_err(),
        interp.getitem(&number, &number).unwrap_err(),
        interp.call(&number, &[]).unwrap_err(),
        interp.getattr(&number, "real").unwrap_err(),
    ];
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    expect![[r#"
        [
            "TypeError: object of type 'int' has no len()",
            "TypeError: 'int' object is not subscriptable",
            "TypeError: 'int' object is not callable",
            "AttributeError: 'int' object has no attribute 'real'",
        ]
    "#]]
    .assert_debug_eq(&messages);
}

#[test]
fn test_functions() {
    let interp = PyInterpreter::new();
    let double = interp.function("double", |interp, args| {
        let value = args
            .first()
            .and_then(|arg| interp.as_int(arg))
            .ok_or_else(|| PyErr::type_error("double() expects an int"))?;
        Ok(interp.int(value * 2))
    });
    let result = interp.call(&double, &[interp.int(21)]).unwrap();
    assert_eq!(interp.as_int(&result), Some(42));
    let name = interp.getattr(&double, "__name__").unwrap();
    assert_eq!(interp.as_str(&name).as_deref(), Some("double"));
    assert!(interp.call(&double, &[]).is_err());
    assert!(interp.is_callable(&double));
}

thread_local! {
    static DEALLOCATED: Cell<usize> = const { Cell::new(0) };
}

fn count_dealloc(payload: Box<dyn Any>) {
    assert!(payload.downcast::<Rc<String>>().is_ok());
    DEALLOCATED.with(|count| count.set(count.get() + 1));
}

fn holder_getattr(interp: &PyInterpreter, obj: &PyRef, name: &str) -> PyResult<PyRef> {
    match (name, interp.payload::<Rc<String>>(obj)) {
        ("value", Some(value)) => Ok(interp.str(&value)),
        _ => Err(PyErr::attribute_error(name.to_string())),
    }
}

#[test]
fn test_extension_type_dealloc_runs_once() {
    init_test_logging();
    let interp = PyInterpreter::new();
    let holder = interp.register_type(PyType {
        getattr: Some(holder_getattr),
        dealloc: Some(count_dealloc),
        ..PyType::new("Holder")
    });
    let payload = Rc::new(String::from("payload"));

    let instance = interp.new_instance(holder, Box::new(payload.clone()));
    assert_eq!(interp.type_name(&instance), "Holder");
    let value = interp.getattr(&instance, "value").unwrap();
    assert_eq!(interp.as_str(&value).as_deref(), Some("payload"));

    let alias = instance.clone();
    let container = interp.list(vec![alias]);
    drop(instance);
    assert_eq!(DEALLOCATED.with(Cell::get), 0);
    assert_eq!(Rc::strong_count(&payload), 2);

    drop(container);
    assert_eq!(DEALLOCATED.with(Cell::get), 1);
    assert_eq!(Rc::strong_count(&payload), 1);
}

#[test]
fn test_interpreter_teardown_drops_payloads() {
    let payload = Rc::new(String::from("payload"));
    let orphan = {
        let interp = PyInterpreter::new();
        let holder = interp.register_type(PyType::new("Holder"));
        let instance = interp.new_instance(holder, Box::new(payload.clone()));
        interp.set_global("held", instance.clone());
        instance
    };
    assert_eq!(Rc::strong_count(&payload), 1);
    drop(orphan);
}

#[test]
fn test_globals() {
    let interp = PyInterpreter::new();
    interp.set_global("answer", interp.int(42));
    let answer = interp.get_global("answer").unwrap();
    assert_eq!(interp.as_int(&answer), Some(42));
    assert!(interp.del_global("answer"));
    assert_eq!(
        interp.get_global("answer").unwrap_err().to_string(),
        "RuntimeError: name 'answer' is not defined"
    );
}

#[test]
fn test_normalize_index() {
    assert_eq!(normalize_index(0, 3), Some(0));
    assert_eq!(normalize_index(-1, 3), Some(2));
    assert_eq!(normalize_index(-4, 3), None);
    assert_eq!(normalize_index(3, 3), None);
}
