use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    bridge::{ObjectBridge, ObjectBuilder, Param},
    error::{Error, ErrorKind},
    registry::{ClassRegistry, ObjectRegistry},
    values::{Binder, Value, ValueType, binder},
};

fn session_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register_factory("mysqlx", "Session", |args| {
            let uri = args.first().map(|uri| uri.descr(false)).unwrap_or_default();
            let session = ObjectBuilder::new("Session", uri)
                .property("uri", |uri: &String| Ok(Value::from(uri.as_str())))
                .method("close", [], |_, _| Ok(Value::Undefined))
                .build();
            Ok(session as Rc<dyn ObjectBridge>)
        })
        .unwrap();
    registry
        .register_factory("mysql", "ClassicSession", |_| {
            Ok(ObjectBuilder::new("ClassicSession", ()).build() as Rc<dyn ObjectBridge>)
        })
        .unwrap();
    registry
}

#[test]
fn test_call_constructor() {
    let registry = session_registry();
    let session = registry
        .call_constructor("mysqlx", "Session", &[Value::from("root@localhost")])
        .unwrap();
    let session = session.as_object_bridge().unwrap();
    assert_eq!(session.class_name(), "Session");
    assert_eq!(session.get_member("uri").unwrap(), Value::from("root@localhost"));
}

#[test]
fn test_unknown_factory() {
    let registry = session_registry();
    let err = registry.call_constructor("mysqlx", "Schema", &[]).unwrap_err();
    assert_eq!(
        err,
        Error::UnknownFactory {
            package: "mysqlx".into(),
            class: "Schema".into()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Attribute);
    assert!(!registry.has_factory("nope", "Session"));
}

#[test]
fn test_duplicate_factory_is_rejected() {
    let mut registry = session_registry();
    let err = registry
        .register_factory("mysqlx", "Session", |_| Err(Error::logic("unused")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Logic);
}

#[test]
fn test_introspection() {
    let registry = session_registry();
    assert_eq!(registry.packages(), vec!["mysql", "mysqlx"]);
    assert_eq!(registry.classes("mysqlx"), vec!["Session"]);
    assert!(registry.classes("other").is_empty());
}

#[test]
fn test_package_value() {
    let registry = session_registry();
    let package = registry.package_value("mysqlx").unwrap();
    let constructor = package.get("Session").unwrap().as_function().unwrap();
    let session = constructor.invoke(&[Value::from("uri")]).unwrap();
    assert_eq!(session.as_object_bridge().unwrap().class_name(), "Session");
    assert!(registry.package_value("nope").is_err());
}

#[test]
fn test_object_registry_binder() {
    let shell = ObjectBuilder::new("Shell", ())
        .method("help", [Param::any("topic").optional()], |_, _| {
            Ok(Value::from("help"))
        })
        .build();
    let registry = ObjectRegistry::builder()
        .bind("shell", Value::Object(shell))
        .bind("version", Value::from("1.0.0"))
        .build()
        .unwrap();

    assert_eq!(registry.names(), vec!["shell", "version"]);
    assert_eq!(registry.get("version"), Some(Value::from("1.0.0")));
}

#[test]
fn test_object_registry_duplicates() {
    let result = ObjectRegistry::builder()
        .bind("db", Value::Null)
        .bind("db", Value::Null)
        .build();
    let Err(err) = result else {
        panic!("duplicate binding accepted");
    };
    assert_eq!(err, binder::Error::DuplicateBinding(vec!["db".to_string()]));
    assert_eq!(err.to_string(), "Duplicate binding for 'db'");
}

#[test]
fn test_each_duplicate_is_reported_once() {
    let result = ObjectRegistry::builder()
        .bind("db", Value::Null)
        .bind("db", Value::Null)
        .bind("cache", Value::Null)
        .bind("db", Value::Null)
        .bind("cache", Value::Null)
        .build();
    let Err(err) = result else {
        panic!("duplicate binding accepted");
    };
    assert_eq!(err.to_string(), "Duplicate binding for 'db', 'cache'");
}

#[test]
fn test_object_registry_is_exposed_weakly() {
    let registry = ObjectRegistry::new();
    registry.register("session", Value::from("s")).unwrap();
    assert!(registry.register("session", Value::Null).is_err());

    let exposed = registry.as_value_ref();
    assert_eq!(exposed.value_type(), ValueType::MapRef);
    assert_eq!(
        exposed.as_map().unwrap().get("session"),
        Some(Value::from("s"))
    );

    registry.replace("session", Value::from("t"));
    assert_eq!(exposed.as_map().unwrap().get("session"), Some(Value::from("t")));

    drop(registry);
    assert!(exposed.as_map().is_err());
}
