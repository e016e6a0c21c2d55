use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_kinds() {
    assert_eq!(
        Error::TypeMismatch {
            expected: ValueType::Integer,
            actual: ValueType::String
        }
        .kind(),
        ErrorKind::Type
    );
    assert_eq!(Error::unknown_member("Doc", "x").kind(), ErrorKind::Attribute);
    assert_eq!(Error::read_only("Doc", "x").kind(), ErrorKind::Attribute);
    assert_eq!(
        Error::UnknownFactory {
            package: "mysqlx".into(),
            class: "Session".into()
        }
        .kind(),
        ErrorKind::Attribute
    );
    assert_eq!(Error::argument("bad").kind(), ErrorKind::Argument);
    assert_eq!(Error::logic("bad").kind(), ErrorKind::Logic);
    assert_eq!(Error::CallableGone("cb".into()).kind(), ErrorKind::Scripting);
}

#[test]
fn test_messages() {
    assert_eq!(
        Error::TypeMismatch {
            expected: ValueType::Integer,
            actual: ValueType::String
        }
        .to_string(),
        "Invalid typecast: Integer expected, but value is String"
    );
    assert_eq!(
        Error::unknown_member("CollectionFind", "skip").to_string(),
        "Invalid object member 'skip' in CollectionFind"
    );
    assert_eq!(
        Error::CallableGone("onRow".into()).to_string(),
        "Callable 'onRow' no longer exists"
    );
}

#[test]
fn test_to_value_schema() {
    let error = Error::argument("Invalid number of arguments").caused("Script failed");
    let value = error.to_value();
    let map = value.as_map().unwrap();

    assert_eq!(map.get("type"), Some(Value::from("ScriptingError")));
    assert_eq!(map.get("message"), Some(Value::from("Script failed")));
    assert_eq!(
        map.get("description"),
        Some(Value::from("ScriptingError: Script failed"))
    );
    assert!(!map.contains_key("code"));

    let cause = map.get("cause").unwrap().as_map().unwrap();
    assert_eq!(cause.get("type"), Some(Value::from("ArgumentError")));
    assert_eq!(cause.get("cause"), Some(Value::Null));
}

#[test]
fn test_to_value_with_code() {
    let error = Error::Scripting {
        message: "Access denied".into(),
        code: Some(1045),
        cause: None,
    };
    let map = error.to_value().as_map().unwrap();
    assert_eq!(map.get("code"), Some(Value::Integer(1045)));
}

#[test]
fn test_from_value_inverts_schema() {
    let errors = [
        Error::Type("not a number".into()),
        Error::Attribute("no such member".into()),
        Error::argument("too many arguments"),
        Error::logic("closed session"),
        Error::Scripting {
            message: "boom".into(),
            code: Some(7),
            cause: Some(Box::new(Error::argument("inner"))),
        },
    ];
    for error in errors {
        assert_eq!(Error::from_value(&error.to_value()), error);
    }
}

#[test]
fn test_from_value_keeps_kind_of_structured_errors() {
    let original = Error::unknown_member("Doc", "x");
    let back = Error::from_value(&original.to_value());
    assert_eq!(back.kind(), ErrorKind::Attribute);
    assert_eq!(back.to_string(), original.to_string());
}

#[test]
fn test_from_value_non_schema() {
    let error = Error::from_value(&Value::from("plain string thrown"));
    assert_eq!(error, Error::scripting("plain string thrown"));

    let error = Error::from_value(&Value::Integer(42));
    assert_eq!(error.kind(), ErrorKind::Scripting);
    assert_eq!(error.to_string(), "42");
}

#[test]
fn test_source_chain() {
    use std::error::Error as _;

    let error = Error::logic("inner").caused("outer");
    let source = error.source().unwrap();
    assert_eq!(source.to_string(), "inner");
}
