use pretty_assertions::assert_eq;

use crate::{
    error::ErrorKind,
    values::{Map, ParseError, Value},
};

#[test]
fn test_round_trip_primitives() {
    let values = [
        Value::Null,
        Value::from(true),
        Value::from(false),
        Value::from(0),
        Value::from(-12345),
        Value::from(i64::MAX),
        Value::from(i64::MIN),
        Value::from(1.0),
        Value::from(-0.25),
        Value::from(1e300),
        Value::from(5e-324),
        Value::from(f64::INFINITY),
        Value::from(f64::NEG_INFINITY),
        Value::from(""),
        Value::from("plain"),
        Value::from("quote \" backslash \\ newline \n tab \t bell \u{7} ünï"),
    ];
    for value in values {
        let text = value.repr();
        assert_eq!(Value::parse(&text).unwrap(), value, "round trip of {}", text);
    }
}

#[test]
fn test_round_trip_containers() {
    let map = Map::new();
    map.set("list", Value::from(vec![Value::from(1), Value::from("two"), Value::Null]));
    map.set("empty", Value::new_map());
    map.set("with \"quotes\"", Value::from(3.5));
    let value = Value::Map(map);

    assert_eq!(Value::parse(&value.repr()).unwrap(), value);
    assert_eq!(Value::parse(&value.descr(true)).unwrap(), value);
}

#[test]
fn test_nan_parses_as_nan() {
    let value = Value::parse("nan").unwrap();
    assert!(value.as_double().unwrap().is_nan());
}

#[test]
fn test_integers_stay_integers() {
    assert_eq!(Value::parse("10").unwrap(), Value::Integer(10));
    assert_eq!(Value::parse("10.0").unwrap(), Value::Float(10.0));
    assert_eq!(Value::parse("1e3").unwrap(), Value::Float(1000.0));
}

#[test]
fn test_literal_extras() {
    assert_eq!(Value::parse("undefined").unwrap(), Value::Undefined);
    assert_eq!(Value::parse("'single'").unwrap(), Value::from("single"));
    assert_eq!(Value::parse(r#""\u{48}i""#).unwrap(), Value::from("Hi"));
    assert_eq!(
        Value::parse(" [ 1 , 2 , ] ").unwrap(),
        Value::from(vec![Value::from(1), Value::from(2)])
    );
}

#[test]
fn test_errors_carry_spans() {
    let err = Value::parse("[1, 2").unwrap_err();
    assert!(err.span.start >= 4, "span {:?}", err.span);
    assert_eq!(err.input, "[1, 2");

    assert!(Value::parse("nullx").is_err());
}

#[test]
fn test_integer_overflow() {
    let err = Value::parse("99999999999999999999").unwrap_err();
    assert_eq!(
        err,
        ParseError {
            message: "integer literal out of range".to_string(),
            span: 0..20,
            input: "99999999999999999999".to_string(),
        }
    );
}

#[test]
fn test_max_depth() {
    assert!(Value::parse_with_max_depth("[[[1]]]", 3).is_ok());
    let err = Value::parse_with_max_depth("[[[1]]]", 2).unwrap_err();
    assert_eq!(err.span, 2..5);
    assert!(err.message.contains("maximum depth of 2"));
}

#[test]
fn test_parse_error_converts_to_argument_error() {
    let err: crate::Error = Value::parse("{").unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Argument);
}
