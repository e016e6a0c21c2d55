use expect_test::expect;
use pretty_assertions::assert_eq;

use crate::{
    bridge::ObjectBuilder,
    error::ErrorKind,
    values::{Array, Map, Value},
};

#[test]
fn test_json_compact() {
    let map = Map::new();
    map.set("id", Value::from(7));
    map.set("ratio", Value::from(0.5));
    map.set("tags", Value::from(vec![Value::from("a"), Value::Null, Value::Undefined]));
    map.set("ok", Value::from(true));
    assert_eq!(
        Value::Map(map).json(false).unwrap(),
        r#"{"id":7,"ok":true,"ratio":0.5,"tags":["a",null,null]}"#
    );
}

#[test]
fn test_json_pretty() {
    let map = Map::new();
    map.set("name", Value::from("doc"));
    map.set("size", Value::from(3));
    expect![[r#"
        {
          "name": "doc",
          "size": 3
        }"#]]
    .assert_eq(&Value::Map(map).json(true).unwrap());
}

#[test]
fn test_objects_serialize_as_description() {
    let object = ObjectBuilder::new("Session", ()).build();
    assert_eq!(Value::Object(object).json(false).unwrap(), r#""<Session>""#);
}

#[test]
fn test_from_json() {
    let value = Value::from_json(r#"{"a": [1, 2.5, "x", null, true], "b": {}}"#).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(
        map.get("a").unwrap(),
        Value::from(vec![
            Value::from(1),
            Value::from(2.5),
            Value::from("x"),
            Value::Null,
            Value::from(true),
        ])
    );
    assert_eq!(map.get("b").unwrap(), Value::new_map());
}

#[test]
fn test_from_json_large_unsigned_becomes_float() {
    let value = Value::from_json("18446744073709551615").unwrap();
    assert_eq!(value, Value::Float(18446744073709551615.0));
}

#[test]
fn test_from_json_invalid() {
    let err = Value::from_json("{").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

#[test]
fn test_cyclic_data_is_rejected() {
    let array = Array::new();
    array.push(Value::Array(array.clone()));
    let err = Value::Array(array.clone()).json(false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Logic);
    array.borrow_mut().clear();
}
