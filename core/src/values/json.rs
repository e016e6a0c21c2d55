//! JSON view of values through `serde`.
//!
//! Undefined and Null both serialize as `null`; Objects serialize as their
//! description and Functions as `<Function:name>`. Deserializing never
//! produces Undefined, Objects or Functions, and integers that do not fit in
//! an `i64` become floats.

use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, SeqAccess, Visitor},
    ser::{Error as _, SerializeMap, SerializeSeq},
};

use crate::{
    error::{Error, Result},
    values::{Array, Map, Value},
};

/// Nesting limit while serializing, which also stops self-referencing data.
const MAX_SERIALIZE_DEPTH: usize = 256;

impl Value {
    pub fn json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        text.map_err(|e| Error::logic(format!("Unable to serialize value to JSON: {}", e)))
    }

    pub fn from_json(text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| Error::argument(format!("Invalid JSON: {}", e)))
    }
}

struct Depth<'a> {
    value: &'a Value,
    depth: usize,
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        Depth {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

impl Serialize for Depth<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        if self.depth > MAX_SERIALIZE_DEPTH {
            return Err(S::Error::custom("value nesting is too deep"));
        }
        let nested = |value| Depth {
            value,
            depth: self.depth + 1,
        };
        match self.value {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(array) => {
                let items = array.to_vec();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&nested(item))?;
                }
                seq.end()
            }
            Value::Map(map) => serialize_map(map, serializer, self.depth),
            Value::MapRef(weak) => match weak.upgrade() {
                Some(map) => serialize_map(&map, serializer, self.depth),
                None => serializer.serialize_unit(),
            },
            Value::Object(_) | Value::Function(_) => {
                serializer.serialize_str(&self.value.descr(false))
            }
        }
    }
}

fn serialize_map<S: Serializer>(
    map: &Map,
    serializer: S,
    depth: usize,
) -> core::result::Result<S::Ok, S::Error> {
    let entries = map.entries();
    let mut out = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in &entries {
        out.serialize_entry(
            key,
            &Depth {
                value,
                depth: depth + 1,
            },
        )?;
    }
    out.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E>(self) -> core::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> core::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> core::result::Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> core::result::Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> core::result::Result<Value, E> {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E>(self, u: u64) -> core::result::Result<Value, E> {
        Ok(match i64::try_from(u) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(u as f64),
        })
    }

    fn visit_f64<E>(self, f: f64) -> core::result::Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E>(self, s: &str) -> core::result::Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> core::result::Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Array(Array::from_vec(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> core::result::Result<Value, A::Error> {
        let map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.set(key, value);
        }
        Ok(Value::Map(map))
    }
}
