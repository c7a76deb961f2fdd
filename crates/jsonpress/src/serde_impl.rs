//! `serde::Serialize` for the value tree, behind the `serde` feature.
//!
//! Strings and keys that hold valid UTF-8 serialize as strings; anything else
//! falls back to bytes. Numbers always serialize as `f64`.

use bstr::{BStr, ByteSlice};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{map::Map, sequence::Sequence, value::Value};

struct Text<'a>(&'a BStr);

impl Serialize for Text<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_str() {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.serialize_bytes(self.0),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => Text(s.as_bstr()).serialize(serializer),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Object(members) => members.serialize(serializer),
            Value::Array(items) => items.serialize(serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl<V: Serialize> Serialize for Map<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(&Text(key), value)?;
        }
        map.end()
    }
}

impl<T: Serialize> Serialize for Sequence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self)
    }
}
