//! JSON value types.
//!
//! This module defines the [`Value`] enum, which represents any JSON value,
//! together with the [`Object`] and [`Array`] containers it nests.

use alloc::{string::String, vec::Vec};
use core::{fmt, mem, str::FromStr};

use bstr::{BStr, BString, ByteSlice};

use crate::{error::ParseError, map::Map, sequence::Sequence};

/// The members of a JSON object.
pub type Object = Map<Value>;
/// The elements of a JSON array.
pub type Array = Sequence<Value>;

/// A JSON value as defined by [RFC 8259].
///
/// Strings are byte strings: the parser copies string contents without UTF-8
/// validation and only decodes escape sequences, so a `String` holds whatever
/// bytes the document held.
///
/// Equality is structural. Arrays compare element by element; objects compare
/// as sets of members, so two objects holding the same members are equal no
/// matter how their tables are laid out.
///
/// # Examples
///
/// ```
/// use jsonpress::{Object, Value};
///
/// let mut object = Object::new();
/// object.set("key", Value::from("value")).unwrap();
/// let v = Value::Object(object);
/// assert_eq!(v["key"], Value::from("value"));
/// assert_eq!(v.to_string(), "{\n    \"key\": \"value\"\n}");
/// ```
///
/// [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// A string with escapes decoded.
    String(BString),
    /// Any JSON number, as a double.
    Number(f64),
    /// An unordered collection of uniquely keyed members.
    Object(Object),
    /// An ordered list of values.
    Array(Array),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    #[default]
    Null,
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(BString::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(BString::from(v))
    }
}

impl From<BString> for Value {
    fn from(v: BString) -> Self {
        Self::String(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonpress::Value;
    ///
    /// assert!(Value::Null.is_null());
    /// assert!(!Value::Boolean(false).is_null());
    /// ```
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is [`Boolean`].
    ///
    /// [`Boolean`]: Value::Boolean
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Boolean(..))
    }

    /// Returns `true` if the value is [`Number`].
    ///
    /// [`Number`]: Value::Number
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(..))
    }

    /// Returns `true` if the value is [`String`].
    ///
    /// [`String`]: Value::String
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(..))
    }

    /// Returns `true` if the value is [`Array`].
    ///
    /// [`Array`]: Value::Array
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    /// Returns `true` if the value is [`Object`].
    ///
    /// [`Object`]: Value::Object
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(..))
    }

    /// The boolean, if this is a [`Boolean`](Value::Boolean).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is a [`Number`](Value::Number).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The raw bytes, if this is a [`String`](Value::String).
    #[must_use]
    pub fn as_bytes(&self) -> Option<&BStr> {
        match self {
            Self::String(s) => Some(s.as_bstr()),
            _ => None,
        }
    }

    /// The string as UTF-8, if this is a [`String`](Value::String) holding
    /// valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonpress::Value;
    ///
    /// let v: Value = r#""café""#.parse().unwrap();
    /// assert_eq!(v.as_str(), Some("caf\u{e9}"));
    /// assert_eq!(Value::from(1.5).as_str(), None);
    /// ```
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => s.to_str().ok(),
            _ => None,
        }
    }

    /// The elements, if this is an [`Array`](Value::Array).
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable access to the elements, if this is an [`Array`](Value::Array).
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The members, if this is an [`Object`](Value::Object).
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable access to the members, if this is an
    /// [`Object`](Value::Object).
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Looks up a member of an object. Returns `None` for absent keys and for
    /// values that are not objects.
    pub fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    /// Renders the value with the pretty printer.
    ///
    /// See [`serialize::write`](crate::serialize::write) for the layout.
    #[must_use]
    pub fn to_pretty(&self) -> BString {
        BString::from(crate::serialize::to_vec(self))
    }
}

impl<K: AsRef<[u8]> + ?Sized> core::ops::Index<&K> for Value {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the value is not an object or has no member `key`.
    fn index(&self, key: &K) -> &Value {
        match self {
            Self::Object(o) => &o[key],
            _ => panic!("cannot index a non-object value by key"),
        }
    }
}

impl core::ops::Index<usize> for Value {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the value is not an array or `index` is out of range.
    fn index(&self, index: usize) -> &Value {
        match self {
            Self::Array(a) => &a[index],
            _ => panic!("cannot index a non-array value by position"),
        }
    }
}

impl FromStr for Value {
    type Err = ParseError;

    /// Parses with the default [`ParserOptions`](crate::ParserOptions).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse(s)
    }
}

impl fmt::Display for Value {
    /// Writes the pretty-printed form. String bytes that are not valid UTF-8
    /// are shown as U+FFFD.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<u8> = crate::serialize::to_vec(self);
        fmt::Display::fmt(rendered.as_bstr(), f)
    }
}

/// Tears the tree down without recursing once per nesting level: nested
/// containers are detached onto a heap stack and dropped one at a time.
impl Drop for Value {
    fn drop(&mut self) {
        if !has_nested_container(self) {
            return;
        }
        let mut pending = Vec::new();
        detach_nested(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            detach_nested(&mut value, &mut pending);
        }
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(..) | Value::Object(..))
}

fn has_nested_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(is_container),
        Value::Object(members) => members.values().any(is_container),
        _ => false,
    }
}

/// Moves the container children of `value` onto `pending`, leaving `Null` in
/// their place. When `pending` cannot grow the children stay put and drop
/// recursively instead.
fn detach_nested(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            let nested = items.iter().filter(|v| is_container(v)).count();
            if nested > 0 && pending.try_reserve(nested).is_ok() {
                pending.extend(
                    items
                        .iter_mut()
                        .filter(|v| is_container(v))
                        .map(mem::take),
                );
            }
        }
        Value::Object(members) => {
            let nested = members.values().filter(|v| is_container(v)).count();
            if nested > 0 && pending.try_reserve(nested).is_ok() {
                pending.extend(
                    members
                        .iter_mut()
                        .map(|(_, v)| v)
                        .filter(|v| is_container(v))
                        .map(mem::take),
                );
            }
        }
        _ => {}
    }
}
