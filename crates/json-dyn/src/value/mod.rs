//! The dynamic [`Value`] tree.
//!
//! A `Value` is a closed tagged union over the JSON data model with a split
//! numeric representation (`Int` for 64-bit signed integers, `Double` for
//! everything else). Objects keep their entries in insertion order; that
//! order is stable across iteration but carries no meaning for equality.

mod access;
mod iter;

use std::fmt;

use indexmap::IndexMap;

use crate::coerce::canonical_double;

pub use iter::Iter;

/// Object storage: unique string keys in insertion order.
pub type Map = IndexMap<String, Value>;

/// A dynamic, self-describing JSON-like value.
///
/// Equality is structural and variant-exact: `Int(1)` equals neither
/// `Double(1.0)` nor `String("1")`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

/// Variant tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Double,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    /// Scalars are the leaves visited by [`Value::map`].
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Runs `build` against a `Null` value and returns the result.
    ///
    /// ```
    /// use json_dyn::Value;
    ///
    /// let v = Value::build(|v| {
    ///     v["user"]["name"] = "ada".into();
    /// });
    /// assert_eq!(v["user"]["name"], Value::from("ada"));
    /// ```
    pub fn build<F>(build: F) -> Value
    where
        F: FnOnce(&mut Value),
    {
        let mut value = Value::Null;
        build(&mut value);
        value
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub const fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    /// True for both `Int` and `Double`.
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Double(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as `f64` for both numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Replaces `self` with `Null` and returns the previous value.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Compact, human-oriented rendering. Same as `Display`.
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Verbose rendering: pretty-printed JSON for arrays and objects, the
    /// reflective (`Debug`) form for scalars, so strings come out quoted.
    pub fn debug_description(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => format!("{b:?}"),
            Value::Int(n) => format!("{n:?}"),
            Value::Double(d) => format!("{d:?}"),
            Value::String(s) => format!("{s:?}"),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
            }
        }
    }

    /// Visits this value and then every nested value, depth first.
    pub fn walk<F>(&self, callback: &mut F)
    where
        F: FnMut(&Value),
    {
        callback(self);
        match self {
            Value::Array(items) => {
                for item in items {
                    item.walk(callback);
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    item.walk(callback);
                }
            }
            _ => {}
        }
    }
}

/// Scalars print in their canonical text form (strings unquoted); arrays
/// and objects print as compact single-line JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(d) => f.write_str(&canonical_double(*d)),
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Object(_) => {
                let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

// ── Literal construction ─────────────────────────────────────────────────

macro_rules! from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(value as i64)
                }
            }
        )*
    };
}

macro_rules! from_unsigned_wide {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                /// Values above `i64::MAX` fall back to `Double`.
                fn from(value: $ty) -> Self {
                    match i64::try_from(value) {
                        Ok(n) => Value::Int(n),
                        Err(_) => Value::Double(value as f64),
                    }
                }
            }
        )*
    };
}

from_signed!(i8, i16, i32, i64, isize, u8, u16, u32);
from_unsigned_wide!(u64, usize);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::String(value.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ── serde_json interop ───────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Non-finite doubles have no JSON representation and become `null`.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(n) => serde_json::Value::Number(n.into()),
            Value::Double(d) => serde_json::Number::from_f64(d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}
