//! Member and index accessors.
//!
//! Reads never fail: a missing key, an out-of-range index or a variant
//! mismatch reads as `Null` (or `None` for the `Option` forms). Writes by key
//! promote a non-object to a fresh object so that chained writes starting
//! from `Null` materialize the whole path. Writes by index never promote.

use std::ops::{Index, IndexMut};

use json_dyn_path::{parse_index_token, parse_json_pointer, CodingPath};
use serde::de::DeserializeOwned;

use super::{Map, Value};
use crate::error::{Error, Result};

static NULL: Value = Value::Null;

impl Value {
    /// Object member by key. `None` for non-objects and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Object member by key, reading `Null` when absent.
    pub fn member(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }

    /// Array element by index, reading `Null` when absent.
    pub fn get_index(&self, index: usize) -> &Value {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Value::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// Replaces an array element.
    ///
    /// Does nothing when `self` is not an array. An index past the end is an
    /// error; the array is never extended.
    pub fn set_index(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let Value::Array(items) = self else {
            return Ok(());
        };
        let len = items.len();
        match items.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                index,
                len,
                path: CodingPath::root(),
            }),
        }
    }

    /// Writes or removes an object member.
    ///
    /// `None` removes `key` (a no-op on non-objects). `Some` upserts into an
    /// object, or replaces any other value with a single-entry object.
    pub fn set(&mut self, key: &str, value: Option<Value>) {
        match value {
            None => {
                self.remove(key);
            }
            Some(value) => {
                self.promote_to_object().insert(key.to_string(), value);
            }
        }
    }

    /// Shorthand for `set(key, Some(value))`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.promote_to_object().insert(key.into(), value.into());
    }

    /// Removes an object member, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Object(map) => map.shift_remove(key),
            _ => None,
        }
    }

    /// Mutable member access with promotion.
    ///
    /// Promotes `self` to an object when needed and inserts a `Null`
    /// placeholder for a missing key, so the returned slot can itself be
    /// written through.
    pub fn member_mut(&mut self, key: &str) -> &mut Value {
        self.promote_to_object()
            .entry(key.to_string())
            .or_insert(Value::Null)
    }

    /// Writes `value` at a key path, creating intermediate objects.
    ///
    /// An empty path replaces `self`.
    pub fn set_path(&mut self, path: &[&str], value: impl Into<Value>) {
        let mut slot = self;
        for key in path {
            slot = slot.member_mut(key);
        }
        *slot = value.into();
    }

    /// Resolves an RFC 6901 JSON Pointer.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let tokens = parse_json_pointer(pointer).ok()?;
        let mut current = self;
        for token in &tokens {
            current = match current {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(parse_index_token(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn pointer_mut(&mut self, pointer: &str) -> Option<&mut Value> {
        let tokens = parse_json_pointer(pointer).ok()?;
        let mut current = self;
        for token in &tokens {
            current = match current {
                Value::Object(map) => map.get_mut(token)?,
                Value::Array(items) => items.get_mut(parse_index_token(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Character count for strings, element count for arrays, entry count
    /// for objects, `0` otherwise.
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First array element, or the member named `"first"` on non-arrays.
    pub fn first(&self) -> &Value {
        match self {
            Value::Array(items) => items.first().unwrap_or(&NULL),
            _ => self.member("first"),
        }
    }

    /// Last array element, or the member named `"last"` on non-arrays.
    pub fn last(&self) -> &Value {
        match self {
            Value::Array(items) => items.last().unwrap_or(&NULL),
            _ => self.member("last"),
        }
    }

    /// Replaces the first array element; on non-arrays writes member `"first"`.
    pub fn set_first(&mut self, value: impl Into<Value>) -> Result<()> {
        if self.is_array() {
            return self.set_index(0, value);
        }
        self.insert("first", value);
        Ok(())
    }

    /// Replaces the last array element; on non-arrays writes member `"last"`.
    pub fn set_last(&mut self, value: impl Into<Value>) -> Result<()> {
        let len = match self {
            Value::Array(items) => items.len(),
            _ => {
                self.insert("last", value);
                return Ok(());
            }
        };
        self.set_index(len.saturating_sub(1), value)
    }

    /// Decodes member `key` as `T`; any failure reads as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)?.decode().ok()
    }

    /// Decodes element `index` as `T`; any failure reads as `None`.
    pub fn index_as<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        self.as_array()?.get(index)?.decode().ok()
    }

    fn promote_to_object(&mut self) -> &mut Map {
        if !self.is_object() {
            tracing::trace!(from = %self.kind(), "promoting value to object");
            *self = Value::Object(Map::new());
        }
        match self {
            Value::Object(map) => map,
            _ => unreachable!("value was promoted to an object"),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.get_index(index)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.member(key)
    }
}

/// Promote-on-write member access; see [`Value::member_mut`].
impl IndexMut<&str> for Value {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.member_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn chained_write_materializes_path() {
        let mut root = Value::Null;
        root["a"]["b"]["c"] = Value::from("value");
        assert_eq!(root["a"]["b"]["c"], Value::from("value"));
        assert!(root["a"].is_object());
        assert!(root["a"]["b"].is_object());
    }

    #[test]
    fn set_path_matches_chained_write() {
        let mut root = Value::Null;
        root.set_path(&["a", "b", "c"], "value");
        assert_eq!(root, v(json!({"a": {"b": {"c": "value"}}})));
    }

    #[test]
    fn set_promotes_scalars_and_arrays() {
        let mut value = Value::from(42);
        value.set("k", Some(Value::Bool(true)));
        assert_eq!(value, v(json!({"k": true})));

        let mut value = v(json!([1, 2]));
        value.set("k", Some(Value::Null));
        assert_eq!(value, v(json!({"k": null})));
    }

    #[test]
    fn set_none_removes() {
        let mut value = v(json!({"a": 1, "b": 2}));
        value.set("a", None);
        assert_eq!(value, v(json!({"b": 2})));

        let mut scalar = Value::from("x");
        scalar.set("a", None);
        assert_eq!(scalar, Value::from("x"));
    }

    #[test]
    fn reads_never_fail() {
        let value = v(json!({"a": [1]}));
        assert_eq!(value["missing"], Value::Null);
        assert_eq!(value["a"][5], Value::Null);
        assert_eq!(value[0], Value::Null);
        assert_eq!(Value::from("x")["a"], Value::Null);
        assert_eq!(Value::from("x").get("a"), None);
    }

    #[test]
    fn index_write_on_non_array_is_noop() {
        let mut value = Value::from("x");
        value.set_index(0, 0).unwrap();
        assert_eq!(value, Value::from("x"));
        assert_eq!(value[0], Value::Null);
    }

    #[test]
    fn index_write_out_of_bounds_errors() {
        let mut value = v(json!([1, 2]));
        value.set_index(1, "two").unwrap();
        assert_eq!(value, v(json!([1, "two"])));
        let err = value.set_index(2, 3).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 2, len: 2, .. }));
        assert_eq!(value.len(), 2);
    }

    #[test]
    fn counts() {
        assert_eq!(Value::from("héllo").len(), 5);
        assert_eq!(v(json!([1, 2, 3])).len(), 3);
        assert_eq!(v(json!({"a": 1})).len(), 1);
        assert_eq!(Value::Int(10).len(), 0);
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
    }

    #[test]
    fn first_and_last() {
        let arr = v(json!([1, 2, 3]));
        assert_eq!(arr.first(), &Value::Int(1));
        assert_eq!(arr.last(), &Value::Int(3));
        assert_eq!(v(json!([])).first(), &Value::Null);

        let mut obj = v(json!({"first": 1}));
        assert_eq!(obj.first(), &Value::Int(1));
        obj.set_last(2).unwrap();
        assert_eq!(obj, v(json!({"first": 1, "last": 2})));
    }

    #[test]
    fn set_first_and_last_on_arrays() {
        let mut arr = v(json!([1, 2, 3]));
        arr.set_first("a").unwrap();
        arr.set_last("c").unwrap();
        assert_eq!(arr, v(json!(["a", 2, "c"])));

        let mut empty = v(json!([]));
        assert!(empty.set_last(1).is_err());
        assert!(empty.set_first(1).is_err());
    }

    #[test]
    fn pointer_navigation() {
        let mut value = v(json!({"a": [{"b/c": 1}], "": 2}));
        assert_eq!(value.pointer("/a/0/b~1c"), Some(&Value::Int(1)));
        assert_eq!(value.pointer("/"), Some(&Value::Int(2)));
        assert_eq!(value.pointer(""), Some(&value.clone()));
        assert_eq!(value.pointer("/a/01"), None);
        assert_eq!(value.pointer("a"), None);
        *value.pointer_mut("/a/0/b~1c").unwrap() = Value::Bool(false);
        assert_eq!(value["a"][0]["b/c"], Value::Bool(false));
    }

    #[test]
    fn typed_member_reads_are_absent_on_failure() {
        let value = v(json!({"n": "12", "s": "abc", "list": [true]}));
        assert_eq!(value.get_as::<i32>("n"), Some(12));
        assert_eq!(value.get_as::<i32>("s"), None);
        assert_eq!(value.get_as::<i32>("missing"), None);
        assert_eq!(value["list"].index_as::<bool>(0), Some(true));
        assert_eq!(value["list"].index_as::<bool>(1), None);
    }

    #[test]
    fn remove_keeps_order() {
        let mut value = v(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(value.remove("b"), Some(Value::Int(2)));
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
