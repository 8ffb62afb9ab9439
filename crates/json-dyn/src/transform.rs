//! Structural transforms over the leaves of a [`Value`] tree.
//!
//! Leaves are the scalar variants (`Null`, `Bool`, `Int`, `Double`,
//! `String`). Containers keep their shape and keys; only leaves are handed
//! to the callback, and each result is re-encoded through [`to_value`].
//! Callbacks that return a [`Value`] (for instance `Value::from(datetime)`)
//! keep that exact encoding, since a `Value` encodes to itself.

use serde::Serialize;

use crate::bridge::to_value;
use crate::error::Result;
use crate::value::{Map, Value};

impl Value {
    /// Replaces every leaf with the encoded result of `f`.
    ///
    /// ```
    /// use json_dyn::Value;
    ///
    /// let value = json_dyn::from_str(r#"{"a": [1, 2], "b": 3}"#).unwrap();
    /// let doubled = value.map(|leaf| leaf.as_i64().unwrap_or(0) * 2).unwrap();
    /// assert_eq!(doubled, json_dyn::from_str(r#"{"a": [2, 4], "b": 6}"#).unwrap());
    /// ```
    pub fn map<T, F>(&self, mut f: F) -> Result<Value>
    where
        T: Serialize,
        F: FnMut(&Value) -> T,
    {
        map_node(self, &mut f)
    }

    /// Like [`Value::map`], but leaves for which `f` returns `None` are
    /// dropped from their container.
    ///
    /// A container emptied by those removals is dropped from its own parent
    /// in turn; containers that were empty to begin with are kept. When the
    /// whole tree is dropped the result is `Null`.
    pub fn compact_map<T, F>(&self, mut f: F) -> Result<Value>
    where
        T: Serialize,
        F: FnMut(&Value) -> Option<T>,
    {
        Ok(compact_node(self, &mut f)?.unwrap_or(Value::Null))
    }
}

fn map_node<T, F>(node: &Value, f: &mut F) -> Result<Value>
where
    T: Serialize,
    F: FnMut(&Value) -> T,
{
    match node {
        Value::Array(items) => items
            .iter()
            .map(|item| map_node(item, f))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), map_node(value, f)?);
            }
            Ok(Value::Object(out))
        }
        leaf => to_value(&f(leaf)),
    }
}

fn compact_node<T, F>(node: &Value, f: &mut F) -> Result<Option<Value>>
where
    T: Serialize,
    F: FnMut(&Value) -> Option<T>,
{
    match node {
        Value::Array(items) if items.is_empty() => Ok(Some(Value::Array(Vec::new()))),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(kept) = compact_node(item, f)? {
                    out.push(kept);
                }
            }
            Ok((!out.is_empty()).then_some(Value::Array(out)))
        }
        Value::Object(map) if map.is_empty() => Ok(Some(Value::Object(Map::new()))),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if let Some(kept) = compact_node(value, f)? {
                    out.insert(key.clone(), kept);
                }
            }
            Ok((!out.is_empty()).then_some(Value::Object(out)))
        }
        leaf => f(leaf).map(|mapped| to_value(&mapped)).transpose(),
    }
}
