//! Dynamic JSON-like values with serde adapters and a permissive typed bridge.
//!
//! [`Value`] holds any JSON-shaped data. It can be decoded from any
//! self-describing serde source, encoded into any serde sink, and converted
//! to and from concrete Rust types. The typed direction coerces scalars
//! (`"2"` reads as an integer, `1` as `true`) and reports failures with the
//! coding path of the offending element.
//!
//! ```
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Record {
//!     id: u32,
//!     arr: Vec<i32>,
//! }
//!
//! let value = json_dyn::from_str(r#"{"id": 5, "arr": [1, "2", 3.4]}"#).unwrap();
//! assert_eq!(value["arr"][1].as_str(), Some("2"));
//!
//! let record: Record = value.decode().unwrap();
//! assert_eq!(record.id, 5);
//! assert_eq!(record.arr, vec![1, 2, 3]);
//! ```

mod bridge;
mod coerce;
mod config;
mod de;
mod error;
mod ser;
mod transform;
mod value;

use std::io;

use serde::Serialize;

pub use bridge::{from_value, from_value_with, to_value, Decoder, Encoder};
pub use coerce::{coerced, encoded, Blob, FromValue};
pub use config::{Config, DEFAULT_MAX_DEPTH};
pub use de::ValueSeed;
pub use error::{Error, Result};
pub use json_dyn_path::{CodingPath, PathSegment};
pub use value::{Iter, Map, Value, ValueKind};

// ── JSON text ────────────────────────────────────────────────────────────

/// Parses JSON text into a [`Value`].
pub fn from_str(text: &str) -> Result<Value> {
    from_str_with(text, &Config::default())
}

pub fn from_str_with(text: &str, config: &Config) -> Result<Value> {
    from_json(serde_json::Deserializer::from_str(text), config)
}

pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    from_json(serde_json::Deserializer::from_slice(bytes), &Config::default())
}

pub fn from_reader<R: io::Read>(reader: R) -> Result<Value> {
    from_json(serde_json::Deserializer::from_reader(reader), &Config::default())
}

fn from_json<'de, R>(mut deserializer: serde_json::Deserializer<R>, config: &Config) -> Result<Value>
where
    R: serde_json::de::Read<'de>,
{
    // Recursion is bounded by `config.max_depth` inside the seed instead.
    deserializer.disable_recursion_limit();
    let value = Value::from_deserializer_with(&mut deserializer, config)?;
    deserializer.end()?;
    Ok(value)
}

/// Compact JSON text.
pub fn to_string<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_string_pretty<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn to_vec<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn to_writer<W: io::Write, T: ?Sized + Serialize>(writer: W, value: &T) -> Result<()> {
    Ok(serde_json::to_writer(writer, value)?)
}
