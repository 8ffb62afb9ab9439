//! Decode adapter: materializes a [`Value`] from any self-describing serde
//! source.
//!
//! The shape is discovered from the source's own type tags. A mapping
//! becomes an `Object`, a sequence becomes an `Array`, and a single value is
//! matched against null, bool, 64-bit integer, double and string in that
//! order. Strings are never reinterpreted here: `"true"` stays a string.
//! Textual coercion belongs to the typed decoder.

use std::cell::RefCell;
use std::fmt;

use json_dyn_path::CodingPath;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::{Map, Value};

/// Where a seed records the structural failure it raised, so callers that
/// own the slot get the typed [`Error`] back instead of the source's
/// stringified one.
type Failure = RefCell<Option<Error>>;

/// Decodes a [`Value`] with a bounded nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct ValueSeed<'a> {
    max_depth: usize,
    depth: usize,
    failure: Option<&'a Failure>,
}

impl ValueSeed<'static> {
    pub fn new(config: &Config) -> Self {
        ValueSeed {
            max_depth: config.max_depth,
            depth: 0,
            failure: None,
        }
    }
}

impl<'a> ValueSeed<'a> {
    fn recording(config: &Config, failure: &'a Failure) -> Self {
        ValueSeed {
            max_depth: config.max_depth,
            depth: 0,
            failure: Some(failure),
        }
    }

    fn nested(self) -> Self {
        ValueSeed {
            depth: self.depth + 1,
            ..self
        }
    }

    fn fail<E: de::Error>(&self, err: Error) -> E {
        let custom = E::custom(&err);
        if let Some(slot) = self.failure {
            slot.replace(Some(err));
        }
        custom
    }

    fn enter<E: de::Error>(self) -> Result<Self, E> {
        if self.depth >= self.max_depth {
            tracing::debug!(limit = self.max_depth, "decode depth limit exceeded");
            return Err(self.fail(Error::DepthLimitExceeded {
                limit: self.max_depth,
                path: CodingPath::root(),
            }));
        }
        Ok(self.nested())
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor { seed: self })
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        ValueSeed::new(&Config::default()).deserialize(deserializer)
    }
}

impl Value {
    /// Decodes a value from `deserializer` using `config` limits.
    ///
    /// Structural failures come back as their own variants
    /// ([`Error::DepthLimitExceeded`], [`Error::UnrecognizedScalar`],
    /// [`Error::InvalidShape`]); any other source error is converted with
    /// `Into<Error>`.
    pub fn from_deserializer_with<'de, D>(deserializer: D, config: &Config) -> Result<Value>
    where
        D: Deserializer<'de>,
        D::Error: Into<Error>,
    {
        let failure = Failure::default();
        let decoded = ValueSeed::recording(config, &failure).deserialize(deserializer);
        decoded.map_err(|err| failure.take().unwrap_or_else(|| err.into()))
    }
}

struct ValueVisitor<'a> {
    seed: ValueSeed<'a>,
}

impl<'de> Visitor<'de> for ValueVisitor<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping, a sequence or a null, bool, integer, double or string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.seed.deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.seed.deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Double(v as f64),
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Double(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        match std::str::from_utf8(v) {
            Ok(s) => Ok(Value::String(s.to_string())),
            Err(_) => Err(self.seed.fail(Error::UnrecognizedScalar {
                path: CodingPath::root(),
            })),
        }
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Value, E> {
        match String::from_utf8(v) {
            Ok(s) => Ok(Value::String(s)),
            Err(_) => Err(self.seed.fail(Error::UnrecognizedScalar {
                path: CodingPath::root(),
            })),
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let child = self.seed.enter::<A::Error>()?;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element_seed(child)? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let child = self.seed.enter::<A::Error>()?;
        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some(key) = access.next_key_seed(KeySeed)? {
            let value = access.next_value_seed(child)?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }

    fn visit_enum<A>(self, _data: A) -> Result<Value, A::Error>
    where
        A: de::EnumAccess<'de>,
    {
        Err(self.seed.fail(Error::InvalidShape {
            path: CodingPath::root(),
        }))
    }
}

/// Object keys are text; scalar keys from formats that allow them are
/// rendered to their canonical string.
struct KeySeed;

impl<'de> DeserializeSeed<'de> for KeySeed {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for KeySeed {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::value::{
        BytesDeserializer, EnumAccessDeserializer, Error as PlainError, MapDeserializer,
        SeqDeserializer, StrDeserializer,
    };
    use serde::de::IntoDeserializer;

    fn decode_json(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn keyed_source_becomes_object() {
        let value = decode_json(r#"{"id": 5, "arr": [1, "2", 3.4], "nested": {"x": 1}}"#);
        assert_eq!(value["id"], Value::Int(5));
        assert_eq!(value["arr"][1], Value::from("2"));
        assert_eq!(value["arr"][2], Value::Double(3.4));
        assert_eq!(value["nested"]["x"], Value::Int(1));
    }

    #[test]
    fn scalars_keep_source_type() {
        assert_eq!(decode_json("null"), Value::Null);
        assert_eq!(decode_json("true"), Value::Bool(true));
        assert_eq!(decode_json(r#""true""#), Value::from("true"));
        assert_eq!(decode_json("-12"), Value::Int(-12));
        assert_eq!(decode_json("12.0"), Value::Double(12.0));
        assert_eq!(
            decode_json("18446744073709551615"),
            Value::Double(18446744073709551615.0)
        );
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = Config::default().with_max_depth(2);
        let mut ok = serde_json::Deserializer::from_str("[[1]]");
        assert!(Value::from_deserializer_with(&mut ok, &config).is_ok());

        let mut deep = serde_json::Deserializer::from_str("[[[1]]]");
        let err = Value::from_deserializer_with(&mut deep, &config).unwrap_err();
        assert!(
            matches!(err, Error::DepthLimitExceeded { limit: 2, .. }),
            "{err:?}"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn undecodable_bytes_are_unrecognized_scalars() {
        let source = BytesDeserializer::<Error>::new(&[0xff, 0xfe]);
        let err = Value::from_deserializer_with(source, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedScalar { .. }), "{err:?}");
        assert!(err.is_structural());

        let source = BytesDeserializer::<Error>::new(b"ok");
        let value = Value::from_deserializer_with(source, &Config::default()).unwrap();
        assert_eq!(value, Value::from("ok"));
    }

    #[test]
    fn enum_sources_have_no_shape() {
        let access: StrDeserializer<Error> = "Unit".into_deserializer();
        let source = EnumAccessDeserializer::new(access);
        let err = Value::from_deserializer_with(source, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidShape { .. }), "{err:?}");
        assert!(err.is_structural());
    }

    #[test]
    fn source_errors_pass_through() {
        let mut broken = serde_json::Deserializer::from_str("[1,");
        let err = Value::from_deserializer_with(&mut broken, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{err:?}");
        assert!(!err.is_structural());
    }

    #[test]
    fn non_json_sources_are_accepted() {
        let seq = SeqDeserializer::<_, PlainError>::new(vec![1u32, 2, 3].into_iter());
        let value = Value::deserialize(seq).unwrap();
        assert_eq!(value, Value::from(vec![1, 2, 3]));

        let map = MapDeserializer::<_, PlainError>::new(vec![(7u8, "seven")].into_iter());
        let value = Value::deserialize(map).unwrap();
        assert_eq!(value["7"], Value::from("seven"));

        let bytes: Result<Value, PlainError> =
            Value::deserialize(BytesDeserializer::new(&[0xff, 0xfe]));
        assert!(bytes.is_err());

        let text: StrDeserializer<PlainError> = "plain".into_deserializer();
        let value = Value::deserialize(text).unwrap();
        assert_eq!(value, Value::from("plain"));
    }
}
