//! Scalar coercion rules.
//!
//! [`FromValue`] converts a [`Value`] into a concrete scalar type, accepting
//! neighbouring variants where the conversion is well defined (a numeric
//! string to an integer, a nonzero number to `true`, and so on). Anything
//! outside those rules is an [`Error::Conversion`]. The reverse direction is
//! the plain `From<T> for Value` family.
//!
//! | target        | accepted variants            |
//! |---------------|------------------------------|
//! | `bool`        | Bool, Int, Double, String    |
//! | integers      | Bool, Int, Double, String    |
//! | `f32`/`f64`   | Bool, Int, Double, String    |
//! | `String`      | Bool, Int, Double, String    |
//! | `char`        | single-character String      |
//! | [`Blob`]      | base64 String                |
//! | `Url`         | String                       |
//! | `DateTime`    | Int, Double (epoch seconds), RFC 3339 String |
//! | `Option<T>`   | Null, or whatever `T` accepts |
//! | `Value`       | anything                     |

use std::fmt;

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::{Error, Result};
use crate::value::Value;

/// Conversion from a dynamic value into a concrete scalar type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

impl Value {
    /// Applies the coercion rules for `T` to this value.
    pub fn coerce<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }
}

/// Canonical text of a double: shortest round-trip JSON number text for
/// finite values with an unsigned exponent (`1e21`, `1e-7`), Rust's float
/// formatting (`NaN`, `inf`) otherwise.
pub(crate) fn canonical_double(d: f64) -> String {
    match serde_json::Number::from_f64(d) {
        Some(n) => n.to_string().replacen("e+", "e", 1),
        None => d.to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Double(d) => Ok(*d != 0.0),
            Value::String(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::conversion("bool", value)),
            },
            _ => Err(Error::conversion("bool", value)),
        }
    }
}

// Doubles truncate toward zero. Non-finite doubles and results outside the
// target width are errors, never wrapped or saturated.
fn coerce_integer(value: &Value, target: &'static str) -> Result<i128> {
    // i128::MIN and i128::MAX both land on +-2^127 as f64.
    const BOUND: f64 = i128::MAX as f64;
    match value {
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Int(n) => Ok(i128::from(*n)),
        Value::Double(d) if d.is_finite() && d.trunc() >= -BOUND && d.trunc() < BOUND => {
            Ok(d.trunc() as i128)
        }
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|_| Error::conversion(target, value)),
        _ => Err(Error::conversion(target, value)),
    }
}

macro_rules! integer_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let wide = coerce_integer(value, stringify!($ty))?;
                    <$ty>::try_from(wide).map_err(|_| Error::conversion(stringify!($ty), value))
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

fn coerce_float(value: &Value, target: &'static str) -> Result<f64> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int(n) => Ok(*n as f64),
        Value::Double(d) => Ok(*d),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| Error::conversion(target, value)),
        _ => Err(Error::conversion(target, value)),
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        coerce_float(value, "f64")
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = coerce_float(value, "f32")?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(Error::conversion("f32", value));
        }
        Ok(narrow)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Double(d) => Ok(canonical_double(*d)),
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::conversion("string", value)),
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Result<Self> {
        if let Value::String(s) = value {
            let mut chars = s.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                return Ok(ch);
            }
        }
        Err(Error::conversion("char", value))
    }
}

impl FromValue for Url {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Url::parse(s).map_err(|_| Error::conversion("url", value)),
            _ => Err(Error::conversion("url", value)),
        }
    }
}

impl From<Url> for Value {
    fn from(value: Url) -> Self {
        Value::String(value.into())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        let parsed = match value {
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0),
            Value::Double(secs) if secs.is_finite() => {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            }
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        };
        parsed.ok_or_else(|| Error::conversion("datetime", value))
    }
}

/// Encodes as seconds since the Unix epoch.
impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        let secs = value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
        Value::Double(secs)
    }
}

/// `deserialize_with` adapter that reads a field through [`FromValue`].
///
/// Lets derived types opt into the full coercion table for fields whose own
/// `Deserialize` impl is stricter, e.g. a `DateTime<Utc>` stored as epoch
/// seconds:
///
/// ```
/// use chrono::{DateTime, Utc};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Event {
///     #[serde(deserialize_with = "json_dyn::coerced")]
///     at: DateTime<Utc>,
/// }
///
/// let value = json_dyn::from_str(r#"{"at": 86400}"#).unwrap();
/// let event: Event = value.decode().unwrap();
/// assert_eq!(event.at.timestamp(), 86_400);
/// ```
pub fn coerced<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromValue,
{
    let value = Value::deserialize(deserializer)?;
    T::from_value(&value).map_err(|err| match err {
        Error::Conversion { target, value, .. } => {
            de::Error::custom(format_args!("cannot convert {} to {target}", value.kind()))
        }
        other => de::Error::custom(other),
    })
}

/// `serialize_with` counterpart of [`coerced`]: writes a field through its
/// `From<T> for Value` conversion instead of its own `Serialize` impl.
///
/// Derived types opt in per field. Temporal fields need it to encode as
/// epoch seconds rather than chrono's RFC 3339 text:
///
/// ```
/// use chrono::{DateTime, Utc};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Event {
///     #[serde(serialize_with = "json_dyn::encoded")]
///     at: DateTime<Utc>,
/// }
///
/// let at = DateTime::from_timestamp(86_400, 0).unwrap();
/// let value = json_dyn::to_value(&Event { at }).unwrap();
/// assert_eq!(value["at"], json_dyn::Value::Double(86_400.0));
/// ```
pub fn encoded<T, S>(field: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Clone + Into<Value>,
    S: Serializer,
{
    let value: Value = field.clone().into();
    value.serialize(serializer)
}

// ── Binary ───────────────────────────────────────────────────────────────

/// Binary payload carried through a dynamic value as a standard base64
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Blob(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Option<Self> {
        general_purpose::STANDARD.decode(encoded).ok().map(Blob)
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl FromValue for Blob {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Blob::from_base64(s).ok_or_else(|| Error::conversion("blob", value)),
            _ => Err(Error::conversion("blob", value)),
        }
    }
}

impl From<Blob> for Value {
    fn from(value: Blob) -> Self {
        Value::String(value.to_base64())
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BlobVisitor;

        impl<'de> Visitor<'de> for BlobVisitor {
            type Value = Blob;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("bytes or a base64 string")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Blob, E> {
                Ok(Blob(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Blob, E> {
                Ok(Blob(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Blob, E> {
                Blob::from_base64(v).ok_or_else(|| E::custom("invalid base64 payload"))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Blob, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(Blob(bytes))
            }
        }

        deserializer.deserialize_byte_buf(BlobVisitor)
    }
}
