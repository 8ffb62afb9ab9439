//! Typed bridge between [`Value`] and Rust types with serde impls.
//!
//! Decoding goes through [`Decoder`], which coerces scalars and stamps every
//! error with the path of the element that failed. Encoding goes through
//! [`Encoder`] and never coerces.

mod decoder;
mod encoder;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::value::Value;

pub use decoder::Decoder;
pub use encoder::Encoder;

/// Encodes `value` into a [`Value`].
pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value> {
    value.serialize(Encoder)
}

/// Decodes an owned `T` out of `value` with the default [`Config`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(Decoder::new(&value))
}

pub fn from_value_with<T: DeserializeOwned>(value: Value, config: Config) -> Result<T> {
    T::deserialize(Decoder::with_config(&value, config))
}

impl Value {
    /// Decodes `T` from this value. Strings may be borrowed.
    pub fn decode<'de, T: Deserialize<'de>>(&'de self) -> Result<T> {
        T::deserialize(Decoder::new(self))
    }

    pub fn decode_with<'de, T: Deserialize<'de>>(&'de self, config: Config) -> Result<T> {
        T::deserialize(Decoder::with_config(self, config))
    }

    /// Encodes `value`; the inverse of [`Value::decode`].
    pub fn encode<T: ?Sized + Serialize>(value: &T) -> Result<Value> {
        to_value(value)
    }

    /// Decodes `T`, returning `fallback` when this value is `Null` or the
    /// decode fails.
    pub fn decode_or<T: DeserializeOwned>(&self, fallback: T) -> T {
        self.decode_or_else(|| fallback)
    }

    /// Like [`Value::decode_or`], but the fallback is only built when needed.
    pub fn decode_or_else<T, F>(&self, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        if self.is_null() {
            return fallback();
        }
        match self.decode() {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!(error = %err, "typed decode failed, using fallback");
                fallback()
            }
        }
    }
}
