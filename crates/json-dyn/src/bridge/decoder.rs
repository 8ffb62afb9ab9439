//! `serde::Deserializer` over a borrowed [`Value`].
//!
//! The decoder answers every type hint by applying the coercion table in
//! [`crate::coerce`], so a derived struct reads `"2"` as an integer field and
//! `1` as a boolean one. Every error leaves carrying the coding path of the
//! innermost element that produced it.

use std::iter::Enumerate;
use std::slice;

use json_dyn_path::{CodingPath, PathSegment};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, Unexpected, VariantAccess,
    Visitor,
};
use serde::forward_to_deserialize_any;

use crate::coerce::{Blob, FromValue};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::{Map, Value, ValueKind};

/// Decodes typed data out of a borrowed [`Value`].
#[derive(Debug, Clone)]
pub struct Decoder<'de> {
    value: &'de Value,
    path: CodingPath,
    depth: usize,
    config: Config,
}

impl<'de> Decoder<'de> {
    pub fn new(value: &'de Value) -> Self {
        Self::with_config(value, Config::default())
    }

    pub fn with_config(value: &'de Value, config: Config) -> Self {
        Decoder {
            value,
            path: CodingPath::root(),
            depth: 0,
            config,
        }
    }

    pub fn value(&self) -> &'de Value {
        self.value
    }

    pub fn path(&self) -> &CodingPath {
        &self.path
    }

    fn child(&self, value: &'de Value, segment: PathSegment) -> Result<Decoder<'de>> {
        let mut path = self.path.clone();
        path.push(segment);
        if self.depth >= self.config.max_depth {
            tracing::debug!(limit = self.config.max_depth, %path, "typed decode depth limit exceeded");
            return Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
                path,
            });
        }
        Ok(Decoder {
            value,
            path,
            depth: self.depth + 1,
            config: self.config,
        })
    }

    fn coerce<T: FromValue>(&self, native: ValueKind) -> Result<T> {
        let kind = self.value.kind();
        if kind != native && kind != ValueKind::Null {
            tracing::trace!(path = %self.path, from = %kind, to = %native, "coercing scalar");
        }
        T::from_value(self.value).map_err(|err: Error| err.at_path(&self.path))
    }

    fn mismatch(&self, target: &'static str) -> Error {
        Error::conversion(target, self.value).at_path(&self.path)
    }

    fn visit_array<V: Visitor<'de>>(&self, items: &'de [Value], visitor: V) -> Result<V::Value> {
        let mut seq = SeqDecoder::new(self, items);
        let out = visitor
            .visit_seq(&mut seq)
            .map_err(|err: Error| err.at_path(&self.path))?;
        seq.finish().map_err(|err: Error| err.at_path(&self.path))?;
        Ok(out)
    }

    fn visit_object<V: Visitor<'de>>(&self, map: &'de Map, visitor: V) -> Result<V::Value> {
        let mut entries = MapDecoder::new(self, map);
        let out = visitor
            .visit_map(&mut entries)
            .map_err(|err: Error| err.at_path(&self.path))?;
        entries.finish().map_err(|err: Error| err.at_path(&self.path))?;
        Ok(out)
    }
}

macro_rules! decode_scalar {
    ($($method:ident => $ty:ty, $native:ident, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                if !self.config.lenient_scalars {
                    return self.deserialize_any(visitor);
                }
                let scalar: $ty = self.coerce(ValueKind::$native)?;
                visitor.$visit(scalar).map_err(|err: Error| err.at_path(&self.path))
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Decoder<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let visited = match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(n) => visitor.visit_i64(*n),
            Value::Double(d) => visitor.visit_f64(*d),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(items) => return self.visit_array(items, visitor),
            Value::Object(map) => return self.visit_object(map, visitor),
        };
        visited.map_err(|err: Error| err.at_path(&self.path))
    }

    decode_scalar! {
        deserialize_bool => bool, Bool, visit_bool;
        deserialize_i8 => i8, Int, visit_i8;
        deserialize_i16 => i16, Int, visit_i16;
        deserialize_i32 => i32, Int, visit_i32;
        deserialize_i64 => i64, Int, visit_i64;
        deserialize_i128 => i128, Int, visit_i128;
        deserialize_u8 => u8, Int, visit_u8;
        deserialize_u16 => u16, Int, visit_u16;
        deserialize_u32 => u32, Int, visit_u32;
        deserialize_u64 => u64, Int, visit_u64;
        deserialize_u128 => u128, Int, visit_u128;
        deserialize_f32 => f32, Double, visit_f32;
        deserialize_f64 => f64, Double, visit_f64;
        deserialize_char => char, String, visit_char;
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let value = self.value;
        match value {
            Value::String(s) => visitor
                .visit_borrowed_str(s)
                .map_err(|err: Error| err.at_path(&self.path)),
            _ if !self.config.lenient_scalars => self.deserialize_any(visitor),
            _ => {
                let text: String = self.coerce(ValueKind::String)?;
                visitor
                    .visit_string(text)
                    .map_err(|err: Error| err.at_path(&self.path))
            }
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if !self.config.lenient_scalars {
            return self.deserialize_any(visitor);
        }
        let blob: Blob = self.coerce(ValueKind::String)?;
        visitor
            .visit_byte_buf(blob.into_inner())
            .map_err(|err: Error| err.at_path(&self.path))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let value = self.value;
        match value {
            Value::Null => visitor.visit_none().map_err(|err: Error| err.at_path(&self.path)),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit().map_err(|err: Error| err.at_path(&self.path)),
            _ => Err(self.mismatch("unit")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(items) => self.visit_array(items, visitor),
            _ => Err(self.mismatch("array")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(items) if items.len() < len => Err(Error::IndexOutOfBounds {
                index: items.len(),
                len: items.len(),
                path: self.path.clone(),
            }),
            Value::Array(items) => self.visit_array(items, visitor),
            _ => Err(self.mismatch("array")),
        }
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Object(map) => self.visit_object(map, visitor),
            _ => Err(self.mismatch("object")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::Object(map) => self.visit_object(map, visitor),
            Value::Array(items) => self.visit_array(items, visitor),
            _ => Err(self.mismatch("object")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let (variant, content) = match self.value {
            Value::String(variant) => (variant.as_str(), None),
            Value::Object(map) if map.len() == 1 => match map.first() {
                Some((variant, content)) => (variant.as_str(), Some(content)),
                None => return Err(self.mismatch("enum")),
            },
            _ => return Err(self.mismatch("enum")),
        };
        visitor
            .visit_enum(EnumDecoder {
                parent: &self,
                variant,
                content,
            })
            .map_err(|err: Error| err.at_path(&self.path))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

// ── Sequences ────────────────────────────────────────────────────────────

struct SeqDecoder<'a, 'de> {
    parent: &'a Decoder<'de>,
    iter: Enumerate<slice::Iter<'de, Value>>,
}

impl<'a, 'de> SeqDecoder<'a, 'de> {
    fn new(parent: &'a Decoder<'de>, items: &'de [Value]) -> Self {
        SeqDecoder {
            parent,
            iter: items.iter().enumerate(),
        }
    }

    fn finish(self) -> Result<()> {
        match self.iter.len() {
            0 => Ok(()),
            remaining => Err(de::Error::invalid_length(
                remaining,
                &"fewer elements in array",
            )),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDecoder<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((index, item)) => {
                let child = self.parent.child(item, PathSegment::Index(index))?;
                seed.deserialize(child).map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

// ── Objects ──────────────────────────────────────────────────────────────

struct MapDecoder<'a, 'de> {
    parent: &'a Decoder<'de>,
    iter: indexmap::map::Iter<'de, String, Value>,
    pending: Option<(&'de str, &'de Value)>,
}

impl<'a, 'de> MapDecoder<'a, 'de> {
    fn new(parent: &'a Decoder<'de>, map: &'de Map) -> Self {
        MapDecoder {
            parent,
            iter: map.iter(),
            pending: None,
        }
    }

    fn finish(self) -> Result<()> {
        match self.iter.len() {
            0 => Ok(()),
            remaining => Err(de::Error::invalid_length(
                remaining,
                &"fewer entries in object",
            )),
        }
    }
}

impl<'de> MapAccess<'de> for MapDecoder<'_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some((key.as_str(), value));
        seed.deserialize(MapKeyDecoder { key })
            .map(Some)
            .map_err(|err| err.at_path(&self.parent.path.key(key)))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.pending.take() else {
            return Err(de::Error::custom("object value requested before its key"));
        };
        let child = self.parent.child(value, PathSegment::Key(key.to_string()))?;
        seed.deserialize(child)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Object keys are always text; numeric and boolean key hints parse it.
struct MapKeyDecoder<'de> {
    key: &'de str,
}

impl MapKeyDecoder<'_> {
    fn parse<T: std::str::FromStr>(&self, target: &'static str) -> Result<T> {
        self.key
            .parse()
            .map_err(|_| Error::conversion(target, &Value::from(self.key)))
    }
}

macro_rules! decode_key {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for MapKeyDecoder<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.key)
    }

    decode_key! {
        deserialize_bool => bool, visit_bool;
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(BorrowedStrDeserializer::<Error>::new(self.key))
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct seq tuple tuple_struct
        map struct identifier ignored_any
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Externally tagged enums: a bare string names a unit variant, a
/// single-entry object names a variant and carries its content.
struct EnumDecoder<'a, 'de> {
    parent: &'a Decoder<'de>,
    variant: &'de str,
    content: Option<&'de Value>,
}

impl<'a, 'de> EnumAccess<'de> for EnumDecoder<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: DeserializeSeed<'de>,
    {
        let tag = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((tag, self))
    }
}

impl<'de> EnumDecoder<'_, 'de> {
    fn content(&self, expected: &'static str) -> Result<Decoder<'de>> {
        match self.content {
            Some(content) => self
                .parent
                .child(content, PathSegment::Key(self.variant.to_string())),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &expected)),
        }
    }
}

impl<'de> VariantAccess<'de> for EnumDecoder<'_, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.content {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(Error::conversion("unit variant", other)
                .at_path(&self.parent.path.key(self.variant))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.content("newtype variant")?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        Deserializer::deserialize_tuple(self.content("tuple variant")?, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        Deserializer::deserialize_struct(self.content("struct variant")?, "", fields, visitor)
    }
}
