//! Uniform iteration over `(key, element)` pairs.

use std::borrow::Cow;
use std::iter::FusedIterator;

use super::Value;

/// Lazy iterator returned by [`Value::iter`].
///
/// - objects yield `(Some(key), value)` in insertion order,
/// - arrays yield `(None, element)`,
/// - strings yield `(None, Value::String(ch))` once per Unicode scalar value,
/// - every other variant yields nothing.
pub struct Iter<'a> {
    inner: IterInner<'a>,
}

enum IterInner<'a> {
    Object(indexmap::map::Iter<'a, String, Value>),
    Array(std::slice::Iter<'a, Value>),
    Chars(std::str::Chars<'a>),
    Empty,
}

impl Value {
    /// Iterates this value; calling it again restarts from the beginning.
    pub fn iter(&self) -> Iter<'_> {
        let inner = match self {
            Value::Object(map) => IterInner::Object(map.iter()),
            Value::Array(items) => IterInner::Array(items.iter()),
            Value::String(s) => IterInner::Chars(s.chars()),
            _ => IterInner::Empty,
        };
        Iter { inner }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Option<&'a str>, Cow<'a, Value>);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Object(entries) => entries
                .next()
                .map(|(key, value)| (Some(key.as_str()), Cow::Borrowed(value))),
            IterInner::Array(items) => items.next().map(|item| (None, Cow::Borrowed(item))),
            IterInner::Chars(chars) => chars
                .next()
                .map(|ch| (None, Cow::Owned(Value::String(ch.to_string())))),
            IterInner::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Object(entries) => entries.size_hint(),
            IterInner::Array(items) => items.size_hint(),
            IterInner::Chars(chars) => chars.size_hint(),
            IterInner::Empty => (0, Some(0)),
        }
    }
}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Value {
    type Item = (Option<&'a str>, Cow<'a, Value>);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
