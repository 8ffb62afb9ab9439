//! Coding paths for json-dyn.
//!
//! A [`CodingPath`] records the keys and indices traversed while a typed
//! value is decoded from, or encoded into, a dynamic JSON value. Paths are
//! rendered as RFC 6901 JSON Pointers, and the same module parses pointers
//! back into unescaped tokens for navigation.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("json pointer must be absolute or empty")]
    NotAbsolute,
}

/// One step of a coding path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

impl PathSegment {
    /// Returns the key when this segment addresses an object member.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    /// Returns the index when this segment addresses an array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(index) => Some(*index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(&escape_component(key)),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Ordered list of segments from the root to the current position.
///
/// `Display` renders the path as a JSON Pointer (`""` for the root).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CodingPath {
    segments: Vec<PathSegment>,
}

impl CodingPath {
    /// The empty path addressing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Returns a new path extended by an object key.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Returns a new path extended by an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Render as an RFC 6901 JSON Pointer.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&segment.to_string());
        }
        out
    }

    /// Render as a bracketed JSONPath string, e.g. `$['a'][0]`.
    pub fn to_json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    out.push_str("['");
                    out.push_str(&escape_single_quoted(key));
                    out.push_str("']");
                }
                PathSegment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

impl FromIterator<PathSegment> for CodingPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CodingPath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Unescapes one JSON Pointer token component.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes one JSON Pointer token component.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse an absolute pointer into unescaped tokens.
///
/// - `"" -> []`
/// - `"/" -> [""]`
/// - `"/a~1b/~0k/0" -> ["a/b", "~k", "0"]`
pub fn parse_json_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::NotAbsolute);
    }
    Ok(pointer.split('/').skip(1).map(unescape_component).collect())
}

/// Parse a token as an array index.
///
/// Leading zeros and signs are rejected, as RFC 6901 requires.
pub fn parse_index_token(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn escape_single_quoted(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out
}
