//! Error type shared by the adapters, the typed bridge and the accessors.

use std::fmt::Display;

use json_dyn_path::CodingPath;
use thiserror::Error;

use crate::value::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source exposed none of the keyed, sequence or single-value shapes.
    #[error("invalid shape at {}", at(.path))]
    InvalidShape { path: CodingPath },
    /// A single-value source matched none of null, bool, integer, double, string.
    #[error("unrecognized scalar at {}", at(.path))]
    UnrecognizedScalar { path: CodingPath },
    #[error("nesting exceeds depth limit of {limit} at {}", at(.path))]
    DepthLimitExceeded { limit: usize, path: CodingPath },
    #[error("key `{key}` not found at {}", at(.path))]
    KeyNotFound { key: String, path: CodingPath },
    #[error("index {index} out of bounds for length {len} at {}", at(.path))]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        path: CodingPath,
    },
    #[error("cannot convert {} to {target} at {}", .value.kind(), at(.path))]
    Conversion {
        target: &'static str,
        value: Box<Value>,
        path: CodingPath,
    },
    #[error("encoding error: {message}")]
    Encoding { message: String },
    #[error("{message} at {}", at(.path))]
    Message { message: String, path: CodingPath },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn at(path: &CodingPath) -> String {
    if path.is_root() {
        "root".to_string()
    } else {
        format!("`{path}`")
    }
}

impl Error {
    pub(crate) fn conversion(target: &'static str, value: &Value) -> Self {
        Error::Conversion {
            target,
            value: Box::new(value.clone()),
            path: CodingPath::root(),
        }
    }

    pub(crate) fn encoding(message: impl Display) -> Self {
        Error::Encoding {
            message: message.to_string(),
        }
    }

    /// Coding path where the error was raised, when it has one.
    pub fn path(&self) -> Option<&CodingPath> {
        match self {
            Error::InvalidShape { path }
            | Error::UnrecognizedScalar { path }
            | Error::DepthLimitExceeded { path, .. }
            | Error::KeyNotFound { path, .. }
            | Error::IndexOutOfBounds { path, .. }
            | Error::Conversion { path, .. }
            | Error::Message { path, .. } => Some(path),
            Error::Encoding { .. } | Error::Json(_) => None,
        }
    }

    /// True for errors raised because the input had no recognizable structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::InvalidShape { .. }
                | Error::UnrecognizedScalar { .. }
                | Error::DepthLimitExceeded { .. }
        )
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion { .. })
    }

    /// Records `at` as the error location unless a deeper location is set.
    ///
    /// Errors bubble outwards through nested decoders, so the innermost
    /// decoder stamps first and outer ones leave the path alone.
    pub(crate) fn at_path(mut self, at: &CodingPath) -> Self {
        if let Some(path) = self.path_mut() {
            if path.is_root() && !at.is_root() {
                *path = at.clone();
            }
        }
        self
    }

    fn path_mut(&mut self) -> Option<&mut CodingPath> {
        match self {
            Error::InvalidShape { path }
            | Error::UnrecognizedScalar { path }
            | Error::DepthLimitExceeded { path, .. }
            | Error::KeyNotFound { path, .. }
            | Error::IndexOutOfBounds { path, .. }
            | Error::Conversion { path, .. }
            | Error::Message { path, .. } => Some(path),
            Error::Encoding { .. } | Error::Json(_) => None,
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message {
            message: msg.to_string(),
            path: CodingPath::root(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Error::KeyNotFound {
            key: field.to_string(),
            path: CodingPath::root(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::encoding(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_pointer_paths() {
        let err = Error::KeyNotFound {
            key: "id".into(),
            path: CodingPath::root().key("user").index(2),
        };
        assert_eq!(err.to_string(), "key `id` not found at `/user/2`");

        let err = Error::conversion("i64", &Value::from("abc"));
        assert_eq!(err.to_string(), "cannot convert string to i64 at root");
    }

    #[test]
    fn innermost_path_wins() {
        let inner = CodingPath::root().key("a").key("b");
        let outer = CodingPath::root().key("a");
        let err = Error::conversion("bool", &Value::Null)
            .at_path(&inner)
            .at_path(&outer);
        assert_eq!(err.path(), Some(&inner));
    }

    #[test]
    fn encoding_errors_have_no_path() {
        let mut err = Error::encoding("boom");
        err = err.at_path(&CodingPath::root().key("x"));
        assert!(err.path().is_none());
        assert!(!err.is_structural());
    }
}
