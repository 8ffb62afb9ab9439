//! Decoder configuration.

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for the decode adapter and the typed decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum container nesting before decoding fails with
    /// [`Error::DepthLimitExceeded`](crate::Error::DepthLimitExceeded).
    pub max_depth: usize,
    /// When false the typed decoder performs no cross-variant scalar
    /// coercion; every scalar must already have the requested variant.
    pub lenient_scalars: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            lenient_scalars: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_lenient_scalars(mut self, lenient: bool) -> Self {
        self.lenient_scalars = lenient;
        self
    }
}
