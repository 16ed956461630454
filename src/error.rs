// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the decoding library.

use std::fmt;

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Main error type for the decoding library.
///
/// Configuration and shape errors are fatal: they are raised when a pipeline is
/// built or when a tensor enters decode, and never degrade into skipped rows.
#[derive(Debug)]
pub enum DecodeError {
    /// Invalid configuration (thresholds, input size, unknown model variant).
    ConfigError(String),
    /// Tensor or row layout does not match the configured model variant.
    ///
    /// A configuration-class failure, split from [`DecodeError::ConfigError`]
    /// because it is detected when a tensor enters decode rather than when the
    /// pipeline is built. Covers channel count, row length, rank and batch size.
    ShapeError(String),
    /// Malformed tensor file contents.
    ParseError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::ShapeError(msg) => write!(f, "Shape error: {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DecodeError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::ShapeError(err.to_string())
    }
}

impl DecodeError {
    /// Returns whether this error stems from configuration or tensor layout,
    /// i.e. it will recur on every call until the caller fixes its setup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::ShapeError(_))
    }
}
