//! Error types for the minification pipeline.
use thiserror::Error;

/// Errors raised by the library.
///
/// None of these ever escape the per-artifact boundary of the
/// pipeline, they are turned into diagnostics or log records.
#[derive(Debug, Error)]
pub enum Error {
    /// A native warning without a `[file:line,column]` marker.
    #[error("warning does not carry a position marker: {0}")]
    UnmarkedWarning(String),

    /// Source map could not be decoded or encoded.
    #[error("invalid source map: {0}")]
    SourceMap(#[from] sourcemap::Error),

    /// Error converting to or from JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Input/output error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for the library.
pub type Result<T> = std::result::Result<T, Error>;
