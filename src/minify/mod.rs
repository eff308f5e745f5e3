//! Adapter around the external minification transform.
//!
//! The transform is consumed through the [Minifier] trait. [run]
//! prepares a request for one artifact, threads a [CommentCollector]
//! through the call and hands back the outcome together with the
//! extracted comments.
use std::fmt;

use crate::comments::{CommentCollector, CommentHook, CommentRecord};
use crate::config::{ResolvedConfig, TransformOptions};
use crate::map::{Position, ProvenanceMap};

mod swc;

pub use self::swc::SwcMinifier;

/// Output map requested from the minifier.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SourceMapRequest<'a> {
    /// Name of the generated file.
    pub filename: &'a str,
    /// Source root.
    pub root: &'a str,
}

/// Request to minify one artifact.
#[derive(Debug, Clone, Copy)]
pub struct MinifyRequest<'a> {
    /// Artifact name, used in position markers.
    pub file: &'a str,
    /// Text to minify.
    pub source: &'a str,
    /// Options for the transform.
    pub options: &'a TransformOptions,
    /// Output map request, none when maps are not wanted.
    pub source_map: Option<SourceMapRequest<'a>>,
}

/// Successful minification.
#[derive(Debug, Clone)]
pub struct Minified {
    /// Minified text.
    pub code: String,
    /// Map from the minified text to the input text.
    ///
    /// Only present when a map was requested.
    pub map: Option<ProvenanceMap>,
}

/// Failed minification.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MinifyError {
    /// Error message.
    pub message: String,
    /// Position in the input text.
    pub position: Option<Position>,
}

impl MinifyError {
    /// Create an error at a position.
    pub fn new<S: Into<String>>(message: S, position: Option<Position>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for MinifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => {
                write!(f, "{} (line: {}, col: {})", self.message, pos.line, pos.column)
            }
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for MinifyError {}

/// Result of a minification.
#[derive(Debug, Clone)]
pub struct MinifyOutput {
    /// Minified code or the error that stopped the transform.
    pub result: Result<Minified, MinifyError>,
    /// Native warnings, each ending in a `[file:line,column]` marker.
    pub warnings: Vec<String>,
}

impl MinifyOutput {
    /// Output for a failed minification.
    pub fn failed(error: MinifyError, warnings: Vec<String>) -> Self {
        Self {
            result: Err(error),
            warnings,
        }
    }
}

/// External minification transform.
pub trait Minifier: Send + Sync {
    /// Minify the request source.
    ///
    /// The hook is called for every comment in encounter order, a
    /// comment stays in the output when the hook returns `true`.
    fn minify(
        &self,
        request: MinifyRequest<'_>,
        comments: &mut dyn CommentHook,
    ) -> MinifyOutput;
}

/// Minify one artifact applying the configured comment policies.
pub fn run(
    minifier: &dyn Minifier,
    config: &ResolvedConfig,
    file: &str,
    source: &str,
    want_source_map: bool,
) -> (MinifyOutput, Vec<CommentRecord>) {
    let request = MinifyRequest {
        file,
        source,
        options: config.transform(),
        source_map: if want_source_map {
            Some(SourceMapRequest {
                filename: file,
                root: "",
            })
        } else {
            None
        },
    };
    let mut collector = CommentCollector::new(
        config.comments(),
        config.extraction().map(|e| e.condition()),
    );
    let output = minifier.minify(request, &mut collector);
    let extracted = match output.result {
        Ok(_) => collector.into_extracted(),
        Err(_) => Vec::new(),
    };
    (output, extracted)
}
