//! Translate minifier diagnostics to original source coordinates.
//!
//! Minifier warnings are free text ending in a position marker of the
//! form `<message> [<file>:<line>,<column>]`. The marker is parsed,
//! the position is looked up in the input provenance map and the
//! message is rewritten to point at the original source.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::map::{OriginalLocation, Position, ProvenanceMap};
use crate::minify::MinifyError;

/// Name used as the origin of emitted diagnostics.
pub const ORIGIN: &str = "pumice";

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.*?)\s*\[([^\[\]]+):(\d+),(\d+)\]\s*$").unwrap()
});

/// Kind of diagnostic reported to the host.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// An artifact failed to minify.
    #[serde(rename = "MinifyProcessingError")]
    ProcessingError,
    /// Warnings for an artifact that did minify.
    #[serde(rename = "MinifyProcessingWarning")]
    ProcessingWarning,
}

impl DiagnosticKind {
    /// Name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProcessingError => "MinifyProcessingError",
            Self::ProcessingWarning => "MinifyProcessingWarning",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error or warning for an artifact.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Kind of diagnostic.
    pub kind: DiagnosticKind,
    /// Artifact the diagnostic belongs to.
    pub file: String,
    /// Message, one line per reported problem.
    pub message: String,
}

impl Diagnostic {
    /// Lines of the message.
    pub fn lines(&self) -> Vec<&str> {
        self.message.lines().collect()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}\n{}", self.file, ORIGIN, self.message)
    }
}

/// Diagnostic message with the original location it refers to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TranslatedDiagnostic {
    /// Message without a position marker.
    pub message: String,
    /// Original location when resolvable.
    pub original_location: Option<OriginalLocation>,
}

impl TranslatedDiagnostic {
    /// Render with a shortened position marker.
    pub fn render(&self, shortener: &dyn Shorten) -> String {
        match &self.original_location {
            Some(location) => format!(
                "{} [{}:{},{}]",
                self.message,
                shortener.shorten(&location.file),
                location.line,
                location.column
            ),
            None => self.message.clone(),
        }
    }
}

/// Warning split into its message and position marker.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WarningMarker {
    /// Message before the marker.
    pub message: String,
    /// File named by the marker.
    pub file: String,
    /// Position named by the marker.
    pub position: Position,
}

impl WarningMarker {
    /// Parse a native warning.
    pub fn parse(warning: &str) -> Result<Self> {
        let unmarked = || Error::UnmarkedWarning(warning.to_string());
        let caps = MARKER.captures(warning).ok_or_else(unmarked)?;
        let line = caps[3].parse::<u32>().map_err(|_| unmarked())?;
        let column = caps[4].parse::<u32>().map_err(|_| unmarked())?;
        Ok(Self {
            message: caps[1].to_string(),
            file: caps[2].to_string(),
            position: Position::new(line, column),
        })
    }
}

/// Shortens paths for presentation.
pub trait Shorten: Send + Sync {
    /// Shorten a path.
    fn shorten(&self, path: &str) -> String;
}

/// Presents paths relative to a project context directory.
#[derive(Debug, Clone)]
pub struct RequestShortener {
    context: String,
    parent: Option<String>,
}

impl RequestShortener {
    /// Create a shortener for a context directory.
    pub fn new<P: AsRef<Path>>(context: P) -> Self {
        let context = context.as_ref();
        let parent = context
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| trim_separator(p.to_path_buf()));
        Self {
            context: trim_separator(context.to_path_buf()),
            parent,
        }
    }
}

fn trim_separator(path: PathBuf) -> String {
    let path = path.to_string_lossy().into_owned();
    if path.len() > 1 {
        path.trim_end_matches(|c| c == '/' || c == '\\').to_string()
    } else {
        path
    }
}

fn strip_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(dir)?;
    if dir.ends_with('/') || dir.ends_with('\\') {
        return Some(rest);
    }
    rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\'))
}

impl Shorten for RequestShortener {
    fn shorten(&self, path: &str) -> String {
        if let Some(rest) = strip_dir(path, &self.context) {
            return format!("./{}", rest);
        }
        if let Some(parent) = &self.parent {
            if let Some(rest) = strip_dir(path, parent) {
                return format!("../{}", rest);
            }
        }
        path.to_string()
    }
}

/// Shortener that leaves paths untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShorten;

impl Shorten for NoShorten {
    fn shorten(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Translates the diagnostics produced while minifying one artifact.
pub struct Translator<'a> {
    file: &'a str,
    map: Option<&'a ProvenanceMap>,
    shortener: &'a dyn Shorten,
    config: &'a ResolvedConfig,
}

impl<'a> Translator<'a> {
    /// Create a translator for an artifact and its input map.
    pub fn new(
        file: &'a str,
        map: Option<&'a ProvenanceMap>,
        shortener: &'a dyn Shorten,
        config: &'a ResolvedConfig,
    ) -> Self {
        Self {
            file,
            map,
            shortener,
            config,
        }
    }

    fn locate(&self, position: Option<Position>) -> Option<OriginalLocation> {
        self.map?.original_position_for(position?)
    }

    /// Translate a minifier error.
    pub fn error(&self, error: &MinifyError) -> TranslatedDiagnostic {
        TranslatedDiagnostic {
            message: error.message.clone(),
            original_location: self.locate(error.position),
        }
    }

    /// Translate a minifier error into a diagnostic for the host.
    pub fn error_diagnostic(&self, error: &MinifyError) -> Diagnostic {
        Diagnostic {
            kind: DiagnosticKind::ProcessingError,
            file: self.file.to_string(),
            message: self.error(error).render(self.shortener),
        }
    }

    /// Translate a single warning.
    ///
    /// Returns `None` when the warnings filter rejects the original
    /// source. Without an input map the warning is passed through
    /// unchanged.
    pub fn warning(&self, warning: &str) -> Option<String> {
        if self.map.is_none() {
            return Some(warning.to_string());
        }
        let marker = match WarningMarker::parse(warning) {
            Ok(marker) => marker,
            Err(e) => {
                log::warn!("{}: {}", self.file, e);
                return Some(warning.to_string());
            }
        };
        let translated = TranslatedDiagnostic {
            message: marker.message,
            original_location: self.locate(Some(marker.position)),
        };
        if let Some(location) = &translated.original_location {
            if !self.config.keep_warning(&location.file) {
                log::debug!(
                    "{}: filtered warning from {}",
                    self.file,
                    location.file
                );
                return None;
            }
        }
        Some(translated.render(self.shortener))
    }

    /// Translate warnings into a single diagnostic for the host.
    pub fn warnings_diagnostic(&self, warnings: &[String]) -> Option<Diagnostic> {
        let messages = warnings
            .iter()
            .filter_map(|w| self.warning(w))
            .collect::<Vec<_>>();
        if messages.is_empty() {
            return None;
        }
        Some(Diagnostic {
            kind: DiagnosticKind::ProcessingWarning,
            file: self.file.to_string(),
            message: messages.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_marker() -> anyhow::Result<()> {
        let marker =
            WarningMarker::parse("Dropping unused variable a [app.js:3,14]")?;
        assert_eq!("Dropping unused variable a", marker.message);
        assert_eq!("app.js", marker.file);
        assert_eq!(Position::new(3, 14), marker.position);
        Ok(())
    }

    #[test]
    fn parse_marker_with_drive_letter() -> anyhow::Result<()> {
        let marker = WarningMarker::parse(r"Side effects [C:\src\a.js:1,0]")?;
        assert_eq!(r"C:\src\a.js", marker.file);
        assert_eq!(Position::new(1, 0), marker.position);
        Ok(())
    }

    #[test]
    fn parse_marker_uses_last_marker() -> anyhow::Result<()> {
        let marker = WarningMarker::parse("Odd [x] thing [b.js:2,5]")?;
        assert_eq!("Odd [x] thing", marker.message);
        assert_eq!("b.js", marker.file);
        Ok(())
    }

    #[test]
    fn unmarked_warnings_are_errors() {
        for warning in ["no marker", "bad [a.js:x,1]", "[a.js:1,2] trailing"] {
            match WarningMarker::parse(warning) {
                Err(Error::UnmarkedWarning(raw)) => assert_eq!(warning, raw),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn request_shortener() {
        let shortener = RequestShortener::new("/home/dev/project");
        assert_eq!("./src/a.js", shortener.shorten("/home/dev/project/src/a.js"));
        assert_eq!("../lib/b.js", shortener.shorten("/home/dev/lib/b.js"));
        assert_eq!("/opt/c.js", shortener.shorten("/opt/c.js"));
        assert_eq!(
            "../projectx/d.js",
            shortener.shorten("/home/dev/projectx/d.js")
        );
        assert_eq!("webpack:///e.js", shortener.shorten("webpack:///e.js"));
    }

    #[test]
    fn render_without_location_is_bare() {
        let diagnostic = TranslatedDiagnostic {
            message: "Unexpected token".into(),
            original_location: None,
        };
        assert_eq!("Unexpected token", diagnostic.render(&NoShorten));
    }

    #[test]
    fn display_names_origin() {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::ProcessingWarning,
            file: "app.js".into(),
            message: "one\ntwo".into(),
        };
        assert_eq!("app.js from pumice\none\ntwo", diagnostic.to_string());
        assert_eq!(vec!["one", "two"], diagnostic.lines());
    }

    #[test]
    fn serialize_uses_kind_name() -> anyhow::Result<()> {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::ProcessingError,
            file: "app.js".into(),
            message: "Unexpected token".into(),
        };
        assert_eq!(
            serde_json::json!({
                "kind": "MinifyProcessingError",
                "file": "app.js",
                "message": "Unexpected token",
            }),
            serde_json::to_value(&diagnostic)?
        );
        Ok(())
    }
}
