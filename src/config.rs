//! Normalize raw user options into an immutable resolved configuration.
//!
//! Resolution never fails. Malformed option bags, unknown keys and
//! values of the wrong shape fall back to defaults and are reported
//! through the log so a typo in a build configuration does not break
//! the build.
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use crate::comments::CommentCondition;
use crate::rules::{self, any_match, Rule};

/// Suffix appended to an artifact name to name its sidecar.
pub const SIDECAR_SUFFIX: &str = ".LICENSE";

/// Placeholder replaced by the artifact name in a sidecar name.
pub const FILE_PLACEHOLDER: &str = "[file]";

/// Default artifact name filter.
pub const DEFAULT_TEST: &str = r"(?i)\.js($|\?)";

static NULL: Value = Value::Null;

static DEFAULT_TEST_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TEST).unwrap());

const KNOWN_KEYS: &[&str] = &[
    "test",
    "include",
    "exclude",
    "parse",
    "compress",
    "mangle",
    "output",
    "toplevel",
    "ie8",
    "warnings",
    "extractComments",
    "extract_comments",
    "warningsFilter",
    "warnings_filter",
    "parallel",
];

/// Options handed verbatim to the minifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    /// Parser options.
    pub parse: Value,
    /// Compressor options, `false` disables compression.
    pub compress: Value,
    /// Mangler options, `false` disables mangling.
    pub mangle: Value,
    /// Output options.
    pub output: Value,
    /// Treat top level declarations as local.
    pub toplevel: bool,
    /// Support legacy targets.
    pub ie8: bool,
    /// Generate native warnings.
    pub warnings: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            parse: Value::Object(Default::default()),
            compress: Value::Bool(true),
            mangle: Value::Bool(true),
            output: Value::Null,
            toplevel: false,
            ie8: false,
            warnings: false,
        }
    }
}

/// How the sidecar for an artifact is named.
#[derive(Clone)]
pub enum SidecarName {
    /// Append [SIDECAR_SUFFIX] to the artifact name.
    Default,
    /// Fixed name, [FILE_PLACEHOLDER] is replaced by the artifact name.
    Fixed(String),
    /// Caller supplied function of the artifact name.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Default for SidecarName {
    fn default() -> Self {
        SidecarName::Default
    }
}

impl fmt::Debug for SidecarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Fixed(name) => write!(f, "Fixed({:?})", name),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Banner prepended to artifacts that had comments extracted.
#[derive(Clone)]
pub enum Banner {
    /// Sentence naming the sidecar.
    Default,
    /// No banner.
    Disabled,
    /// Fixed banner text.
    Text(String),
    /// Caller supplied function of the sidecar name.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Default for Banner {
    fn default() -> Self {
        Banner::Default
    }
}

impl fmt::Debug for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Text(text) => write!(f, "Text({:?})", text),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Comment extraction options.
#[derive(Debug, Clone)]
pub enum ExtractComments {
    /// Comments are not extracted.
    Disabled,
    /// Comments are extracted into a sidecar.
    Enabled {
        /// Comments to extract, all comments when not given.
        condition: Option<CommentCondition>,
        /// Sidecar name.
        file: SidecarName,
        /// Banner for the minified artifact.
        banner: Banner,
    },
}

impl Default for ExtractComments {
    fn default() -> Self {
        ExtractComments::Disabled
    }
}

/// User facing options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Artifact names to process, defaults to [DEFAULT_TEST].
    pub test: Option<Vec<Rule>>,
    /// Artifact names that must also match.
    pub include: Option<Vec<Rule>>,
    /// Artifact names to skip.
    pub exclude: Option<Vec<Rule>>,
    /// Options for the minifier.
    pub transform: TransformOptions,
    /// Comments retained in the output.
    ///
    /// When not given the policy is read from `output.comments`.
    pub comments: Option<CommentCondition>,
    /// Comment extraction.
    pub extract_comments: ExtractComments,
    /// Original source paths whose warnings are reported.
    pub warnings_filter: Option<Vec<Rule>>,
    /// Minify distinct artifacts in parallel.
    pub parallel: bool,
}

impl Options {
    /// Read options from a raw option bag.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null => &empty,
            _ => {
                log::warn!("Options must be an object, using defaults");
                &empty
            }
        };

        for key in obj.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                log::debug!("Ignoring unknown option {}", key);
            }
        }

        let get = |key: &str| obj.get(key).unwrap_or(&NULL);
        let get_either = |a: &str, b: &str| {
            obj.get(a).or_else(|| obj.get(b)).unwrap_or(&NULL)
        };

        let defaults = TransformOptions::default();
        let transform = TransformOptions {
            parse: match get("parse") {
                Value::Null => defaults.parse,
                value => value.clone(),
            },
            compress: match get("compress") {
                Value::Null => defaults.compress,
                value => value.clone(),
            },
            mangle: match get("mangle") {
                Value::Null => defaults.mangle,
                value => value.clone(),
            },
            output: get("output").clone(),
            toplevel: flag(obj, "toplevel", defaults.toplevel),
            ie8: flag(obj, "ie8", defaults.ie8),
            warnings: flag(obj, "warnings", defaults.warnings),
        };

        Options {
            test: Rule::from_value("test", get("test")),
            include: Rule::from_value("include", get("include")),
            exclude: Rule::from_value("exclude", get("exclude")),
            comments: None,
            extract_comments: extract_comments(get_either(
                "extractComments",
                "extract_comments",
            )),
            warnings_filter: Rule::from_value(
                "warningsFilter",
                get_either("warningsFilter", "warnings_filter"),
            ),
            parallel: flag(obj, "parallel", false),
            transform,
        }
    }
}

/// Resolved comment extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    condition: CommentCondition,
    file: SidecarName,
    banner: Banner,
}

impl Extraction {
    /// Condition selecting comments to extract.
    pub fn condition(&self) -> &CommentCondition {
        &self.condition
    }

    /// Name of the sidecar for an artifact.
    pub fn target_name_of(&self, artifact: &str) -> String {
        match &self.file {
            SidecarName::Default => format!("{}{}", artifact, SIDECAR_SUFFIX),
            SidecarName::Fixed(name) => name.replace(FILE_PLACEHOLDER, artifact),
            SidecarName::Custom(name_of) => name_of(artifact),
        }
    }

    /// Banner text for artifacts pointing at a sidecar.
    pub fn banner_of(&self, sidecar: &str) -> Option<String> {
        match &self.banner {
            Banner::Default => {
                let name = Path::new(sidecar)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| sidecar.to_string());
                Some(format!("For license information please see {}", name))
            }
            Banner::Disabled => None,
            Banner::Text(text) => Some(text.clone()),
            Banner::Custom(banner_of) => Some(banner_of(sidecar)),
        }
    }
}

/// Immutable configuration for a pipeline instance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    test: Vec<Rule>,
    include: Option<Vec<Rule>>,
    exclude: Option<Vec<Rule>>,
    transform: TransformOptions,
    comments: CommentCondition,
    extraction: Option<Extraction>,
    warnings_filter: Option<Vec<Rule>>,
    parallel: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::resolve(Default::default())
    }
}

impl ResolvedConfig {
    /// Resolve user options.
    pub fn resolve(options: Options) -> Self {
        let comments = options.comments.unwrap_or_else(|| {
            options
                .transform
                .output
                .get("comments")
                .and_then(|value| comment_condition("output.comments", value))
                .unwrap_or(CommentCondition::None)
        });

        let extraction = match options.extract_comments {
            ExtractComments::Disabled => None,
            ExtractComments::Enabled {
                condition,
                file,
                banner,
            } => Some(Extraction {
                condition: condition.unwrap_or(CommentCondition::All),
                file,
                banner,
            }),
        };

        let test = options
            .test
            .unwrap_or_else(|| vec![Rule::Pattern(DEFAULT_TEST_RULE.clone())]);

        Self {
            test,
            include: options.include,
            exclude: options.exclude,
            transform: options.transform,
            comments,
            extraction,
            warnings_filter: options.warnings_filter,
            parallel: options.parallel,
        }
    }

    /// Resolve a raw option bag.
    pub fn from_value(value: &Value) -> Self {
        Self::resolve(Options::from_value(value))
    }

    /// Determine if an artifact should be processed.
    pub fn matches(&self, name: &str) -> bool {
        if !any_match(&self.test, name) {
            return false;
        }
        if let Some(include) = &self.include {
            if !any_match(include, name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if any_match(exclude, name) {
                return false;
            }
        }
        true
    }

    /// Options for the minifier.
    pub fn transform(&self) -> &TransformOptions {
        &self.transform
    }

    /// Comments retained in the minified output.
    pub fn comments(&self) -> &CommentCondition {
        &self.comments
    }

    /// Comment extraction when enabled.
    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    /// Determine if warnings from an original source are reported.
    pub fn keep_warning(&self, original_file: &str) -> bool {
        match &self.warnings_filter {
            Some(rules) => any_match(rules, original_file),
            None => true,
        }
    }

    /// Whether distinct artifacts are minified in parallel.
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

fn flag(obj: &Map<String, Value>, key: &str, default: bool) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            log::warn!("Option {} expects a boolean, got {}", key, other);
            default
        }
    }
}

/// Resolve a comment condition shorthand.
///
/// Returns `None` when the value does not describe a condition.
pub fn comment_condition(key: &str, value: &Value) -> Option<CommentCondition> {
    match value {
        Value::Null => None,
        Value::Bool(false) => Some(CommentCondition::None),
        Value::Bool(true) => Some(CommentCondition::All),
        Value::String(s) => match s.as_str() {
            "all" => Some(CommentCondition::All),
            "some" => Some(CommentCondition::Notable),
            _ => {
                let re = match rules::parse_regex_literal(s) {
                    Some(re) => re,
                    None => rules::compile(s, false, false),
                };
                re.map(CommentCondition::Pattern)
            }
        },
        _ => {
            log::warn!("Ignoring {} option {}", key, value);
            None
        }
    }
}

fn extract_comments(value: &Value) -> ExtractComments {
    match value {
        Value::Null | Value::Bool(false) => ExtractComments::Disabled,
        Value::Bool(true) => ExtractComments::Enabled {
            condition: None,
            file: Default::default(),
            banner: Default::default(),
        },
        Value::String(_) => match comment_condition("extractComments", value) {
            Some(condition) => ExtractComments::Enabled {
                condition: Some(condition),
                file: Default::default(),
                banner: Default::default(),
            },
            None => {
                log::warn!("Disabling extractComments, invalid condition {}", value);
                ExtractComments::Disabled
            }
        },
        Value::Object(obj) => {
            let condition = match obj.get("condition") {
                None | Some(Value::Null) => None,
                Some(v) => match comment_condition("extractComments.condition", v) {
                    Some(condition) => Some(condition),
                    None => {
                        log::warn!("Disabling extractComments, invalid condition {}", v);
                        return ExtractComments::Disabled;
                    }
                },
            };
            let file = match obj.get("filename").or_else(|| obj.get("file")) {
                None | Some(Value::Null) => SidecarName::Default,
                Some(Value::String(name)) => SidecarName::Fixed(name.clone()),
                Some(other) => {
                    log::warn!("Ignoring extractComments.filename {}", other);
                    SidecarName::Default
                }
            };
            let banner = match obj.get("banner") {
                None | Some(Value::Null) | Some(Value::Bool(true)) => {
                    Banner::Default
                }
                Some(Value::Bool(false)) => Banner::Disabled,
                Some(Value::String(text)) => Banner::Text(text.clone()),
                Some(other) => {
                    log::warn!("Ignoring extractComments.banner {}", other);
                    Banner::Default
                }
            };
            ExtractComments::Enabled {
                condition,
                file,
                banner,
            }
        }
        _ => {
            log::warn!("Ignoring extractComments option {}", value);
            ExtractComments::Disabled
        }
    }
}
