//! Comment conditions and the collector that intercepts comments
//! while an artifact is minified.
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Comments that look like license or preservation notices.
pub const NOTABLE_PATTERN: &str = r"^\**!|@preserve|@license|@cc_on";

static NOTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NOTABLE_PATTERN).unwrap());

/// Kind of a comment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommentKind {
    /// A `/* ... */` comment.
    Block,
    /// A `// ...` comment.
    Line,
}

/// Comment encountered during minification.
///
/// The text excludes the comment delimiters.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommentRecord {
    /// Kind of comment.
    pub kind: CommentKind,
    /// Comment text without delimiters.
    pub text: String,
}

impl CommentRecord {
    /// Create a block comment record.
    pub fn block<S: Into<String>>(text: S) -> Self {
        Self {
            kind: CommentKind::Block,
            text: text.into(),
        }
    }

    /// Create a line comment record.
    pub fn line<S: Into<String>>(text: S) -> Self {
        Self {
            kind: CommentKind::Line,
            text: text.into(),
        }
    }
}

impl fmt::Display for CommentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommentKind::Block => write!(f, "/*{}*/", self.text),
            CommentKind::Line => write!(f, "//{}", self.text),
        }
    }
}

/// Predicate over a comment record.
pub type CommentPredicate = Arc<dyn Fn(&CommentRecord) -> bool + Send + Sync>;

/// Condition deciding whether a comment is selected.
#[derive(Clone)]
pub enum CommentCondition {
    /// No comment is selected.
    None,
    /// Every comment is selected.
    All,
    /// License and preservation comments are selected.
    Notable,
    /// Comments with text matching the pattern are selected.
    Pattern(Regex),
    /// Caller supplied predicate.
    Custom(CommentPredicate),
}

impl Default for CommentCondition {
    fn default() -> Self {
        CommentCondition::None
    }
}

impl fmt::Debug for CommentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::All => write!(f, "All"),
            Self::Notable => write!(f, "Notable"),
            Self::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl CommentCondition {
    /// Determine if the condition selects a comment.
    pub fn matches(&self, comment: &CommentRecord) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Notable => NOTABLE.is_match(&comment.text),
            Self::Pattern(re) => re.is_match(&comment.text),
            Self::Custom(predicate) => predicate(comment),
        }
    }
}

/// Callback invoked by a minifier for every comment it encounters.
pub trait CommentHook {
    /// Inspect a comment, return whether it stays in the output.
    fn comment(&mut self, comment: &CommentRecord) -> bool;
}

/// Applies the retention policy and accumulates extracted comments
/// in encounter order.
pub struct CommentCollector<'a> {
    policy: &'a CommentCondition,
    extract: Option<&'a CommentCondition>,
    extracted: Vec<CommentRecord>,
}

impl<'a> CommentCollector<'a> {
    /// Create a collector.
    ///
    /// When `extract` is `None` nothing is accumulated.
    pub fn new(
        policy: &'a CommentCondition,
        extract: Option<&'a CommentCondition>,
    ) -> Self {
        Self {
            policy,
            extract,
            extracted: Vec::new(),
        }
    }

    /// Comments extracted so far.
    pub fn extracted(&self) -> &[CommentRecord] {
        &self.extracted
    }

    /// Consume the collector yielding the extracted comments.
    pub fn into_extracted(self) -> Vec<CommentRecord> {
        self.extracted
    }
}

impl CommentHook for CommentCollector<'_> {
    fn comment(&mut self, comment: &CommentRecord) -> bool {
        if let Some(condition) = self.extract {
            if condition.matches(comment) {
                self.extracted.push(comment.clone());
            }
        }
        self.policy.matches(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notable_comments() {
        let notable = CommentCondition::Notable;
        assert!(notable.matches(&CommentRecord::block("! keep me")));
        assert!(notable.matches(&CommentRecord::block("*! keep me")));
        assert!(notable.matches(&CommentRecord::block(" @license MIT ")));
        assert!(notable.matches(&CommentRecord::line(" @preserve")));
        assert!(notable.matches(&CommentRecord::block("@cc_on")));
        assert!(!notable.matches(&CommentRecord::block(" plain ")));
        assert!(!notable.matches(&CommentRecord::line(" not ! first")));
    }

    #[test]
    fn retention_and_extraction_are_independent() {
        let policy = CommentCondition::Pattern(Regex::new("keep").unwrap());
        let extract = CommentCondition::Notable;
        let mut collector = CommentCollector::new(&policy, Some(&extract));

        assert!(collector.comment(&CommentRecord::block("! keep")));
        assert!(!collector.comment(&CommentRecord::block("@license")));
        assert!(collector.comment(&CommentRecord::line(" keep")));
        assert!(!collector.comment(&CommentRecord::line(" drop")));

        assert_eq!(
            vec![CommentRecord::block("! keep"), CommentRecord::block("@license")],
            collector.into_extracted()
        );
    }

    #[test]
    fn no_extraction_without_condition() {
        let policy = CommentCondition::All;
        let mut collector = CommentCollector::new(&policy, None);
        assert!(collector.comment(&CommentRecord::block("@license")));
        assert!(collector.extracted().is_empty());
    }

    #[test]
    fn display_restores_delimiters() {
        assert_eq!("/* @license MIT */", CommentRecord::block(" @license MIT ").to_string());
        assert_eq!("// hi", CommentRecord::line(" hi").to_string());
    }
}
