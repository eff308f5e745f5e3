//! Name matching rules used by the artifact filter and warnings filter.
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Predicate over a name or path.
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Rule matching a name.
#[derive(Clone)]
pub enum Rule {
    /// Matches names starting with the prefix.
    Prefix(String),
    /// Matches names the pattern finds a match in.
    Pattern(Regex),
    /// Caller supplied predicate.
    Custom(NamePredicate),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "Prefix({:?})", prefix),
            Self::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Rule {
    /// Determine if the rule matches a name.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Pattern(re) => re.is_match(name),
            Self::Custom(predicate) => predicate(name),
        }
    }

    /// Parse a rule from a string.
    ///
    /// Strings written as `/pattern/flags` become patterns, any other
    /// string is a prefix.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(re) = parse_regex_literal(value) {
            return Some(Rule::Pattern(re?));
        }
        Some(Rule::Prefix(value.to_string()))
    }

    /// Parse a list of rules from a JSON string or array of strings.
    ///
    /// Entries of other types and invalid patterns are skipped.
    pub fn from_value(key: &str, value: &Value) -> Option<Vec<Self>> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Rule::parse(s).into_iter().collect()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Rule::parse(s),
                        _ => {
                            log::warn!("Ignoring {} rule {}", key, item);
                            None
                        }
                    })
                    .collect(),
            ),
            _ => {
                log::warn!("Ignoring {} option {}", key, value);
                None
            }
        }
    }
}

/// Determine if any rule in the list matches.
pub(crate) fn any_match(rules: &[Rule], name: &str) -> bool {
    rules.iter().any(|rule| rule.matches(name))
}

/// Parse a `/pattern/flags` literal.
///
/// Returns `None` when the string is not written as a literal and
/// `Some(None)` when the pattern does not compile.
pub(crate) fn parse_regex_literal(value: &str) -> Option<Option<Regex>> {
    let body = value.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (pattern, flags) = (&body[..end], &body[end + 1..]);
    if !flags.chars().all(|c| "gimsuy".contains(c)) {
        return None;
    }
    Some(compile(pattern, flags.contains('i'), flags.contains('m')))
}

/// Compile a pattern logging failures.
pub(crate) fn compile(
    pattern: &str,
    case_insensitive: bool,
    multi_line: bool,
) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .multi_line(multi_line)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Ignoring invalid pattern {:?}: {}", pattern, e);
            None
        }
    }
}
