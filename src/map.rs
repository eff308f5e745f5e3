//! Provenance maps correlating generated positions with original locations.
//!
//! Wraps a decoded [sourcemap::SourceMap] and adds the operations the
//! pipeline needs: position lookups that follow the `source-map`
//! library semantics (1-based lines, same-line greatest lower bound),
//! chaining two maps and shifting maps for concatenation.
use std::collections::HashSet;
use std::fmt;

use sourcemap::{SourceMap, SourceMapBuilder};

use crate::error::Result;

/// Position in generated text.
///
/// Lines are 1-based and columns 0-based which is the convention
/// used by minifier diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Position {
    /// Line number starting at one.
    pub line: u32,
    /// Column number starting at zero.
    pub column: u32,
}

impl Position {
    /// Create a position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Location in an original source file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OriginalLocation {
    /// Original file name as it appears in the map.
    pub file: String,
    /// Line number starting at one.
    pub line: u32,
    /// Column number starting at zero.
    pub column: u32,
    /// Original identifier name.
    pub name: Option<String>,
}

impl OriginalLocation {
    /// Create a location without a name.
    pub fn new<S: Into<String>>(file: S, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            name: None,
        }
    }
}

/// Single mapping from a generated position to an original location.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    /// Position in the generated text.
    pub generated: Position,
    /// Location it was generated from.
    pub original: OriginalLocation,
}

/// Map from generated positions to original locations.
#[derive(Clone)]
pub struct ProvenanceMap {
    inner: SourceMap,
}

impl fmt::Debug for ProvenanceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvenanceMap")
            .field("file", &self.inner.get_file())
            .field("sources", &self.inner.sources().collect::<Vec<_>>())
            .field("tokens", &self.inner.get_token_count())
            .finish()
    }
}

impl From<SourceMap> for ProvenanceMap {
    fn from(inner: SourceMap) -> Self {
        Self { inner }
    }
}

impl ProvenanceMap {
    /// Decode a map from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: SourceMap::from_slice(bytes)?,
        })
    }

    /// Decode a map from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Build a map from a list of mappings.
    pub fn from_mappings<I>(file: Option<&str>, mappings: I) -> Self
    where
        I: IntoIterator<Item = Mapping>,
    {
        let mut mappings: Vec<Mapping> = mappings.into_iter().collect();
        mappings.sort_by_key(|m| m.generated);

        let mut builder = SourceMapBuilder::new(file);
        for mapping in mappings.iter() {
            if mapping.generated.line == 0 || mapping.original.line == 0 {
                continue;
            }
            builder.add(
                mapping.generated.line - 1,
                mapping.generated.column,
                mapping.original.line - 1,
                mapping.original.column,
                Some(&mapping.original.file),
                mapping.original.name.as_deref(),
                false,
            );
        }
        builder.into_sourcemap().into()
    }

    /// Encode the map as JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.inner.to_writer(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Name of the generated file if the map declares one.
    pub fn file(&self) -> Option<&str> {
        self.inner.get_file()
    }

    /// Original source file names referenced by the map.
    pub fn sources(&self) -> Vec<&str> {
        self.inner.sources().collect()
    }

    /// Embedded content of an original source.
    pub fn source_contents(&self, file: &str) -> Option<&str> {
        self.inner
            .sources()
            .position(|s| s == file)
            .and_then(|idx| self.inner.get_source_contents(idx as u32))
    }

    /// All mappings that point into an original source.
    pub fn mappings(&self) -> Vec<Mapping> {
        self.inner
            .tokens()
            .filter_map(|token| {
                let file = token.get_source()?;
                Some(Mapping {
                    generated: Position::new(
                        token.get_dst_line() + 1,
                        token.get_dst_col(),
                    ),
                    original: OriginalLocation {
                        file: file.to_string(),
                        line: token.get_src_line() + 1,
                        column: token.get_src_col(),
                        name: token.get_name().map(|n| n.to_string()),
                    },
                })
            })
            .collect()
    }

    /// Find the original location for a generated position.
    ///
    /// Only mappings on the same generated line are considered, the
    /// closest one at or before the column wins.
    pub fn original_position_for(
        &self,
        position: Position,
    ) -> Option<OriginalLocation> {
        if position.line == 0 {
            return None;
        }
        let line = position.line - 1;
        let token = self.inner.lookup_token(line, position.column)?;
        if token.get_dst_line() != line {
            return None;
        }
        let file = token.get_source()?;
        Some(OriginalLocation {
            file: file.to_string(),
            line: token.get_src_line() + 1,
            column: token.get_src_col(),
            name: token.get_name().map(|n| n.to_string()),
        })
    }

    /// Chain this map through the map of the text it was generated from.
    ///
    /// `self` maps the generated text onto `intermediate` (named `file`)
    /// and `inner` maps `intermediate` onto the original sources. The
    /// result maps the generated text straight onto the original
    /// sources. Without an inner map the intermediate text is the
    /// original and is embedded as the source contents.
    pub fn chain(
        &self,
        inner: Option<&ProvenanceMap>,
        file: &str,
        intermediate: &str,
    ) -> ProvenanceMap {
        let mut builder = SourceMapBuilder::new(Some(file));
        let mut seen = HashSet::new();

        for token in self.inner.tokens() {
            if token.get_source().is_none() {
                continue;
            }
            match inner {
                Some(inner) => {
                    let through = Position::new(
                        token.get_src_line() + 1,
                        token.get_src_col(),
                    );
                    let original = match inner.original_position_for(through)
                    {
                        Some(original) => original,
                        None => continue,
                    };
                    let name = original.name.as_deref().or(token.get_name());
                    let raw = builder.add(
                        token.get_dst_line(),
                        token.get_dst_col(),
                        original.line - 1,
                        original.column,
                        Some(&original.file),
                        name,
                        false,
                    );
                    if seen.insert(raw.src_id) {
                        builder.set_source_contents(
                            raw.src_id,
                            inner.source_contents(&original.file),
                        );
                    }
                }
                None => {
                    let raw = builder.add(
                        token.get_dst_line(),
                        token.get_dst_col(),
                        token.get_src_line(),
                        token.get_src_col(),
                        Some(file),
                        token.get_name(),
                        false,
                    );
                    if seen.insert(raw.src_id) {
                        builder
                            .set_source_contents(raw.src_id, Some(intermediate));
                    }
                }
            }
        }

        builder.into_sourcemap().into()
    }
}

/// Accumulates maps of concatenated texts into a single map.
pub(crate) struct MapConcat {
    builder: SourceMapBuilder,
    seen: HashSet<u32>,
}

impl MapConcat {
    pub fn new(file: Option<&str>) -> Self {
        Self {
            builder: SourceMapBuilder::new(file),
            seen: HashSet::new(),
        }
    }

    /// Add a child map whose text starts at the given offset.
    ///
    /// The column offset only applies to the first generated line of
    /// the child.
    pub fn push(&mut self, map: &ProvenanceMap, line: u32, column: u32) {
        for token in map.inner.tokens() {
            let source = match token.get_source() {
                Some(source) => source,
                None => continue,
            };
            let dst_col = if token.get_dst_line() == 0 {
                token.get_dst_col() + column
            } else {
                token.get_dst_col()
            };
            let raw = self.builder.add(
                token.get_dst_line() + line,
                dst_col,
                token.get_src_line(),
                token.get_src_col(),
                Some(source),
                token.get_name(),
                false,
            );
            if self.seen.insert(raw.src_id) {
                self.builder
                    .set_source_contents(raw.src_id, map.source_contents(source));
            }
        }
    }

    pub fn finish(self) -> ProvenanceMap {
        self.builder.into_sourcemap().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, line: u32, column: u32) -> OriginalLocation {
        OriginalLocation::new(file, line, column)
    }

    fn mapping(line: u32, column: u32, original: OriginalLocation) -> Mapping {
        Mapping {
            generated: Position::new(line, column),
            original,
        }
    }

    #[test]
    fn lookup_stays_on_line() {
        let map = ProvenanceMap::from_mappings(
            Some("out.js"),
            vec![
                mapping(1, 0, loc("a.js", 3, 4)),
                mapping(1, 10, loc("a.js", 4, 0)),
            ],
        );
        assert_eq!(
            Some(loc("a.js", 3, 4)),
            map.original_position_for(Position::new(1, 5))
        );
        assert_eq!(
            Some(loc("a.js", 4, 0)),
            map.original_position_for(Position::new(1, 12))
        );
        assert_eq!(None, map.original_position_for(Position::new(2, 0)));
        assert_eq!(None, map.original_position_for(Position::new(0, 0)));
    }

    #[test]
    fn json_round_trip_keeps_lookups() -> anyhow::Result<()> {
        let map = ProvenanceMap::from_mappings(
            Some("out.js"),
            vec![mapping(2, 3, loc("src/b.js", 7, 1))],
        );
        let decoded = ProvenanceMap::from_json(&map.to_json()?)?;
        assert_eq!(Some("out.js"), decoded.file());
        assert_eq!(
            Some(loc("src/b.js", 7, 1)),
            decoded.original_position_for(Position::new(2, 3))
        );
        Ok(())
    }

    #[test]
    fn chain_reaches_original() {
        // minified -> bundle.js
        let outer = ProvenanceMap::from_mappings(
            Some("bundle.js"),
            vec![
                mapping(1, 0, loc("bundle.js", 1, 0)),
                mapping(1, 8, loc("bundle.js", 2, 2)),
            ],
        );
        // bundle.js -> original modules
        let inner = ProvenanceMap::from_mappings(
            Some("bundle.js"),
            vec![
                mapping(1, 0, loc("src/a.js", 10, 0)),
                mapping(2, 0, loc("src/b.js", 20, 4)),
            ],
        );
        let chained = outer.chain(Some(&inner), "bundle.js", "ignored");
        assert_eq!(
            Some(loc("src/a.js", 10, 0)),
            chained.original_position_for(Position::new(1, 3))
        );
        assert_eq!(
            Some(loc("src/b.js", 20, 4)),
            chained.original_position_for(Position::new(1, 9))
        );
    }

    #[test]
    fn chain_without_inner_embeds_text() {
        let outer = ProvenanceMap::from_mappings(
            Some("app.js"),
            vec![mapping(1, 0, loc("app.js", 2, 4))],
        );
        let chained = outer.chain(None, "app.js", "var a;\n    a = 1;");
        assert_eq!(Some("var a;\n    a = 1;"), chained.source_contents("app.js"));
        assert_eq!(
            Some(loc("app.js", 2, 4)),
            chained.original_position_for(Position::new(1, 0))
        );
    }

    #[test]
    fn concat_shifts_first_line_only() {
        let child = ProvenanceMap::from_mappings(
            None,
            vec![
                mapping(1, 0, loc("a.js", 1, 0)),
                mapping(2, 2, loc("a.js", 5, 0)),
            ],
        );
        let mut concat = MapConcat::new(Some("out.js"));
        concat.push(&child, 1, 4);
        let map = concat.finish();
        assert_eq!(
            Some(loc("a.js", 1, 0)),
            map.original_position_for(Position::new(2, 4))
        );
        assert_eq!(None, map.original_position_for(Position::new(2, 0)));
        assert_eq!(
            Some(loc("a.js", 5, 0)),
            map.original_position_for(Position::new(3, 2))
        );
    }
}
