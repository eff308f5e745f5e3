//! Artifact handles and access to their text and provenance map.
//!
//! The host owns artifacts and shares them as [Asset] values. The
//! pipeline never mutates an artifact, it builds new ones from the
//! types in this module.
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::map::{MapConcat, ProvenanceMap};

/// Shared artifact handle, the pointer is the artifact identity.
pub type Asset = Arc<dyn Source>;

/// Generated text with an optional provenance map.
pub trait Source: Send + Sync + fmt::Debug {
    /// Current text.
    fn source(&self) -> Cow<'_, str>;

    /// Current provenance map.
    fn map(&self) -> Option<ProvenanceMap>;

    /// Text and map computed together.
    ///
    /// Sources that derive both from the same work implement this so
    /// the work is done once; the default reports it as unsupported.
    fn source_and_map(&self) -> Option<(String, Option<ProvenanceMap>)> {
        None
    }
}

/// Extract the text and provenance map of an artifact.
///
/// Uses the combined accessor when the artifact supports it and falls
/// back to the two separate accessors.
pub fn extract(artifact: &dyn Source) -> (String, Option<ProvenanceMap>) {
    match artifact.source_and_map() {
        Some(pair) => pair,
        None => (artifact.source().into_owned(), artifact.map()),
    }
}

/// Text without a provenance map.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawSource {
    text: String,
}

impl RawSource {
    /// Create a raw source.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

impl Source for RawSource {
    fn source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn map(&self) -> Option<ProvenanceMap> {
        None
    }
}

/// Text carrying a provenance map.
#[derive(Debug, Clone)]
pub struct SourceMapSource {
    code: String,
    map: ProvenanceMap,
}

impl SourceMapSource {
    /// Create a source for text produced from an intermediate text.
    ///
    /// `map` maps `code` onto `intermediate` (the artifact `name`)
    /// which in turn maps onto the original sources through
    /// `intermediate_map`. The stored map is the chain of both.
    pub fn new<S: Into<String>>(
        code: S,
        name: &str,
        map: &ProvenanceMap,
        intermediate: &str,
        intermediate_map: Option<&ProvenanceMap>,
    ) -> Self {
        Self {
            code: code.into(),
            map: map.chain(intermediate_map, name, intermediate),
        }
    }

    /// Create a source from text and its final map.
    pub fn from_parts<S: Into<String>>(code: S, map: ProvenanceMap) -> Self {
        Self {
            code: code.into(),
            map,
        }
    }
}

impl Source for SourceMapSource {
    fn source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.code)
    }

    fn map(&self) -> Option<ProvenanceMap> {
        Some(self.map.clone())
    }

    fn source_and_map(&self) -> Option<(String, Option<ProvenanceMap>)> {
        Some((self.code.clone(), Some(self.map.clone())))
    }
}

/// Ordered concatenation of sources.
#[derive(Debug, Clone, Default)]
pub struct ConcatSource {
    children: Vec<Asset>,
}

impl ConcatSource {
    /// Create a concatenation of sources.
    pub fn new(children: Vec<Asset>) -> Self {
        Self { children }
    }

    /// Append a source.
    pub fn add(&mut self, child: Asset) {
        self.children.push(child);
    }

    /// Append raw text.
    pub fn add_text<S: Into<String>>(&mut self, text: S) {
        self.children.push(Arc::new(RawSource::new(text)));
    }

    /// Child sources in order.
    pub fn children(&self) -> &[Asset] {
        &self.children
    }
}

impl Source for ConcatSource {
    fn source(&self) -> Cow<'_, str> {
        Cow::Owned(
            self.children
                .iter()
                .map(|child| child.source().into_owned())
                .collect::<Vec<_>>()
                .join(""),
        )
    }

    fn map(&self) -> Option<ProvenanceMap> {
        self.source_and_map().and_then(|(_, map)| map)
    }

    fn source_and_map(&self) -> Option<(String, Option<ProvenanceMap>)> {
        let mut text = String::new();
        let mut concat = MapConcat::new(None);
        let mut mapped = false;
        for child in self.children.iter() {
            let (child_text, child_map) = extract(child.as_ref());
            if let Some(map) = child_map {
                let (line, column) = end_of(&text);
                concat.push(&map, line, column);
                mapped = true;
            }
            text.push_str(&child_text);
        }
        let map = if mapped { Some(concat.finish()) } else { None };
        Some((text, map))
    }
}

/// Zero-based line and column where appended text would start.
fn end_of(text: &str) -> (u32, u32) {
    let line = text.matches('\n').count() as u32;
    let last = match text.rfind('\n') {
        Some(idx) => &text[idx + 1..],
        None => text,
    };
    (line, last.chars().count() as u32)
}
