#![allow(dead_code)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pumice::comments::{CommentHook, CommentKind, CommentRecord};
use pumice::map::{Mapping, OriginalLocation, Position, ProvenanceMap};
use pumice::minify::{
    Minified, MinifyError, MinifyOutput, MinifyRequest, Minifier,
};
use pumice::source::{Asset, RawSource, Source, SourceMapSource};
use pumice::{Chunk, Compilation};

/// Scripted minifier.
///
/// Every code line is trimmed and the lines are joined. Lines that are
/// entirely a `/* */` or `//` comment go through the comment hook and
/// are kept verbatim when retained. A line containing `@@error` fails
/// the transform at that position.
#[derive(Debug, Clone, Default)]
pub struct FakeMinifier {
    warnings: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeMinifier {
    pub fn new() -> Self {
        Default::default()
    }

    /// Report a native warning on every successful run.
    pub fn warn(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    /// Number of times the transform ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared counter surviving a move into the plugin.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

fn comment_of(line: &str) -> Option<CommentRecord> {
    let trimmed = line.trim();
    if let Some(text) = trimmed.strip_prefix("//") {
        return Some(CommentRecord::line(text));
    }
    trimmed
        .strip_prefix("/*")
        .and_then(|rest| rest.strip_suffix("*/"))
        .map(CommentRecord::block)
}

impl Minifier for FakeMinifier {
    fn minify(
        &self,
        request: MinifyRequest<'_>,
        comments: &mut dyn CommentHook,
    ) -> MinifyOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut code = String::new();
        let mut mappings = Vec::new();
        let mut gen_line = 1;
        let mut gen_col = 0;

        for (idx, line) in request.source.lines().enumerate() {
            let line_no = idx as u32 + 1;
            if let Some(col) = line.find("@@error") {
                return MinifyOutput::failed(
                    MinifyError::new(
                        "Unexpected token",
                        Some(Position::new(line_no, col as u32)),
                    ),
                    Vec::new(),
                );
            }
            if let Some(comment) = comment_of(line) {
                if comments.comment(&comment) {
                    let rendered = comment.to_string();
                    code.push_str(&rendered);
                    gen_col += rendered.chars().count() as u32;
                    if comment.kind == CommentKind::Line {
                        code.push('\n');
                        gen_line += 1;
                        gen_col = 0;
                    }
                }
                continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let leading = (line.len() - line.trim_start().len()) as u32;
            mappings.push(Mapping {
                generated: Position::new(gen_line, gen_col),
                original: OriginalLocation::new(
                    request.file,
                    line_no,
                    leading,
                ),
            });
            code.push_str(trimmed);
            gen_col += trimmed.chars().count() as u32;
        }

        let map = request
            .source_map
            .map(|_| ProvenanceMap::from_mappings(Some(request.file), mappings));
        MinifyOutput {
            result: Ok(Minified { code, map }),
            warnings: self.warnings.clone(),
        }
    }
}

pub fn raw(text: &str) -> Asset {
    Arc::new(RawSource::new(text))
}

/// Bundle whose lines map onto the given original files in order.
pub fn bundle(lines: &[(&str, &str)]) -> Asset {
    let text = lines
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");
    let map = ProvenanceMap::from_mappings(
        Some("bundle.js"),
        lines.iter().enumerate().map(|(idx, (file, line))| Mapping {
            generated: Position::new(idx as u32 + 1, 0),
            original: OriginalLocation::new(
                *file,
                10 + idx as u32,
                (line.len() - line.trim_start().len()) as u32,
            ),
        }),
    );
    Arc::new(SourceMapSource::from_parts(text, map))
}

/// Compilation with a single chunk holding the named assets.
pub fn compilation(assets: Vec<(&str, Asset)>) -> Compilation {
    let mut compilation = Compilation::new();
    let mut files = Vec::new();
    for (name, asset) in assets {
        compilation.emit(name, asset);
        files.push(name.to_string());
    }
    compilation.chunks.push(Chunk::new("main", files));
    compilation
}

pub fn text(compilation: &Compilation, name: &str) -> String {
    compilation
        .asset(name)
        .map(|asset| asset.source().into_owned())
        .unwrap_or_else(|| panic!("missing asset {}", name))
}
