//! Builds replacement artifacts, sidecars and diagnostics from the
//! outcome of a minification.
use std::sync::Arc;

use crate::cache::TransformCache;
use crate::comments::CommentRecord;
use crate::compilation::Compilation;
use crate::config::ResolvedConfig;
use crate::diagnostics::{Shorten, Translator};
use crate::map::ProvenanceMap;
use crate::minify::MinifyOutput;
use crate::source::{Asset, ConcatSource, RawSource, Source, SourceMapSource};

/// Outcome of minifying one artifact.
#[derive(Debug)]
pub struct Transformed {
    /// Artifact name.
    pub name: String,
    /// Artifact that was minified.
    pub original: Asset,
    /// Text handed to the minifier.
    pub source: String,
    /// Provenance map of the original artifact.
    pub input_map: Option<ProvenanceMap>,
    /// Minifier output.
    pub output: MinifyOutput,
    /// Comments selected for extraction, in encounter order.
    pub extracted: Vec<CommentRecord>,
}

/// Writes transformation outcomes into a compilation.
pub struct ArtifactWriter<'a> {
    config: &'a ResolvedConfig,
    shortener: &'a dyn Shorten,
    cache: &'a TransformCache,
    want_source_map: bool,
}

impl<'a> ArtifactWriter<'a> {
    /// Create a writer.
    pub fn new(
        config: &'a ResolvedConfig,
        shortener: &'a dyn Shorten,
        cache: &'a TransformCache,
        want_source_map: bool,
    ) -> Self {
        Self {
            config,
            shortener,
            cache,
            want_source_map,
        }
    }

    /// Apply an outcome to the compilation.
    ///
    /// Returns the replacement artifact, or `None` when minification
    /// failed and the original artifact was left in place.
    pub fn write(
        &self,
        compilation: &mut Compilation,
        transformed: Transformed,
    ) -> Option<Asset> {
        let Transformed {
            name,
            original,
            source,
            input_map,
            output,
            extracted,
        } = transformed;

        let translator = Translator::new(
            &name,
            input_map.as_ref(),
            self.shortener,
            self.config,
        );

        let minified = match output.result {
            Ok(minified) => minified,
            Err(e) => {
                log::debug!("{}: minification failed: {}", name, e);
                compilation.errors.push(translator.error_diagnostic(&e));
                return None;
            }
        };

        let mut result: Asset = match (self.want_source_map, &minified.map) {
            (true, Some(map)) => Arc::new(SourceMapSource::new(
                minified.code,
                &name,
                map,
                &source,
                input_map.as_ref(),
            )),
            _ => Arc::new(RawSource::new(minified.code)),
        };

        if !extracted.is_empty() {
            if let Some(extraction) = self.config.extraction() {
                let sidecar = extraction.target_name_of(&name);
                self.append_sidecar(compilation, &sidecar, &extracted);
                if let Some(banner) = extraction.banner_of(&sidecar) {
                    let mut concat = ConcatSource::default();
                    concat.add_text(format!("/*! {} */\n", banner));
                    concat.add(result);
                    result = Arc::new(concat);
                }
            }
        }

        compilation.emit(name.clone(), result.clone());
        self.cache.put(&original, &result);

        if let Some(diagnostic) =
            translator.warnings_diagnostic(&output.warnings)
        {
            compilation.warnings.push(diagnostic);
        }

        Some(result)
    }

    fn append_sidecar(
        &self,
        compilation: &mut Compilation,
        sidecar: &str,
        comments: &[CommentRecord],
    ) {
        let text = comments
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n\n");
        let contents: Asset = Arc::new(RawSource::new(format!("{}\n", text)));

        let merged: Asset = match compilation.asset(sidecar) {
            Some(existing) => {
                log::debug!("{}: appending to existing sidecar", sidecar);
                let separator = if existing.source().ends_with('\n') {
                    "\n"
                } else {
                    "\n\n"
                };
                let mut concat = ConcatSource::default();
                concat.add(existing.clone());
                concat.add_text(separator);
                concat.add(contents);
                Arc::new(concat)
            }
            None => contents,
        };
        compilation.emit(sidecar, merged);
    }
}
