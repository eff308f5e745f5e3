//! Host build state the pipeline operates on.
use indexmap::IndexMap;

use crate::diagnostics::Diagnostic;
use crate::source::Asset;

/// Output group listing the artifacts it emits.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// Name of the group.
    pub name: String,
    /// Artifact names in emit order.
    pub files: Vec<String>,
}

impl Chunk {
    /// Create an output group.
    pub fn new<S: Into<String>>(name: S, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Named artifacts, output groups and diagnostics of a build.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Source map setting, maps are wanted when this is truthy.
    pub devtool: Option<String>,
    /// Artifacts by name.
    pub assets: IndexMap<String, Asset>,
    /// Output groups in declaration order.
    pub chunks: Vec<Chunk>,
    /// Artifacts generated after the groups were sealed.
    pub additional_chunk_assets: Vec<String>,
    /// Errors reported during the build.
    pub errors: Vec<Diagnostic>,
    /// Warnings reported during the build.
    pub warnings: Vec<Diagnostic>,
}

impl Compilation {
    /// Create an empty compilation.
    pub fn new() -> Self {
        Default::default()
    }

    /// Determine if output maps are requested.
    pub fn want_source_map(&self) -> bool {
        match self.devtool.as_deref() {
            Some(devtool) => !devtool.is_empty() && devtool != "false",
            None => false,
        }
    }

    /// Add or replace a named artifact.
    pub fn emit<S: Into<String>>(&mut self, name: S, asset: Asset) {
        self.assets.insert(name.into(), asset);
    }

    /// Artifact by name.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    /// Candidate artifact names in processing order.
    ///
    /// Groups in order, the names listed by each group in order and
    /// then the post-hoc artifacts. A name may repeat.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.files.iter())
            .chain(self.additional_chunk_assets.iter())
            .map(|name| name.as_str())
    }
}
