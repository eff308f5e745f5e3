//! Pipeline driver that minifies the artifacts of a compilation.
//!
//! A run plans the work in a deterministic order, transforms each
//! distinct artifact once and commits the outcomes in plan order so
//! the resulting compilation is the same whether or not the
//! transform step ran in parallel.
use std::collections::HashMap;

use rayon::prelude::*;

use crate::cache::{identity, Identity, TransformCache};
use crate::compilation::Compilation;
use crate::config::{Options, ResolvedConfig};
use crate::diagnostics::{NoShorten, Shorten};
use crate::minify::{self, Minifier, SwcMinifier};
use crate::source::{self, Asset};
use crate::writer::{ArtifactWriter, Transformed};

/// Flags derived from the compilation for a single run.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RunFlags {
    /// Whether output maps are produced.
    pub want_source_map: bool,
}

impl RunFlags {
    /// Flags for a compilation.
    pub fn of(compilation: &Compilation) -> Self {
        Self {
            want_source_map: compilation.want_source_map(),
        }
    }
}

enum Step {
    /// Substitute a previously recorded replacement.
    Cached { name: String, result: Asset },
    /// Commit the outcome of a job.
    Commit { job: usize },
    /// Same artifact as an earlier job under another name.
    Alias { name: String, job: usize },
}

struct Job {
    name: String,
    asset: Asset,
}

/// Minification pipeline.
pub struct MinifyPlugin {
    config: ResolvedConfig,
    minifier: Box<dyn Minifier>,
    shortener: Box<dyn Shorten>,
    cache: TransformCache,
}

impl MinifyPlugin {
    /// Create a pipeline using the swc minifier.
    pub fn new(options: Options) -> Self {
        Self::with_config(ResolvedConfig::resolve(options))
    }

    /// Create a pipeline from a resolved configuration.
    pub fn with_config(config: ResolvedConfig) -> Self {
        Self {
            config,
            minifier: Box::new(SwcMinifier::new()),
            shortener: Box::new(NoShorten),
            cache: TransformCache::new(),
        }
    }

    /// Use another minifier.
    pub fn minifier<M: Minifier + 'static>(mut self, minifier: M) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    /// Use another path shortener for diagnostics.
    pub fn shortener<S: Shorten + 'static>(mut self, shortener: S) -> Self {
        self.shortener = Box::new(shortener);
        self
    }

    /// Resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Cache of replacements recorded by this pipeline.
    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Minify the candidate artifacts of a compilation.
    pub fn optimize(&self, compilation: &mut Compilation) {
        let flags = RunFlags::of(compilation);
        self.optimize_with(compilation, flags)
    }

    /// Minify the candidate artifacts using explicit run flags.
    pub fn optimize_with(
        &self,
        compilation: &mut Compilation,
        flags: RunFlags,
    ) {
        let (steps, jobs) = self.plan(compilation);

        let run = |job: &Job| {
            transform(
                self.minifier.as_ref(),
                &self.config,
                job,
                flags.want_source_map,
            )
        };
        let outcomes: Vec<Transformed> = if self.config.parallel() {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };
        log::debug!("minified {} artifact(s)", outcomes.len());

        let writer = ArtifactWriter::new(
            &self.config,
            self.shortener.as_ref(),
            &self.cache,
            flags.want_source_map,
        );
        let mut outcomes: Vec<Option<Transformed>> =
            outcomes.into_iter().map(Some).collect();
        let mut results: Vec<Option<Asset>> = vec![None; jobs.len()];

        for step in steps {
            match step {
                Step::Cached { name, result } => {
                    compilation.emit(name, result);
                }
                Step::Commit { job } => {
                    if let Some(outcome) = outcomes[job].take() {
                        results[job] = writer.write(compilation, outcome);
                    }
                }
                Step::Alias { name, job } => {
                    if let Some(result) = &results[job] {
                        compilation.emit(name, result.clone());
                    }
                }
            }
        }
    }

    fn plan(&self, compilation: &Compilation) -> (Vec<Step>, Vec<Job>) {
        let mut steps = Vec::new();
        let mut jobs: Vec<Job> = Vec::new();
        let mut planned: HashMap<Identity, usize> = HashMap::new();

        for name in compilation.candidates() {
            if !self.config.matches(name) {
                log::debug!("{}: skipped by filter", name);
                continue;
            }
            let asset = match compilation.asset(name) {
                Some(asset) => asset.clone(),
                None => {
                    log::debug!("{}: listed but not emitted", name);
                    continue;
                }
            };
            if let Some(result) = self.cache.get(&asset) {
                log::debug!("{}: using cached result", name);
                steps.push(Step::Cached {
                    name: name.to_string(),
                    result,
                });
                continue;
            }
            match planned.get(&identity(&asset)) {
                Some(&job) => steps.push(Step::Alias {
                    name: name.to_string(),
                    job,
                }),
                None => {
                    let job = jobs.len();
                    planned.insert(identity(&asset), job);
                    jobs.push(Job {
                        name: name.to_string(),
                        asset,
                    });
                    steps.push(Step::Commit { job });
                }
            }
        }
        (steps, jobs)
    }
}

fn transform(
    minifier: &dyn Minifier,
    config: &ResolvedConfig,
    job: &Job,
    want_source_map: bool,
) -> Transformed {
    let (text, input_map) = source::extract(job.asset.as_ref());
    let (output, extracted) =
        minify::run(minifier, config, &job.name, &text, want_source_map);
    Transformed {
        name: job.name.clone(),
        original: job.asset.clone(),
        source: text,
        input_map,
        output,
        extracted,
    }
}
