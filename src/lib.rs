//! Minify generated JavaScript artifacts while keeping their
//! provenance maps, extracting license comments into sidecar files and
//! reporting minifier diagnostics against the original sources.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

pub mod cache;
pub mod cli;
pub mod comments;
pub mod compilation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod map;
pub mod minify;
pub mod plugin;
pub mod rules;
pub mod source;
pub mod writer;

pub use compilation::{Chunk, Compilation};
pub use config::{Options, ResolvedConfig};
pub use error::Error;
pub use plugin::{MinifyPlugin, RunFlags};

use diagnostics::{Diagnostic, RequestShortener};
use map::ProvenanceMap;
use source::{Asset, RawSource, SourceMapSource};

#[derive(Serialize)]
struct Report<'a> {
    errors: &'a [Diagnostic],
    warnings: &'a [Diagnostic],
}

fn load_options(path: Option<PathBuf>) -> Result<Value> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Value::Null),
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read options {:?}", path))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Options {:?} are not valid JSON", path))
}

fn load_asset(file: &Path) -> Result<Asset> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;
    let map_file = PathBuf::from(format!("{}.map", file.display()));
    if map_file.is_file() {
        log::debug!("using input map {:?}", map_file);
        let bytes = std::fs::read(&map_file)?;
        let map = ProvenanceMap::from_slice(&bytes)
            .with_context(|| format!("Invalid source map {:?}", map_file))?;
        Ok(Arc::new(SourceMapSource::from_parts(text, map)))
    } else {
        Ok(Arc::new(RawSource::new(text)))
    }
}

/// Minify files into an output directory.
pub fn minify(
    files: Vec<PathBuf>,
    options: Option<PathBuf>,
    output: PathBuf,
    source_map: bool,
    context: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    for f in files.iter() {
        if !f.is_file() {
            bail!("Input file {:?} does not exist", f);
        }
    }

    let options = load_options(options)?;
    let context = match context {
        Some(context) => context,
        None => std::env::current_dir()?,
    };
    let plugin = MinifyPlugin::with_config(ResolvedConfig::from_value(&options))
        .shortener(RequestShortener::new(&context));

    let mut compilation = Compilation::new();
    if source_map {
        compilation.devtool = Some("source-map".to_string());
    }

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for f in files.iter() {
        let name = f
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Invalid input file name {:?}", f))?;
        if !seen.insert(name.clone()) {
            bail!("Duplicate input file name {}", name);
        }
        compilation.emit(name.clone(), load_asset(f)?);
        names.push(name);
    }
    compilation.chunks.push(Chunk::new("main", names));

    plugin.optimize(&mut compilation);

    if json {
        let report = Report {
            errors: &compilation.errors,
            warnings: &compilation.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for warning in compilation.warnings.iter() {
            log::warn!("{}", warning);
        }
        for error in compilation.errors.iter() {
            log::error!("{}", error);
        }
    }

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {:?}", output))?;
    for (name, asset) in compilation.assets.iter() {
        let dest = output.join(name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let (mut text, map) = source::extract(asset.as_ref());
        if let (true, Some(map)) = (source_map, map) {
            let map_name = format!("{}.map", name);
            std::fs::write(output.join(&map_name), map.to_json()?)?;
            let reference = Path::new(&map_name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(map_name);
            text.push_str(&format!("\n//# sourceMappingURL={}", reference));
        }
        std::fs::write(&dest, text)
            .with_context(|| format!("Failed to write {:?}", dest))?;
        log::info!("wrote {}", dest.display());
    }

    if !compilation.errors.is_empty() {
        bail!("{} file(s) failed to minify", compilation.errors.len());
    }
    Ok(())
}
