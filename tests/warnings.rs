use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use pumice::diagnostics::{DiagnosticKind, RequestShortener};
use pumice::rules::Rule;
use pumice::{Compilation, MinifyPlugin, Options, ResolvedConfig};

mod common;
use common::*;

fn two_files() -> Compilation {
    compilation(vec![(
        "app.js",
        bundle(&[
            ("/proj/src/a.js", "var x = 1;"),
            ("/proj/src/b.js", "  y();"),
        ]),
    )])
}

fn minifier() -> FakeMinifier {
    FakeMinifier::new()
        .warn("Dropping unused variable x [app.js:1,0]")
        .warn("Side effects in initialization [app.js:2,2]")
}

#[test]
fn warnings_point_at_original_sources() -> Result<()> {
    let mut compilation = two_files();
    MinifyPlugin::with_config(ResolvedConfig::default())
        .minifier(minifier())
        .shortener(RequestShortener::new("/proj"))
        .optimize(&mut compilation);

    assert_eq!(1, compilation.warnings.len());
    let warning = &compilation.warnings[0];
    assert_eq!(DiagnosticKind::ProcessingWarning, warning.kind);
    assert_eq!(
        vec![
            "Dropping unused variable x [./src/a.js:10,0]",
            "Side effects in initialization [./src/b.js:11,2]",
        ],
        warning.lines()
    );
    Ok(())
}

#[test]
fn warnings_filter_drops_rejected_sources() -> Result<()> {
    let mut options = Options::default();
    options.warnings_filter =
        Some(vec![Rule::Custom(Arc::new(|file: &str| {
            !file.ends_with("b.js")
        }))]);

    let mut compilation = two_files();
    MinifyPlugin::new(options)
        .minifier(minifier())
        .optimize(&mut compilation);

    assert_eq!(1, compilation.warnings.len());
    assert_eq!(
        "Dropping unused variable x [/proj/src/a.js:10,0]",
        compilation.warnings[0].message
    );
    Ok(())
}

#[test]
fn fully_filtered_warnings_emit_nothing() -> Result<()> {
    let mut compilation = two_files();
    MinifyPlugin::with_config(ResolvedConfig::from_value(
        &json!({"warningsFilter": "/vendor/"}),
    ))
    .minifier(minifier())
    .optimize(&mut compilation);

    assert!(compilation.warnings.is_empty());
    Ok(())
}

#[test]
fn warnings_without_input_map_pass_through() -> Result<()> {
    let mut compilation = compilation(vec![("app.js", raw("x();\ny();"))]);
    MinifyPlugin::with_config(ResolvedConfig::from_value(
        &json!({"warningsFilter": "nothing"}),
    ))
    .minifier(minifier())
    .optimize(&mut compilation);

    assert_eq!(
        vec![
            "Dropping unused variable x [app.js:1,0]",
            "Side effects in initialization [app.js:2,2]",
        ],
        compilation.warnings[0].lines()
    );
    Ok(())
}

#[test]
fn unmarked_and_unresolvable_warnings() -> Result<()> {
    let mut compilation = two_files();
    MinifyPlugin::with_config(ResolvedConfig::default())
        .minifier(
            FakeMinifier::new()
                .warn("Something without a marker")
                .warn("Past the end [app.js:9,0]"),
        )
        .optimize(&mut compilation);

    assert_eq!(
        vec!["Something without a marker", "Past the end"],
        compilation.warnings[0].lines()
    );
    Ok(())
}
