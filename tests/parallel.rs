use std::sync::atomic::Ordering;

use anyhow::Result;
use serde_json::json;

use pumice::{Chunk, Compilation, MinifyPlugin, ResolvedConfig};

mod common;
use common::*;

fn build() -> Compilation {
    let mut compilation = Compilation::new();
    let mut files = Vec::new();
    for idx in 0..24 {
        let name = format!("part-{}.js", idx);
        let text = if idx % 5 == 3 {
            format!("/* @license part {} */\nbroken();\n@@error", idx)
        } else {
            format!("/* @license part {} */\npart({});\n  done();", idx, idx)
        };
        compilation.emit(name.clone(), raw(&text));
        files.push(name);
    }
    let shared = compilation.asset("part-0.js").unwrap().clone();
    compilation.emit("alias.js", shared);
    compilation.chunks.push(Chunk::new("main", files));
    compilation
        .chunks
        .push(Chunk::new("alias", vec!["alias.js".into()]));
    compilation
}

fn run(parallel: bool) -> (Compilation, usize) {
    let mut compilation = build();
    let minifier = FakeMinifier::new().warn("Odd [x.js:1,0]");
    let calls = minifier.counter();
    MinifyPlugin::with_config(ResolvedConfig::from_value(&json!({
        "parallel": parallel,
        "extractComments": {"condition": "some", "filename": "LICENSES"},
    })))
    .minifier(minifier)
    .optimize(&mut compilation);
    let calls = calls.load(Ordering::SeqCst);
    (compilation, calls)
}

#[test]
fn parallel_run_matches_sequential_run() -> Result<()> {
    let (sequential, sequential_calls) = run(false);
    let (parallel, parallel_calls) = run(true);

    assert_eq!(24, sequential_calls);
    assert_eq!(sequential_calls, parallel_calls);

    let names = |c: &Compilation| c.assets.keys().cloned().collect::<Vec<_>>();
    assert_eq!(names(&sequential), names(&parallel));
    for name in names(&sequential) {
        assert_eq!(text(&sequential, &name), text(&parallel, &name));
    }
    assert_eq!(sequential.errors, parallel.errors);
    assert_eq!(sequential.warnings, parallel.warnings);

    let licenses = text(&parallel, "LICENSES");
    let order = (0..24)
        .filter(|idx| idx % 5 != 3)
        .map(|idx| format!("/* @license part {} */\n", idx))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(order, licenses);
    assert_eq!(text(&parallel, "part-0.js"), text(&parallel, "alias.js"));
    assert_eq!(5, parallel.errors.len());
    Ok(())
}
