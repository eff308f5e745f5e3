use anyhow::Result;

#[test]
fn minify_writes_outputs_and_sidecars() -> Result<()> {
    let fixtures = testing::fixtures();
    let out = std::env::temp_dir()
        .join(format!("pumice-cli-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&out);

    pumice::cli::run(Some(vec![
        "pumice".into(),
        "minify".into(),
        "-c".into(),
        fixtures.join("options.json").into_os_string(),
        "-o".into(),
        out.clone().into_os_string(),
        "--source-map".into(),
        "--context".into(),
        fixtures.clone().into_os_string(),
        fixtures.join("license.js").into_os_string(),
    ]))?;

    let code = testing::read_to_string(out.join("license.js"))?;
    assert!(code.contains("sourceMappingURL=license.js.map"));
    assert!(!code.contains("@license"));
    assert_eq!(
        "/* @license MIT */\n",
        testing::read_to_string(out.join("license.js.LICENSE"))?
    );
    let map = pumice::map::ProvenanceMap::from_slice(&std::fs::read(
        out.join("license.js.map"),
    )?)?;
    assert!(!map.mappings().is_empty());

    std::fs::remove_dir_all(&out)?;
    Ok(())
}

#[test]
fn sidecar_in_a_subdirectory_is_written() -> Result<()> {
    let fixtures = testing::fixtures();
    let out = std::env::temp_dir()
        .join(format!("pumice-cli-nested-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&out);

    pumice::cli::run(Some(vec![
        "pumice".into(),
        "minify".into(),
        "-c".into(),
        fixtures.join("nested-sidecar.json").into_os_string(),
        "-o".into(),
        out.clone().into_os_string(),
        "--source-map".into(),
        fixtures.join("license.js").into_os_string(),
    ]))?;

    assert_eq!(
        "/* @license MIT */\n",
        testing::read_to_string(out.join("licenses").join("license.js.txt"))?
    );
    assert!(!testing::read_to_string(out.join("license.js"))?.contains("@license"));
    assert!(out.join("license.js.map").is_file());

    std::fs::remove_dir_all(&out)?;
    Ok(())
}

#[test]
fn missing_input_fails() {
    let result = pumice::cli::run(Some(vec![
        "pumice",
        "minify",
        "does-not-exist.js",
    ]));
    assert!(result.is_err());
}
