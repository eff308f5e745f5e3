//! Fixture helpers shared by the integration tests.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory holding the test fixtures.
pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("fixtures")
}

/// Read a file normalizing windows line endings.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let mut content = std::fs::read_to_string(path)
        .context(format!("Unable to read fixture {}", path.display()))?;
    if cfg!(target_os = "windows") {
        content = content.replace("\r\n", "\n");
    }
    Ok(content)
}

/// Read a file from the fixtures directory.
pub fn fixture(name: &str) -> Result<String> {
    read_to_string(fixtures().join(name))
}
