//! Produced artifacts and the `artifacts.json` index.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs;

/// File name of the artifact index inside the output directory.
pub const ARTIFACT_INDEX_FILE: &str = "artifacts.json";

/// A bundle produced (or reused) by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Bundle name
    pub name: String,

    /// Version of the package the bundle was built from
    pub version: String,

    /// Bundle location
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, version: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Artifact {
            name: name.into(),
            version: version.into(),
            path: path.into(),
        }
    }
}

/// Write the artifact index into `output_dir`, replacing any previous one.
pub fn write_index(output_dir: &Path, artifacts: &[Artifact]) -> Result<PathBuf> {
    let path = output_dir.join(ARTIFACT_INDEX_FILE);
    let json = serde_json::to_string_pretty(artifacts)
        .context("failed to serialize artifact index")?;
    fs::write_atomic(&path, json.as_bytes())?;
    tracing::debug!("wrote {} artifact(s) to {}", artifacts.len(), path.display());
    Ok(path)
}

/// Read a previously written artifact index.
pub fn read_index(output_dir: &Path) -> Result<Vec<Artifact>> {
    let path = output_dir.join(ARTIFACT_INDEX_FILE);
    let text = fs::read_to_string(&path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse artifact index: {}", path.display()))
}
