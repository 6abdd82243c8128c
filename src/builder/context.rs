//! Build context - directories, platforms and options for one pipeline run.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::archive::Platform;
use crate::util::config::Config;
use crate::util::fs;

/// Everything the builder components need to know about a run.
///
/// Built once from configuration and command-line flags and passed into
/// every component; nothing reads paths from the environment on its own.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Where per-platform archives are written
    pub archive_dir: PathBuf,

    /// Where bundles and `artifacts.json` are written
    pub output_dir: PathBuf,

    /// Build configuration passed to the archiver
    pub configuration: String,

    /// Attach debug symbols to bundles
    pub debug_symbols: bool,

    /// Number of parallel archive jobs (None = one per core)
    pub jobs: Option<usize>,

    /// Platforms to archive for
    pub platforms: Vec<Platform>,
}

impl BuildContext {
    /// Create a context with default options for the given output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        BuildContext {
            archive_dir: output_dir.join("archives"),
            output_dir,
            configuration: "Release".to_string(),
            debug_symbols: true,
            jobs: None,
            platforms: Platform::defaults().to_vec(),
        }
    }

    /// Create a context from merged configuration.
    pub fn from_config(config: &Config, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(BuildContext {
            configuration: config.configuration().to_string(),
            debug_symbols: config.debug_symbols(),
            jobs: config.build.jobs,
            platforms: config.platforms()?,
            ..BuildContext::new(output_dir)
        })
    }

    /// Override the platforms to archive for.
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        if !platforms.is_empty() {
            self.platforms = platforms;
        }
        self
    }

    /// Override the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self
    }

    /// Create the output and archive directories.
    pub fn prepare(&self) -> Result<()> {
        fs::ensure_dir(&self.output_dir)?;
        fs::ensure_dir(&self.archive_dir)?;
        Ok(())
    }

    /// Check whether [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.output_dir.is_dir()
    }

    /// Archive location for one buildable on one platform:
    /// `<archive_dir>/<package>/<buildable>-<platform>.xcarchive`.
    pub fn archive_path(&self, package: &str, buildable: &str, platform: Platform) -> PathBuf {
        self.archive_dir
            .join(package)
            .join(format!("{}-{}.xcarchive", buildable, platform))
    }

    /// Output bundle location for a product.
    pub fn bundle_path(&self, product: &str) -> PathBuf {
        bundle_path(&self.output_dir, product)
    }
}

/// `<output_dir>/<product>.xcframework`
pub fn bundle_path(output_dir: &Path, product: &str) -> PathBuf {
    output_dir.join(format!("{}.xcframework", product))
}
