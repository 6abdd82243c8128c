//! Configuration file support for xcfuse.
//!
//! xcfuse reads two configuration file locations:
//! - Global: `~/.xcfuse/config.toml` - User-wide defaults
//! - Project: `.xcfuse/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::archive::Platform;

/// xcfuse configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Platforms to archive for (e.g. "ios", "ios-simulator")
    pub platforms: Vec<String>,

    /// Build configuration passed to the archiver (Debug or Release)
    pub configuration: Option<String>,

    /// Number of parallel archive jobs
    pub jobs: Option<usize>,

    /// Attach debug symbols to bundles
    pub debug_symbols: Option<bool>,

    /// Reuse bundles that already exist in the output directory
    pub skip_existing: Option<bool>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where bundles and artifacts.json are written
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if !other.build.platforms.is_empty() {
            self.build.platforms = other.build.platforms;
        }
        if other.build.configuration.is_some() {
            self.build.configuration = other.build.configuration;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.debug_symbols.is_some() {
            self.build.debug_symbols = other.build.debug_symbols;
        }
        if other.build.skip_existing.is_some() {
            self.build.skip_existing = other.build.skip_existing;
        }
        if other.output.dir.is_some() {
            self.output.dir = other.output.dir;
        }
    }

    /// Parse the configured platform names.
    ///
    /// Falls back to device + simulator iOS when nothing is configured.
    pub fn platforms(&self) -> Result<Vec<Platform>> {
        if self.build.platforms.is_empty() {
            return Ok(Platform::defaults().to_vec());
        }
        self.build
            .platforms
            .iter()
            .map(|p| p.parse::<Platform>().map_err(|e| anyhow::anyhow!("{}", e)))
            .collect()
    }

    /// Build configuration name, defaulting to Release.
    pub fn configuration(&self) -> &str {
        self.build.configuration.as_deref().unwrap_or("Release")
    }

    /// Whether debug symbols are attached (default: true).
    pub fn debug_symbols(&self) -> bool {
        self.build.debug_symbols.unwrap_or(true)
    }

    /// Whether existing bundles are reused (default: true).
    pub fn skip_existing(&self) -> bool {
        self.build.skip_existing.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.xcfuse/config.toml)
/// 2. Global config (~/.xcfuse/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
