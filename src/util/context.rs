//! Global context for xcfuse operations.
//!
//! Provides centralized access to the working directory and the per-user
//! home directory. Components never look these up on their own; they receive
//! a [`BuildContext`](crate::builder::BuildContext) derived from this value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::core::manifest::MANIFEST_FILE_NAME;

/// Environment variable overriding the xcfuse home directory.
pub const HOME_ENV: &str = "XCFUSE_HOME";

/// Global context containing configuration paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global xcfuse data (~/.xcfuse/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = match std::env::var_os(HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => BaseDirs::new()
                .map(|b| b.home_dir().join(".xcfuse"))
                .unwrap_or_else(|| PathBuf::from(".xcfuse")),
        };

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
        })
    }

    /// Create a GlobalContext with explicit directories.
    pub fn with_dirs(cwd: PathBuf, home: PathBuf) -> Self {
        GlobalContext {
            cwd,
            home,
            verbose: false,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the xcfuse home directory (~/.xcfuse/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.home.join("cache")
    }

    /// Get the manifest description cache directory.
    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("manifests")
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local xcfuse directory for a package.
    pub fn project_dir(package_root: &Path) -> PathBuf {
        package_root.join(".xcfuse")
    }

    /// Get the project configuration file path for a package.
    pub fn project_config_path(package_root: &Path) -> PathBuf {
        Self::project_dir(package_root).join("config.toml")
    }

    /// Find the package root (directory containing Package.swift), starting
    /// from `start` and searching upward.
    pub fn find_package_root(&self, start: &Path) -> Result<PathBuf> {
        let start = if start.is_absolute() {
            start.to_path_buf()
        } else {
            self.cwd.join(start)
        };

        let mut current = start.clone();
        loop {
            if current.join(MANIFEST_FILE_NAME).is_file() {
                return Ok(current);
            }
            if !current.pop() {
                anyhow::bail!(
                    "could not find `{}` in `{}` or any parent directory",
                    MANIFEST_FILE_NAME,
                    start.display()
                );
            }
        }
    }
}
