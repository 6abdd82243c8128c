//! The package manager behind a package directory.
//!
//! xcfuse never evaluates `Package.swift` itself. The package manager prints
//! the package description as JSON and resolves dependency checkouts; this
//! module is the seam to it.

use std::path::Path;

use anyhow::{Context, Result};

use crate::util::process::{require_executable, ProcessBuilder};

/// Operations xcfuse needs from a package manager.
pub trait PackageManager: Send + Sync {
    /// Print the package description of `package_dir` as raw JSON.
    fn describe(&self, package_dir: &Path) -> Result<String>;

    /// Resolve and check out the dependencies of `package_dir`, writing
    /// `Package.resolved`.
    fn resolve(&self, package_dir: &Path) -> Result<()>;
}

/// The `swift package` command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwiftPackageManager;

impl SwiftPackageManager {
    pub fn new() -> Self {
        SwiftPackageManager
    }

    fn command(&self, package_dir: &Path, subcommand: &str) -> Result<ProcessBuilder> {
        let swift = require_executable("swift")?;
        Ok(ProcessBuilder::new(swift)
            .arg("package")
            .arg("--package-path")
            .arg(package_dir)
            .arg(subcommand))
    }
}

impl PackageManager for SwiftPackageManager {
    fn describe(&self, package_dir: &Path) -> Result<String> {
        self.command(package_dir, "dump-package")?
            .exec_stdout()
            .with_context(|| {
                format!(
                    "failed to describe package at {}",
                    package_dir.display()
                )
            })
    }

    fn resolve(&self, package_dir: &Path) -> Result<()> {
        tracing::info!("Resolving dependencies of {}", package_dir.display());
        self.command(package_dir, "resolve")?
            .exec_and_check()
            .with_context(|| {
                format!(
                    "failed to resolve dependencies of {}",
                    package_dir.display()
                )
            })?;
        Ok(())
    }
}
