//! `Package.resolved` - the dependency pins written by the package manager.
//!
//! Only the pins are read. Versions 2 and 3 of the file share the same pin
//! layout; version 1 nested pins under `object` and is not supported.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::util::fs;

/// File name of the resolved-state file inside a package directory.
pub const RESOLVED_FILE_NAME: &str = "Package.resolved";

/// Directory holding dependency checkouts, relative to the package root.
pub const CHECKOUTS_DIR: &str = ".build/checkouts";

/// The resolved dependency state of a package.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedState {
    pub version: u32,

    #[serde(default)]
    pub pins: Vec<Pin>,
}

/// A pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pin {
    /// Package identity (lowercase)
    pub identity: String,

    /// Source kind (`remoteSourceControl`, `localSourceControl`, `registry`)
    pub kind: String,

    /// Repository URL or path
    pub location: String,

    /// Pinned state
    pub state: PinState,
}

/// The pinned revision of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinState {
    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub branch: Option<String>,
}

impl ResolvedState {
    /// Parse resolved state from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let state: ResolvedState =
            serde_json::from_str(text).context("failed to parse Package.resolved")?;
        if state.version < 2 {
            bail!(
                "Package.resolved version {} is not supported (expected 2 or later)",
                state.version
            );
        }
        Ok(state)
    }

    /// Load `Package.resolved` from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load the resolved state of the package in `package_dir`.
    pub fn load_for_package(package_dir: &Path) -> Result<Self> {
        Self::load(&package_dir.join(RESOLVED_FILE_NAME))
    }

    /// Pins backed by source control, in file order.
    pub fn source_control_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|pin| {
            if pin.is_source_control() {
                true
            } else {
                tracing::info!("skipping `{}`: {} pins have no checkout", pin.identity, pin.kind);
                false
            }
        })
    }
}

impl Pin {
    pub fn is_source_control(&self) -> bool {
        self.kind.ends_with("SourceControl")
    }

    /// Checkout directory name: last location component without `.git`.
    pub fn checkout_name(&self) -> &str {
        let last = self
            .location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.location);
        last.strip_suffix(".git").unwrap_or(last)
    }

    /// Checkout directory of this pin inside `package_dir`.
    pub fn checkout_path(&self, package_dir: &Path) -> PathBuf {
        package_dir.join(CHECKOUTS_DIR).join(self.checkout_name())
    }
}
