//! Dependency checkouts and their versions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{DescribeOptions, Repository};
use thiserror::Error;

use crate::sources::resolved::Pin;

/// Errors raised for unusable dependency checkouts.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout of `{identity}` not found at {}", path.display())]
    Missing { identity: String, path: PathBuf },

    #[error(
        "checkout of `{identity}` at {} is not a git repository\n\
         hint: run `swift package reset` and resolve again",
        path.display()
    )]
    MissingVcs { identity: String, path: PathBuf },
}

/// A checked-out dependency ready to be packaged.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Package identity from the pin
    pub identity: String,

    /// Checkout directory
    pub path: PathBuf,

    /// Version recorded in the pin, if the dependency was pinned by version
    pub pinned_version: Option<String>,

    /// Pinned revision
    pub revision: Option<String>,
}

impl Checkout {
    /// Locate the checkout for a pin inside `package_dir`.
    pub fn from_pin(pin: &Pin, package_dir: &Path) -> Result<Self, CheckoutError> {
        let path = pin.checkout_path(package_dir);
        if !path.is_dir() {
            return Err(CheckoutError::Missing {
                identity: pin.identity.clone(),
                path,
            });
        }
        if !path.join(".git").exists() {
            return Err(CheckoutError::MissingVcs {
                identity: pin.identity.clone(),
                path,
            });
        }

        Ok(Checkout {
            identity: pin.identity.clone(),
            path,
            pinned_version: pin.state.version.clone(),
            revision: pin.state.revision.clone(),
        })
    }

    /// Version of the checkout: the pinned version, else the repository's
    /// exact tag or short revision.
    pub fn version(&self) -> Result<String> {
        match self.pinned_version {
            Some(ref version) => Ok(version.clone()),
            None => repository_version(&self.path),
        }
    }
}

/// Describe the HEAD of the repository at `path`: the tag pointing exactly at
/// it, or the abbreviated commit id.
pub fn repository_version(path: &Path) -> Result<String> {
    let repo = Repository::open(path)
        .with_context(|| format!("failed to open git repository: {}", path.display()))?;

    let mut opts = DescribeOptions::new();
    opts.describe_tags().max_candidates_tags(0);
    if let Ok(description) = repo.describe(&opts) {
        if let Ok(tag) = description.format(None) {
            return Ok(tag);
        }
    }

    let head = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .with_context(|| format!("repository has no commits: {}", path.display()))?;
    let short = head.as_object().short_id()?;
    Ok(short.as_str().unwrap_or_default().to_string())
}
