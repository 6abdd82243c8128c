//! Buildable extraction.
//!
//! Walks a manifest's products down to the units the pipeline has to deal
//! with: targets that need compiling, and binary targets that are already
//! compiled and only need to be referenced.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::core::manifest::{Manifest, Product};
use crate::core::target::{BinaryLocation, Target};

/// A pre-built binary target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BinaryTarget {
    /// Declaring target name
    pub target: String,

    /// Declared artifact location
    pub location: BinaryLocation,
}

impl BinaryTarget {
    /// Artifact name from the location, falling back to the target name.
    pub fn name(&self) -> String {
        self.location
            .artifact_name()
            .unwrap_or_else(|| self.target.clone())
    }
}

/// A unit the pipeline either compiles or references as a binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Buildable {
    /// Source target, compiled per platform
    Target { name: String },

    /// Already compiled artifact
    BinaryTarget(BinaryTarget),
}

impl Buildable {
    /// Display name of the unit.
    pub fn name(&self) -> String {
        match self {
            Buildable::Target { name } => name.clone(),
            Buildable::BinaryTarget(binary) => binary.name(),
        }
    }

    /// Logical identity used for deduplication.
    ///
    /// Binary targets are identified by their declared path or URL, so two
    /// targets pointing at the same artifact collapse into one unit.
    pub fn identity(&self) -> String {
        match self {
            Buildable::Target { name } => format!("target:{}", name),
            Buildable::BinaryTarget(binary) => format!("binary:{}", binary.location.identity()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Buildable::BinaryTarget(_))
    }
}

impl fmt::Display for Buildable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Buildable::Target { name } => write!(f, "target({})", name),
            Buildable::BinaryTarget(binary) => {
                write!(f, "binaryTarget({} @ {})", binary.name(), binary.location)
            }
        }
    }
}

/// Buildables for every product of the manifest, in product declaration
/// order, without duplicates.
pub fn buildables(manifest: &Manifest) -> Vec<Buildable> {
    collect(manifest, manifest.products())
}

/// Buildables for a single product.
pub fn product_buildables(manifest: &Manifest, product: &Product) -> Vec<Buildable> {
    collect(manifest, std::slice::from_ref(product))
}

fn collect(manifest: &Manifest, products: &[Product]) -> Vec<Buildable> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for target in manifest.closure(products) {
        let Some(buildable) = classify(manifest, target) else {
            continue;
        };
        if seen.insert(buildable.identity()) {
            out.push(buildable);
        }
    }

    out
}

fn classify(manifest: &Manifest, target: &Target) -> Option<Buildable> {
    if let Some(ref location) = target.binary {
        return Some(Buildable::BinaryTarget(BinaryTarget {
            target: target.name.clone(),
            location: location.clone(),
        }));
    }

    if let Some(binary) = wrapped_binary(manifest, target) {
        if target.settings.is_empty() {
            tracing::debug!(
                "skipping `{}`: it only wraps binary target `{}`",
                target.name,
                binary.name
            );
        } else {
            tracing::debug!(
                "skipping `{}`: it only wraps binary target `{}` (the wrapper declares {} setting(s) that will not be built)",
                target.name,
                binary.name,
                target.settings.len()
            );
        }
        return None;
    }

    Some(Buildable::Target {
        name: target.name.clone(),
    })
}

/// The binary target a source target wraps: its only dependency name
/// resolves to a binary target.
fn wrapped_binary<'m>(manifest: &'m Manifest, target: &Target) -> Option<&'m Target> {
    let mut names = target.dependency_names();
    let only = names.next()?;
    if names.next().is_some() {
        return None;
    }
    manifest.target(only).filter(|dep| dep.is_binary())
}
