//! Core data structures for xcfuse.
//!
//! This module contains the package model the pipeline works on:
//! - Package descriptions (manifest, targets, dependencies)
//! - The name-resolved target graph
//! - Buildable extraction
//! - Produced artifacts

pub mod artifact;
pub mod buildable;
pub mod dependency;
pub mod graph;
pub mod manifest;
pub mod target;

pub use artifact::Artifact;
pub use buildable::{buildables, product_buildables, BinaryTarget, Buildable};
pub use dependency::{DependencyRef, TargetDependency};
pub use graph::{TargetGraph, TargetId};
pub use manifest::{Manifest, ManifestError, Product, MANIFEST_FILE_NAME};
pub use target::{BinaryLocation, Setting, SettingKind, Target, TargetKind};
