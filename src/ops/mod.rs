//! High-level operations.
//!
//! This module contains the implementation of xcfuse commands.

pub mod cache;
pub mod xcfuse_build;

pub use cache::{clean_manifest_cache, manifest_cache_entries};
pub use xcfuse_build::{build, package_version, BuildOptions, Collaborators};
