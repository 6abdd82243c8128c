//! xcfuse - turns Swift packages into multi-platform XCFramework bundles
//!
//! This crate provides the library behind the `xcfuse` binary: package
//! description loading, buildable extraction, header and module map
//! reconstruction, and bundle assembly.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and fakes for xcfuse unit tests.
///
/// Only compiled for tests. It provides package description fixtures and
/// in-process stand-ins for the package manager, the archiver and the
/// bundle combiner.
#[cfg(test)]
pub mod test_support;

pub use core::{
    buildable::Buildable, manifest::Manifest, manifest::ManifestError, target::Target,
};
pub use util::context::GlobalContext;
