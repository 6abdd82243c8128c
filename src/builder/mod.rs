//! Builder - from buildables to bundles.
//!
//! This module archives buildables per platform, reconstructs their header
//! and module surface, and assembles the archives into XCFramework bundles.

pub mod archive;
pub mod bundle;
pub mod context;
pub mod executor;
pub mod headers;
pub mod interface;
pub mod modulemap;

pub use archive::{ArchiveDescriptor, ArchiveRequest, Archiver, Platform, XcodebuildArchiver};
pub use bundle::{AssembleError, AssemblyProduct, BundleAssembler, BundleCombiner, XcodebuildCombiner};
pub use context::BuildContext;
pub use executor::BuildExecutor;
pub use headers::resolve_headers;
pub use modulemap::{ModuleMap, ModuleMapSynthesizer};
