//! Test utilities and fakes for xcfuse unit tests.
//!
//! The pipeline talks to three external tools: the package manager, the
//! platform archiver and the bundle combiner. This module provides in-process
//! stand-ins for each of them that produce the same on-disk layout as the
//! real tools and record how they were called.
//!
//! # Example
//!
//! ```rust,ignore
//! use xcfuse::test_support::{fixtures, FakePackageManager};
//!
//! #[test]
//! fn test_example() {
//!     let pm = FakePackageManager::new(fixtures::DUMP_PACKAGE_JSON);
//!     let loader = ManifestLoader::new(cache_dir, &pm);
//!     loader.load(&package_dir).unwrap();
//!     assert_eq!(pm.describe_calls(), 1);
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::archive::{ArchiveDescriptor, ArchiveRequest, Archiver, Platform};
use crate::builder::bundle::BundleCombiner;
use crate::core::manifest::MANIFEST_FILE_NAME;
use crate::sources::package_manager::PackageManager;
use crate::util::fs;

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Create a package directory named `name` under `base` with a
/// `Package.swift`.
pub fn create_test_package(base: &Path, name: &str) -> PathBuf {
    let dir = base.join(name);
    write_file(&dir.join(MANIFEST_FILE_NAME), fixtures::PACKAGE_SWIFT);
    dir
}

/// Lay out an `.xcarchive` the way the archiver does and describe it.
///
/// The framework carries a binary, an `Info.plist`, an empty `Headers/`
/// and a Swift interface; the archive carries a matching dSYM.
pub fn fake_archive(archive_path: &Path, name: &str, platform: Platform) -> ArchiveDescriptor {
    let descriptor = ArchiveDescriptor::in_archive(archive_path, name, platform);
    let framework = &descriptor.framework_path;

    write_file(&framework.join(name), "binary");
    write_file(&framework.join("Info.plist"), "<plist/>");
    std::fs::create_dir_all(framework.join("Headers")).unwrap();
    write_file(
        &framework
            .join("Modules")
            .join(format!("{}.swiftmodule", name))
            .join("arm64-apple-ios.swiftinterface"),
        "import Foundation\n",
    );
    if let Some(ref dsym) = descriptor.debug_symbols_path {
        write_file(&dsym.join("Contents/Info.plist"), "<plist/>");
    }

    descriptor
}

/// Package manager returning a fixed description.
#[derive(Debug, Default)]
pub struct FakePackageManager {
    description: String,
    describe_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
}

impl FakePackageManager {
    pub fn new(description: impl Into<String>) -> Self {
        FakePackageManager {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

impl PackageManager for FakePackageManager {
    fn describe(&self, _package_dir: &Path) -> Result<String> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.description.clone())
    }

    fn resolve(&self, _package_dir: &Path) -> Result<()> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Archiver writing fake archives with [`fake_archive`].
#[derive(Debug, Default)]
pub struct FakeArchiver {
    requests: Mutex<Vec<ArchiveRequest>>,
    failing: Option<Platform>,
}

impl FakeArchiver {
    pub fn new() -> Self {
        FakeArchiver::default()
    }

    /// Fail every request for `platform`.
    pub fn failing_on(mut self, platform: Platform) -> Self {
        self.failing = Some(platform);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ArchiveRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Archiver for FakeArchiver {
    fn archive(&self, request: &ArchiveRequest) -> Result<ArchiveDescriptor> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing == Some(request.platform) {
            bail!("archiver failed for {}", request.platform);
        }
        Ok(fake_archive(
            &request.archive_path,
            &request.scheme,
            request.platform,
        ))
    }
}

/// Combiner copying each framework to `<output>/<platform id>/`.
#[derive(Debug, Default)]
pub struct FakeCombiner {
    calls: AtomicUsize,
    fail_next: AtomicBool,
    last_inputs: Mutex<Vec<ArchiveDescriptor>>,
}

impl FakeCombiner {
    pub fn new() -> Self {
        FakeCombiner::default()
    }

    /// Make the next call write a partial bundle and fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of successful calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Archives passed to the most recent call.
    pub fn last_inputs(&self) -> Vec<ArchiveDescriptor> {
        self.last_inputs.lock().unwrap().clone()
    }
}

impl BundleCombiner for FakeCombiner {
    fn combine(&self, archives: &[ArchiveDescriptor], output: &Path) -> Result<()> {
        *self.last_inputs.lock().unwrap() = archives.to_vec();

        if self.fail_next.swap(false, Ordering::SeqCst) {
            fs::write_string(&output.join("Info.plist"), "<partial/>")?;
            bail!("combiner failed");
        }

        for archive in archives {
            let framework_name = fs::file_name_str(&archive.framework_path);
            let slice = output.join(&archive.platform_identifier);
            fs::copy_dir_all(&archive.framework_path, &slice.join(framework_name))?;
            if let Some(ref dsym) = archive.debug_symbols_path {
                fs::copy_dir_all(dsym, &slice.join("dSYMs").join(fs::file_name_str(dsym)))?;
            }
        }
        fs::write_string(&output.join("Info.plist"), "<plist/>")?;

        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
