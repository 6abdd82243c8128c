//! Package description loading with a content-addressed cache.
//!
//! Describing a package means running the package manager, which compiles
//! and evaluates `Package.swift`. The raw description is cached under a key
//! derived from the package directory name and the hash of `Package.swift`,
//! so an unchanged manifest is only ever described once.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{Manifest, ManifestError, MANIFEST_FILE_NAME};
use crate::sources::package_manager::PackageManager;
use crate::util::fs;
use crate::util::hash::content_key;

/// Loads package descriptions, going through the description cache.
pub struct ManifestLoader<'a> {
    cache_dir: PathBuf,
    package_manager: &'a dyn PackageManager,
}

impl<'a> ManifestLoader<'a> {
    pub fn new(cache_dir: impl Into<PathBuf>, package_manager: &'a dyn PackageManager) -> Self {
        ManifestLoader {
            cache_dir: cache_dir.into(),
            package_manager,
        }
    }

    /// Directory holding cached descriptions.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Load the manifest of the package in `package_dir`.
    ///
    /// A description that fails to decode is dropped from the cache and the
    /// whole load is retried once; a second failure is returned as is.
    pub fn load(&self, package_dir: &Path) -> Result<Manifest> {
        self.load_with_retry(package_dir, true)
    }

    fn load_with_retry(&self, package_dir: &Path, retry: bool) -> Result<Manifest> {
        let cache_path = self.cache_path(package_dir)?;

        let text = if cache_path.is_file() {
            tracing::debug!("using cached description {}", cache_path.display());
            fs::read_to_string(&cache_path)?
        } else {
            tracing::debug!("describing package at {}", package_dir.display());
            let text = self.package_manager.describe(package_dir)?;
            fs::write_atomic(&cache_path, text.as_bytes()).with_context(|| {
                format!(
                    "failed to cache package description for {}",
                    package_dir.display()
                )
            })?;
            text
        };

        match Manifest::from_json(&text) {
            Ok(manifest) => Ok(manifest),
            Err(err) if retry && err.is_decode_failure() => {
                tracing::warn!(
                    "discarding package description {}: {}",
                    cache_path.display(),
                    err
                );
                fs::remove_file_if_exists(&cache_path)?;
                self.load_with_retry(package_dir, false)
            }
            Err(err) => Err(anyhow::Error::new(err).context(format!(
                "failed to load package description for {}",
                package_dir.display()
            ))),
        }
    }

    /// Cache file for the package in `package_dir`:
    /// `<dir name>-<sha256 of Package.swift>.json`.
    pub fn cache_path(&self, package_dir: &Path) -> Result<PathBuf> {
        let contents = std::fs::read(package_dir.join(MANIFEST_FILE_NAME)).map_err(|source| {
            ManifestError::Unreadable {
                dir: package_dir.to_path_buf(),
                source,
            }
        })?;

        let dir = package_dir
            .canonicalize()
            .unwrap_or_else(|_| package_dir.to_path_buf());
        let key = format!("{}.json", content_key(&fs::file_name_str(&dir), &contents));
        Ok(self.cache_dir.join(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, FakePackageManager};
    use tempfile::TempDir;

    fn package(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("Networking");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE_NAME), fixtures::PACKAGE_SWIFT).unwrap();
        dir
    }

    #[test]
    fn test_cache_round_trip_describes_once() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);
        let pm = FakePackageManager::new(fixtures::DUMP_PACKAGE_JSON);
        let loader = ManifestLoader::new(tmp.path().join("cache"), &pm);

        let first = loader.load(&dir).unwrap();
        let second = loader.load(&dir).unwrap();

        assert_eq!(pm.describe_calls(), 1);
        assert_eq!(first.name(), second.name());
        assert_eq!(first.targets().len(), second.targets().len());

        let cached = loader.cache_path(&dir).unwrap();
        assert!(fs::file_name_str(&cached).starts_with("Networking-"));
        assert_eq!(
            std::fs::read_to_string(cached).unwrap(),
            fixtures::DUMP_PACKAGE_JSON
        );
    }

    #[test]
    fn test_changed_manifest_changes_key() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);
        let pm = FakePackageManager::new(fixtures::DUMP_PACKAGE_JSON);
        let loader = ManifestLoader::new(tmp.path().join("cache"), &pm);

        let before = loader.cache_path(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE_NAME), "// changed\n").unwrap();
        let after = loader.cache_path(&dir).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_corrupt_cache_entry_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);
        let pm = FakePackageManager::new(fixtures::DUMP_PACKAGE_JSON);
        let loader = ManifestLoader::new(tmp.path().join("cache"), &pm);

        let cached = loader.cache_path(&dir).unwrap();
        fs::write_string(&cached, "{ not json").unwrap();

        let manifest = loader.load(&dir).unwrap();
        assert_eq!(manifest.name(), "Networking");
        assert_eq!(pm.describe_calls(), 1);
        assert_eq!(
            std::fs::read_to_string(cached).unwrap(),
            fixtures::DUMP_PACKAGE_JSON
        );
    }

    #[test]
    fn test_second_decode_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);
        let pm = FakePackageManager::new(r#"{"name": "Broken", "targets": [{"name": "A"}]}"#);
        let loader = ManifestLoader::new(tmp.path().join("cache"), &pm);

        let err = loader.load(&dir).unwrap_err();
        assert_eq!(pm.describe_calls(), 2);
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Decode(_))
        ));
    }

    #[test]
    fn test_missing_manifest_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        let pm = FakePackageManager::new(fixtures::DUMP_PACKAGE_JSON);
        let loader = ManifestLoader::new(tmp.path().join("cache"), &pm);

        let err = loader.load(tmp.path()).unwrap_err();
        assert_eq!(pm.describe_calls(), 0);
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Unreadable { .. })
        ));
    }
}
