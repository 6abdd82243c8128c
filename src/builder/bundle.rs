//! Bundle assembly - combining per-platform archives into one XCFramework.
//!
//! Assembly happens in a staging directory inside the output directory and
//! the finished bundle is moved into place with a single rename. A bundle at
//! the final path is therefore always complete, which is what makes
//! `skip_if_exists` safe.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use thiserror::Error;

use crate::builder::archive::ArchiveDescriptor;
use crate::builder::context::BuildContext;
use crate::builder::interface::rewrite_interfaces;
use crate::builder::modulemap::{copy_resource_bundle, ModuleMapSynthesizer};
use crate::util::fs;
use crate::util::process::{require_executable, ProcessBuilder};

/// Broken preconditions of an assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("no archives to assemble for `{product}`")]
    EmptyArchiveSet { product: String },

    #[error("output directory {} has not been prepared", dir.display())]
    NotPrepared { dir: PathBuf },
}

/// Combines per-platform frameworks into one bundle.
pub trait BundleCombiner: Send + Sync {
    /// Write a bundle at `output` from every archive's framework, attaching
    /// `debug_symbols_path` where set.
    fn combine(&self, archives: &[ArchiveDescriptor], output: &Path) -> Result<()>;
}

/// Combiner driving `xcodebuild -create-xcframework`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcodebuildCombiner;

impl XcodebuildCombiner {
    pub fn new() -> Self {
        XcodebuildCombiner
    }
}

impl BundleCombiner for XcodebuildCombiner {
    fn combine(&self, archives: &[ArchiveDescriptor], output: &Path) -> Result<()> {
        let mut cmd = ProcessBuilder::new(require_executable("xcodebuild")?).arg("-create-xcframework");
        for archive in archives {
            cmd = cmd.arg("-framework").arg(&archive.framework_path);
            if let Some(ref dsym) = archive.debug_symbols_path {
                cmd = cmd.arg("-debug-symbols").arg(dsym);
            }
        }
        cmd.arg("-output").arg(output).exec_and_check()?;
        Ok(())
    }
}

/// The product being assembled.
#[derive(Debug, Clone)]
pub struct AssemblyProduct {
    /// Product (and framework) name
    pub name: String,

    /// The product's module also names a type of the same name; its
    /// interfaces need the `X.X` rewrite
    pub reexport_ambiguous: bool,
}

impl AssemblyProduct {
    pub fn new(name: impl Into<String>) -> Self {
        AssemblyProduct {
            name: name.into(),
            reexport_ambiguous: false,
        }
    }

    pub fn reexport_ambiguous(mut self, ambiguous: bool) -> Self {
        self.reexport_ambiguous = ambiguous;
        self
    }
}

/// Assembles bundles into the context's output directory.
pub struct BundleAssembler<'a> {
    ctx: &'a BuildContext,
    combiner: &'a dyn BundleCombiner,
    synthesizer: ModuleMapSynthesizer<'a>,
}

impl<'a> BundleAssembler<'a> {
    pub fn new(
        ctx: &'a BuildContext,
        combiner: &'a dyn BundleCombiner,
        synthesizer: ModuleMapSynthesizer<'a>,
    ) -> Self {
        BundleAssembler {
            ctx,
            combiner,
            synthesizer,
        }
    }

    /// Assemble `product` from its archives and return the bundle path.
    ///
    /// With `skip_if_exists`, an existing bundle is returned untouched.
    pub fn assemble(
        &self,
        product: &AssemblyProduct,
        archives: &[ArchiveDescriptor],
        skip_if_exists: bool,
    ) -> Result<PathBuf> {
        if archives.is_empty() {
            return Err(AssembleError::EmptyArchiveSet {
                product: product.name.clone(),
            }
            .into());
        }
        if !self.ctx.is_prepared() {
            return Err(AssembleError::NotPrepared {
                dir: self.ctx.output_dir.clone(),
            }
            .into());
        }

        let output = self.ctx.bundle_path(&product.name);
        if skip_if_exists && output.exists() {
            tracing::info!("Reusing {}", output.display());
            return Ok(output);
        }
        fs::remove_dir_all_if_exists(&output)?;

        if product.reexport_ambiguous {
            for archive in archives {
                let changed = rewrite_interfaces(&archive.framework_path, &product.name)
                    .with_context(|| {
                        format!(
                            "failed to rewrite interfaces of `{}` for {}",
                            product.name, archive.platform_identifier
                        )
                    })?;
                tracing::debug!(
                    "rewrote {} interface(s) of `{}` for {}",
                    changed,
                    product.name,
                    archive.platform_identifier
                );
            }
        }

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.ctx.output_dir)
            .with_context(|| {
                format!(
                    "failed to create staging directory in {}",
                    self.ctx.output_dir.display()
                )
            })?;
        let staged = staging.path().join(fs::file_name_str(&output));

        tracing::info!(
            "Assembling {} from {} archive(s)",
            product.name,
            archives.len()
        );
        let inputs = self.combine_inputs(archives);
        self.combiner
            .combine(&inputs, &staged)
            .with_context(|| format!("failed to combine archives of `{}`", product.name))?;

        for archive in archives {
            self.finish_slice(product, archive, &staged)?;
        }

        std::fs::rename(&staged, &output).with_context(|| {
            format!(
                "failed to move {} to {}",
                staged.display(),
                output.display()
            )
        })?;
        tracing::info!("Assembled {}", output.display());
        Ok(output)
    }

    /// Archives as handed to the combiner: debug symbols only when enabled
    /// and present on disk.
    fn combine_inputs(&self, archives: &[ArchiveDescriptor]) -> Vec<ArchiveDescriptor> {
        archives
            .iter()
            .map(|archive| {
                let debug_symbols_path = match archive.debug_symbols_path {
                    Some(ref dsym) if self.ctx.debug_symbols && dsym.exists() => Some(dsym.clone()),
                    Some(ref dsym) if self.ctx.debug_symbols => {
                        tracing::info!("no debug symbols at {}", dsym.display());
                        None
                    }
                    _ => None,
                };
                ArchiveDescriptor {
                    debug_symbols_path,
                    ..archive.clone()
                }
            })
            .collect()
    }

    fn finish_slice(
        &self,
        product: &AssemblyProduct,
        archive: &ArchiveDescriptor,
        staged: &Path,
    ) -> Result<()> {
        let framework = staged
            .join(&archive.platform_identifier)
            .join(format!("{}.framework", product.name));
        if !framework.is_dir() {
            bail!(
                "combined bundle of `{}` has no `{}` slice",
                product.name,
                archive.platform_identifier
            );
        }

        self.synthesizer
            .synthesize(&product.name, &framework)
            .with_context(|| {
                format!(
                    "failed to write module map of `{}` for {}",
                    product.name, archive.platform_identifier
                )
            })?;
        copy_resource_bundle(&product.name, &archive.framework_path, &framework)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::archive::Platform;
    use crate::core::manifest::Manifest;
    use crate::test_support::{fake_archive, write_file, FakeCombiner};
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "name": "P",
        "products": [{"name": "P", "targets": ["P"]}],
        "targets": [{"name": "P", "type": "regular"}]
    }"#;

    struct Fixture {
        tmp: TempDir,
        ctx: BuildContext,
        manifest: Manifest,
        combiner: FakeCombiner,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let ctx = BuildContext::new(tmp.path().join("out"));
            ctx.prepare().unwrap();
            write_file(&tmp.path().join("pkg/Sources/P/include/P.h"), "// P\n");
            Fixture {
                ctx,
                tmp,
                manifest: Manifest::from_json(MANIFEST).unwrap(),
                combiner: FakeCombiner::new(),
            }
        }

        fn archives(&self, platforms: &[Platform]) -> Vec<ArchiveDescriptor> {
            platforms
                .iter()
                .map(|p| fake_archive(&self.ctx.archive_path("P", "P", *p), "P", *p))
                .collect()
        }

        fn assemble(&self, archives: &[ArchiveDescriptor], skip: bool) -> Result<PathBuf> {
            let pkg = self.tmp.path().join("pkg");
            let assembler = BundleAssembler::new(
                &self.ctx,
                &self.combiner,
                ModuleMapSynthesizer::new(&self.manifest, &pkg),
            );
            assembler.assemble(&AssemblyProduct::new("P"), archives, skip)
        }

        fn output_entries(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(&self.ctx.output_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[test]
    fn test_two_platforms_then_skip() {
        let fx = Fixture::new();
        let archives = fx.archives(&[Platform::Ios, Platform::IosSimulator]);

        let bundle = fx.assemble(&archives, true).unwrap();
        assert_eq!(bundle, fx.ctx.output_dir.join("P.xcframework"));

        let mut slices: Vec<String> = std::fs::read_dir(&bundle)
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        slices.sort();
        assert_eq!(slices, vec!["ios-arm64", "ios-arm64_x86_64-simulator"]);
        for slice in &slices {
            let fw = bundle.join(slice).join("P.framework");
            assert!(fw.join("Modules/module.modulemap").is_file());
            assert!(fw.join("Headers/P.h").is_file());
        }
        assert_eq!(fx.combiner.calls(), 1);

        let marker = bundle.join("marker");
        std::fs::write(&marker, "kept").unwrap();
        let again = fx.assemble(&archives, true).unwrap();
        assert_eq!(again, bundle);
        assert_eq!(fx.combiner.calls(), 1);
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "kept");
    }

    #[test]
    fn test_rebuild_replaces_stale_output() {
        let fx = Fixture::new();
        let archives = fx.archives(&[Platform::Macos]);
        write_file(&fx.ctx.bundle_path("P").join("stale"), "old");

        let bundle = fx.assemble(&archives, false).unwrap();
        assert!(!bundle.join("stale").exists());
        assert!(bundle.join("macos-arm64_x86_64/P.framework").is_dir());
        assert_eq!(fx.output_entries(), vec!["P.xcframework", "archives"]);
    }

    #[test]
    fn test_debug_symbols_only_when_present() {
        let fx = Fixture::new();
        let mut archives = fx.archives(&[Platform::Ios, Platform::Tvos]);
        let missing = archives[1].debug_symbols_path.clone().unwrap();
        std::fs::remove_dir_all(&missing).unwrap();

        fx.assemble(&archives, false).unwrap();
        let inputs = fx.combiner.last_inputs();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].debug_symbols_path.is_some());
        assert!(inputs[1].debug_symbols_path.is_none());
    }

    #[test]
    fn test_debug_symbols_disabled() {
        let mut fx = Fixture::new();
        fx.ctx.debug_symbols = false;
        let archives = fx.archives(&[Platform::Ios]);

        fx.assemble(&archives, false).unwrap();
        assert!(fx.combiner.last_inputs()[0].debug_symbols_path.is_none());
    }

    #[test]
    fn test_empty_archive_set() {
        let fx = Fixture::new();
        let err = fx.assemble(&[], true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssembleError>(),
            Some(AssembleError::EmptyArchiveSet { product }) if product == "P"
        ));
        assert_eq!(fx.combiner.calls(), 0);
    }

    #[test]
    fn test_not_prepared() {
        let fx = Fixture::new();
        let archives = fx.archives(&[Platform::Ios]);
        let ctx = BuildContext::new(fx.tmp.path().join("elsewhere"));
        let pkg = fx.tmp.path().join("pkg");
        let assembler = BundleAssembler::new(
            &ctx,
            &fx.combiner,
            ModuleMapSynthesizer::new(&fx.manifest, &pkg),
        );

        let err = assembler
            .assemble(&AssemblyProduct::new("P"), &archives, false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssembleError>(),
            Some(AssembleError::NotPrepared { .. })
        ));
    }

    #[test]
    fn test_failed_combine_leaves_nothing_behind() {
        let fx = Fixture::new();
        let archives = fx.archives(&[Platform::Ios]);
        fx.combiner.fail_next();

        assert!(fx.assemble(&archives, true).is_err());
        assert!(!fx.ctx.bundle_path("P").exists());
        assert_eq!(fx.output_entries(), vec!["archives"]);

        fx.assemble(&archives, true).unwrap();
        assert!(fx.ctx.bundle_path("P").is_dir());
    }

    #[test]
    fn test_ambiguous_product_interfaces_are_rewritten() {
        let fx = Fixture::new();
        let archives = fx.archives(&[Platform::Ios]);
        let interface = archives[0]
            .framework_path
            .join("Modules/P.swiftmodule/arm64-apple-ios.swiftinterface");
        std::fs::write(&interface, "public func make() -> P.P\n").unwrap();

        let pkg = fx.tmp.path().join("pkg");
        let assembler = BundleAssembler::new(
            &fx.ctx,
            &fx.combiner,
            ModuleMapSynthesizer::new(&fx.manifest, &pkg),
        );
        let bundle = assembler
            .assemble(&AssemblyProduct::new("P").reexport_ambiguous(true), &archives, false)
            .unwrap();

        let combined = bundle.join("ios-arm64/P.framework/Modules/P.swiftmodule/arm64-apple-ios.swiftinterface");
        assert_eq!(
            std::fs::read_to_string(combined).unwrap(),
            "public func make() -> P\n"
        );
    }
}
