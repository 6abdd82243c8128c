//! Implementation of `xcfuse build`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::archive::Archiver;
use crate::builder::bundle::{AssemblyProduct, BundleAssembler, BundleCombiner};
use crate::builder::context::{bundle_path, BuildContext};
use crate::builder::executor::BuildExecutor;
use crate::builder::modulemap::ModuleMapSynthesizer;
use crate::core::artifact::{self, Artifact};
use crate::core::buildable::{product_buildables, BinaryTarget, Buildable};
use crate::core::manifest::{Manifest, Product};
use crate::core::target::BinaryLocation;
use crate::sources::checkout::{repository_version, Checkout};
use crate::sources::manifest_loader::ManifestLoader;
use crate::sources::package_manager::PackageManager;
use crate::sources::resolved::ResolvedState;
use crate::util::fs;

/// Version recorded for packages that carry no version information.
pub const UNVERSIONED: &str = "unversioned";

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Products to build (empty = all)
    pub products: Vec<String>,

    /// Reuse bundles that already exist
    pub skip_existing: bool,

    /// Version to record for the root package
    pub version: Option<String>,

    /// Build every resolved dependency instead of the root package
    pub dependencies: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            products: Vec::new(),
            skip_existing: true,
            version: None,
            dependencies: false,
            verbose: false,
        }
    }
}

/// The external tools a build drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub package_manager: &'a dyn PackageManager,
    pub archiver: &'a dyn Archiver,
    pub combiner: &'a dyn BundleCombiner,
}

/// Build bundles for the package in `package_dir`, or for each of its
/// resolved dependencies, and write `artifacts.json`.
pub fn build(
    ctx: &BuildContext,
    manifest_cache_dir: &Path,
    package_dir: &Path,
    opts: &BuildOptions,
    tools: Collaborators<'_>,
) -> Result<Vec<Artifact>> {
    ctx.prepare()?;
    let loader = ManifestLoader::new(manifest_cache_dir, tools.package_manager);

    let artifacts = if opts.dependencies {
        build_dependencies(ctx, &loader, package_dir, opts, tools)?
    } else {
        let version = match opts.version {
            Some(ref version) => version.clone(),
            None => package_version(package_dir)?,
        };
        build_package(ctx, &loader, package_dir, &version, &opts.products, opts, tools)?
    };

    let index = artifact::write_index(&ctx.output_dir, &artifacts)?;
    tracing::info!(
        "Finished {} artifact(s), recorded in {}",
        artifacts.len(),
        index.display()
    );
    Ok(artifacts)
}

fn build_dependencies(
    ctx: &BuildContext,
    loader: &ManifestLoader<'_>,
    package_dir: &Path,
    opts: &BuildOptions,
    tools: Collaborators<'_>,
) -> Result<Vec<Artifact>> {
    tools.package_manager.resolve(package_dir)?;
    let state = ResolvedState::load_for_package(package_dir)?;

    let mut artifacts = Vec::new();
    for pin in state.source_control_pins() {
        let checkout = Checkout::from_pin(pin, package_dir)?;
        let version = checkout
            .version()
            .with_context(|| format!("failed to determine version of `{}`", checkout.identity))?;
        tracing::info!("Packaging {} {}", checkout.identity, version);

        let built = build_package(ctx, loader, &checkout.path, &version, &[], opts, tools)
            .with_context(|| format!("failed to package dependency `{}`", checkout.identity))?;
        artifacts.extend(built);
    }
    Ok(artifacts)
}

/// Build the selected products of one package.
pub fn build_package(
    ctx: &BuildContext,
    loader: &ManifestLoader<'_>,
    package_dir: &Path,
    version: &str,
    product_filter: &[String],
    opts: &BuildOptions,
    tools: Collaborators<'_>,
) -> Result<Vec<Artifact>> {
    let manifest = loader.load(package_dir)?;
    let products = select_products(&manifest, product_filter)?;
    let units = collect_buildables(&manifest, &products);
    let ambiguities = manifest.reexport_ambiguities();

    let executor = BuildExecutor::new(ctx, tools.archiver).verbose(opts.verbose);
    let assembler = BundleAssembler::new(
        ctx,
        tools.combiner,
        ModuleMapSynthesizer::new(&manifest, package_dir),
    );
    let pb = executor.progress(units.len());

    let mut artifacts = Vec::new();
    for unit in &units {
        if let Some(ref pb) = pb {
            pb.set_message(unit.name());
        }

        let path = match unit {
            Buildable::Target { name } => {
                let existing = ctx.bundle_path(name);
                if opts.skip_existing && existing.exists() {
                    tracing::info!("Reusing {}", existing.display());
                    Some(existing)
                } else {
                    let archives = executor.archive_all(package_dir, manifest.name(), name)?;
                    let product =
                        AssemblyProduct::new(name.as_str()).reexport_ambiguous(ambiguities.contains(name));
                    Some(assembler.assemble(&product, &archives, opts.skip_existing)?)
                }
            }
            Buildable::BinaryTarget(binary) => {
                copy_binary_target(ctx, package_dir, binary, opts.skip_existing)?
            }
        };

        if let Some(path) = path {
            artifacts.push(Artifact::new(unit.name(), version, path));
        }
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    Ok(artifacts)
}

/// Select products by name; all products when the filter is empty.
///
/// Unknown names are an error rather than a silent no-op.
fn select_products<'m>(manifest: &'m Manifest, filter: &[String]) -> Result<Vec<&'m Product>> {
    if filter.is_empty() {
        return Ok(manifest.products().iter().collect());
    }

    let mut selected = Vec::with_capacity(filter.len());
    for name in filter {
        match manifest.product(name) {
            Some(product) => selected.push(product),
            None => {
                let available: Vec<&str> =
                    manifest.products().iter().map(|p| p.name.as_str()).collect();
                bail!(
                    "unknown product `{}` in package `{}`\n\
                     available products: {}\n\
                     hint: use `xcfuse buildables` to see what would be built",
                    name,
                    manifest.name(),
                    if available.is_empty() {
                        "(none)".to_string()
                    } else {
                        available.join(", ")
                    }
                );
            }
        }
    }
    Ok(selected)
}

/// Buildables of the selected products, deduplicated across products.
fn collect_buildables(manifest: &Manifest, products: &[&Product]) -> Vec<Buildable> {
    let mut seen = HashSet::new();
    products
        .iter()
        .flat_map(|product| product_buildables(manifest, product))
        .filter(|unit| seen.insert(unit.identity()))
        .collect()
}

/// Copy a local `.xcframework` binary target into the output directory.
///
/// Remote binaries are fetched by the package manager and produce no
/// artifact here.
fn copy_binary_target(
    ctx: &BuildContext,
    package_dir: &Path,
    binary: &BinaryTarget,
    skip_existing: bool,
) -> Result<Option<PathBuf>> {
    let source = match binary.location {
        BinaryLocation::Local(ref path) => package_dir.join(path),
        BinaryLocation::Remote { ref url, .. } => {
            tracing::info!(
                "binary target `{}` is fetched from {}; nothing to copy",
                binary.target,
                url
            );
            return Ok(None);
        }
    };

    if !source.is_dir() || !source.extension().is_some_and(|ext| ext == "xcframework") {
        tracing::info!(
            "binary target `{}` at {} is not an xcframework directory; skipping",
            binary.target,
            source.display()
        );
        return Ok(None);
    }

    let dest = bundle_path(&ctx.output_dir, &binary.name());
    if skip_existing && dest.exists() {
        tracing::info!("Reusing {}", dest.display());
        return Ok(Some(dest));
    }

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(&ctx.output_dir)
        .with_context(|| {
            format!(
                "failed to create staging directory in {}",
                ctx.output_dir.display()
            )
        })?;
    let staged = staging.path().join(fs::file_name_str(&dest));
    fs::copy_dir_all(&source, &staged)?;
    fs::remove_dir_all_if_exists(&dest)?;
    std::fs::rename(&staged, &dest)
        .with_context(|| format!("failed to move {} to {}", staged.display(), dest.display()))?;

    tracing::info!("Copied binary target {} to {}", binary.target, dest.display());
    Ok(Some(dest))
}

/// Version of the package in `package_dir`: its exact git tag or short
/// revision, or [`UNVERSIONED`] outside a repository.
pub fn package_version(package_dir: &Path) -> Result<String> {
    if package_dir.join(".git").exists() {
        return repository_version(package_dir);
    }
    tracing::info!(
        "{} is not a git repository; recording version `{}`",
        package_dir.display(),
        UNVERSIONED
    );
    Ok(UNVERSIONED.to_string())
}
