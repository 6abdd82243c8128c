//! Module map synthesis for bundled frameworks.
//!
//! Frameworks archived from a package lose the package's C module layout.
//! This module rebuilds a framework's `Headers/` directory and writes a
//! `Modules/module.modulemap` describing it, using one of two strategies:
//!
//! - **Umbrella header**: the target ships a module map naming an umbrella
//!   header. The umbrella and its header closure are copied and the module
//!   exports everything the umbrella reaches.
//! - **Flat**: everything else. Public headers of the target and its direct
//!   dependencies are copied and listed one by one.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::builder::headers::{headers_in_dir, is_header, resolve_headers, rewrite_quoted_imports};
use crate::core::manifest::Manifest;
use crate::core::target::Target;
use crate::util::fs;

/// Module map file name, both in packages and in frameworks.
pub const MODULE_MAP_FILE_NAME: &str = "module.modulemap";

static UMBRELLA_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"umbrella\s+header\s+"([^"]+)""#).expect("umbrella header pattern is valid")
});

static UMBRELLA_DIRECTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"umbrella\s+"([^"]+)""#).expect("umbrella directory pattern is valid")
});

/// What a target's own module map declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingModuleMap {
    /// `umbrella header "X.h"`
    UmbrellaHeader(String),
    /// `umbrella "dir"`
    UmbrellaDirectory(String),
    /// Explicit header list, or anything else
    Other,
}

impl ExistingModuleMap {
    pub fn parse(text: &str) -> Self {
        if let Some(caps) = UMBRELLA_HEADER.captures(text) {
            return ExistingModuleMap::UmbrellaHeader(caps[1].to_string());
        }
        if let Some(caps) = UMBRELLA_DIRECTORY.captures(text) {
            return ExistingModuleMap::UmbrellaDirectory(caps[1].to_string());
        }
        ExistingModuleMap::Other
    }
}

/// How a module map was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    UmbrellaHeader,
    Flat,
}

/// A synthesized module map.
#[derive(Debug, Clone)]
pub struct ModuleMap {
    pub strategy: Strategy,

    /// Headers placed in `Headers/`, relative to it
    pub headers: Vec<PathBuf>,

    /// Module map text as written
    pub text: String,
}

/// Rebuilds the header and module surface of a product's frameworks.
pub struct ModuleMapSynthesizer<'a> {
    manifest: &'a Manifest,
    package_dir: &'a Path,
}

impl<'a> ModuleMapSynthesizer<'a> {
    pub fn new(manifest: &'a Manifest, package_dir: &'a Path) -> Self {
        ModuleMapSynthesizer {
            manifest,
            package_dir,
        }
    }

    /// Populate `framework_dir/Headers` for `product` and write its module map.
    pub fn synthesize(&self, product: &str, framework_dir: &Path) -> Result<ModuleMap> {
        let headers_dir = framework_dir.join("Headers");
        fs::ensure_dir(&headers_dir)?;

        let module_map = match self.manifest.target(product) {
            Some(target) => self.synthesize_for(target, product, &headers_dir)?,
            None => {
                tracing::info!(
                    "no target named `{}`; writing an export-only module map",
                    product
                );
                flat_module_map(product, Vec::new())
            }
        };

        let path = framework_dir.join("Modules").join(MODULE_MAP_FILE_NAME);
        fs::write_string(&path, &module_map.text)?;
        tracing::debug!(
            "wrote {:?} module map for `{}` with {} header(s)",
            module_map.strategy,
            product,
            module_map.headers.len()
        );
        Ok(module_map)
    }

    fn synthesize_for(&self, target: &Target, product: &str, headers_dir: &Path) -> Result<ModuleMap> {
        let header_dir = target.public_headers_dir(self.package_dir);
        let existing_path = header_dir.join(MODULE_MAP_FILE_NAME);

        let existing = if existing_path.is_file() {
            ExistingModuleMap::parse(&fs::read_to_string(&existing_path)?)
        } else {
            tracing::debug!("`{}` ships no module map", target.name);
            ExistingModuleMap::Other
        };

        match existing {
            ExistingModuleMap::UmbrellaHeader(umbrella) => {
                let umbrella = header_dir.join(umbrella);
                if umbrella.is_file() {
                    return self.umbrella_strategy(product, &umbrella, &header_dir, headers_dir);
                }
                tracing::info!(
                    "umbrella header {} is missing; listing headers instead",
                    umbrella.display()
                );
            }
            ExistingModuleMap::UmbrellaDirectory(dir) => {
                tracing::debug!("`{}` declares umbrella directory `{}`", target.name, dir);
            }
            ExistingModuleMap::Other => {}
        }

        self.flat_strategy(target, product, headers_dir)
    }

    fn umbrella_strategy(
        &self,
        product: &str,
        umbrella: &Path,
        header_dir: &Path,
        headers_dir: &Path,
    ) -> Result<ModuleMap> {
        let closure = resolve_headers(umbrella, product, header_dir)?;
        let mut copied = Vec::with_capacity(closure.len());

        for header in &closure {
            let relative = fs::relative_path(header_dir, header);
            if relative.components().any(|c| c == Component::ParentDir) {
                tracing::debug!("skipping {}: outside the header directory", header.display());
                continue;
            }
            if !header.is_file() {
                tracing::debug!("skipping {}: not found", header.display());
                continue;
            }

            let dest = headers_dir.join(&relative);
            if header == umbrella {
                let text = fs::read_to_string(header)?;
                fs::write_string(&dest, &rewrite_quoted_imports(&text, product))?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::ensure_dir(parent)?;
                }
                std::fs::copy(header, &dest).with_context(|| {
                    format!("failed to copy {} to {}", header.display(), dest.display())
                })?;
            }
            copied.push(relative);
        }

        let umbrella_name = fs::relative_path(header_dir, umbrella);
        let text = format!(
            "framework module {} {{\n    umbrella header \"{}\"\n\n    export *\n    module * {{ export * }}\n}}\n",
            product,
            umbrella_name.display()
        );

        Ok(ModuleMap {
            strategy: Strategy::UmbrellaHeader,
            headers: copied,
            text,
        })
    }

    fn flat_strategy(&self, target: &Target, product: &str, headers_dir: &Path) -> Result<ModuleMap> {
        let mut sources = vec![target.public_headers_dir(self.package_dir)];
        sources.extend(
            self.manifest
                .direct_dependencies(target)
                .into_iter()
                .filter(|dep| !dep.is_binary())
                .map(|dep| dep.public_headers_dir(self.package_dir)),
        );

        for dir in sources {
            if !dir.is_dir() {
                tracing::debug!("no public headers at {}", dir.display());
                continue;
            }
            copy_headers_flat(&dir, headers_dir)?;
        }

        let headers = headers_in_dir(headers_dir)?
            .into_iter()
            .map(|path| PathBuf::from(fs::file_name_str(&path)))
            .collect::<Vec<_>>();
        if headers.is_empty() {
            tracing::info!("`{}` has no public headers; writing an export-only module map", product);
        }

        Ok(flat_module_map(product, headers))
    }
}

/// Copy every header below `src` into `dest`, by file name, keeping any file
/// already present.
fn copy_headers_flat(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        if !entry.file_type().is_file() || !is_header(entry.path()) {
            continue;
        }
        let target = dest.join(entry.file_name());
        if !fs::copy_file_if_absent(entry.path(), &target)? {
            tracing::debug!("keeping existing {}", target.display());
        }
    }
    Ok(())
}

fn flat_module_map(product: &str, headers: Vec<PathBuf>) -> ModuleMap {
    let mut text = format!("framework module {} {{\n", product);
    for header in &headers {
        let _ = writeln!(text, "    header \"{}\"", header.display());
    }
    if !headers.is_empty() {
        text.push('\n');
    }
    text.push_str("    export *\n}\n");

    ModuleMap {
        strategy: Strategy::Flat,
        headers,
        text,
    }
}

/// Copy the `<Product>_<Product>.bundle` resource bundle that sits next to
/// the archived framework into the output framework.
///
/// Returns `false` when the archive has no such bundle.
pub fn copy_resource_bundle(
    product: &str,
    archived_framework: &Path,
    output_framework: &Path,
) -> Result<bool> {
    let name = format!("{0}_{0}.bundle", product);
    let Some(source) = archived_framework.parent().map(|dir| dir.join(&name)) else {
        return Ok(false);
    };

    if !source.is_dir() {
        tracing::info!("no resource bundle for `{}`", product);
        return Ok(false);
    }

    let dest = output_framework.join(&name);
    fs::remove_dir_all_if_exists(&dest)?;
    fs::copy_dir_all(&source, &dest)?;
    tracing::debug!("copied {} into {}", name, output_framework.display());
    Ok(true)
}
