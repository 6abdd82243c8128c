//! `xcfuse buildables` command

use anyhow::{Context, Result};

use crate::cli::BuildablesArgs;
use xcfuse::core::buildable::buildables;
use xcfuse::core::Manifest;
use xcfuse::sources::{ManifestLoader, SwiftPackageManager};
use xcfuse::util::fs::read_to_string;
use xcfuse::util::GlobalContext;

pub fn execute(args: BuildablesArgs) -> Result<()> {
    let manifest = match args.from_json {
        Some(ref path) => {
            let text = read_to_string(path)?;
            Manifest::from_json(&text)
                .with_context(|| format!("failed to decode package description: {}", path.display()))?
        }
        None => {
            let gctx = GlobalContext::new()?;
            let start = args.package_path.clone().unwrap_or_else(|| gctx.cwd().to_path_buf());
            let package_dir = gctx.find_package_root(&start)?;
            let package_manager = SwiftPackageManager::new();
            ManifestLoader::new(gctx.manifest_cache_dir(), &package_manager).load(&package_dir)?
        }
    };

    let units = buildables(&manifest);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    if units.is_empty() {
        eprintln!("`{}` has nothing to build", manifest.name());
    }
    for unit in &units {
        println!("{}", unit);
    }

    Ok(())
}
