//! `xcfuse build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use xcfuse::builder::{BuildContext, Platform, XcodebuildArchiver, XcodebuildCombiner};
use xcfuse::ops::xcfuse_build::{build, BuildOptions, Collaborators};
use xcfuse::sources::SwiftPackageManager;
use xcfuse::util::config::load_config;
use xcfuse::util::GlobalContext;

pub fn execute(args: BuildArgs, verbose: bool) -> Result<()> {
    let mut gctx = GlobalContext::new()?;
    gctx.set_verbose(verbose);

    let start = args.package_path.clone().unwrap_or_else(|| gctx.cwd().to_path_buf());
    let package_dir = gctx.find_package_root(&start)?;

    // Load configuration (global + project)
    let config = load_config(
        &gctx.config_path(),
        &GlobalContext::project_config_path(&package_dir),
    );

    // Output: CLI > config > <package>/.xcfuse/xcframeworks
    let output_dir = args
        .output
        .clone()
        .or_else(|| config.output.dir.clone())
        .unwrap_or_else(|| GlobalContext::project_dir(&package_dir).join("xcframeworks"));

    let platforms = args
        .platform
        .iter()
        .map(|p| p.parse::<Platform>().map_err(|e| anyhow::anyhow!("{}", e)))
        .collect::<Result<Vec<_>>>()?;

    let mut ctx = BuildContext::from_config(&config, output_dir)?
        .with_platforms(platforms)
        .with_jobs(args.jobs);
    if args.no_debug_symbols {
        ctx.debug_symbols = false;
    }

    let opts = BuildOptions {
        products: args.product,
        skip_existing: !args.force && config.skip_existing(),
        version: args.package_version,
        dependencies: args.dependencies,
        verbose: gctx.is_verbose(),
    };

    let package_manager = SwiftPackageManager::new();
    let archiver = XcodebuildArchiver::new();
    let combiner = XcodebuildCombiner::new();
    let tools = Collaborators {
        package_manager: &package_manager,
        archiver: &archiver,
        combiner: &combiner,
    };

    let artifacts = build(&ctx, &gctx.manifest_cache_dir(), &package_dir, &opts, tools)?;

    for artifact in &artifacts {
        eprintln!(
            "    Finished `{}` {} -> {}",
            artifact.name,
            artifact.version,
            artifact.path.display()
        );
    }

    Ok(())
}
