//! `xcfuse cache` command
//!
//! Manage the package description cache.

use anyhow::Result;

use crate::cli::{CacheArgs, CacheCommands};
use xcfuse::ops::cache::{clean_manifest_cache, manifest_cache_entries};
use xcfuse::util::GlobalContext;

pub fn execute(args: CacheArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let dir = gctx.manifest_cache_dir();

    match args.command {
        CacheCommands::Dir => {
            println!("{}", dir.display());
            eprintln!("{} cached description(s)", manifest_cache_entries(&dir)?);
        }
        CacheCommands::Clean => {
            let removed = clean_manifest_cache(&dir)?;
            eprintln!("    Removed {} cached description(s)", removed);
        }
    }

    Ok(())
}
