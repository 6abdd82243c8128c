//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// xcfuse - turns Swift packages into multi-platform XCFramework bundles
#[derive(Parser)]
#[command(name = "xcfuse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build XCFramework bundles for a package's products
    Build(BuildArgs),

    /// List the units a build would produce
    Buildables(BuildablesArgs),

    /// Show the header closure of an umbrella header
    Headers(HeadersArgs),

    /// Manage the package description cache
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Package directory (defaults to the enclosing package)
    #[arg(long)]
    pub package_path: Option<PathBuf>,

    /// Products to build (defaults to all)
    #[arg(long)]
    pub product: Vec<String>,

    /// Platforms to archive for (e.g. ios, ios-simulator, macos)
    #[arg(long)]
    pub platform: Vec<String>,

    /// Rebuild bundles that already exist
    #[arg(long)]
    pub force: bool,

    /// Output directory for bundles and artifacts.json
    #[arg(short, long, env = "XCFUSE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Build every resolved dependency instead of the package itself
    #[arg(long, conflicts_with = "product")]
    pub dependencies: bool,

    /// Number of parallel archive jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Version to record for the package
    #[arg(long = "version", value_name = "VERSION")]
    pub package_version: Option<String>,

    /// Leave debug symbols out of the bundles
    #[arg(long)]
    pub no_debug_symbols: bool,
}

#[derive(Args)]
pub struct BuildablesArgs {
    /// Package directory (defaults to the enclosing package)
    #[arg(long, conflicts_with = "from_json")]
    pub package_path: Option<PathBuf>,

    /// Read a package description from a file instead of asking the
    /// package manager
    #[arg(long, value_name = "FILE")]
    pub from_json: Option<PathBuf>,

    /// Print JSON instead of one unit per line
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HeadersArgs {
    /// Umbrella header, or a directory of headers
    pub umbrella: PathBuf,

    /// Framework name used in `<Name/Header.h>` imports
    #[arg(long)]
    pub framework: String,

    /// Directory imports are looked up in (defaults to the umbrella's directory)
    #[arg(long)]
    pub header_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print the cache directory
    Dir,

    /// Remove all cached package descriptions
    Clean,
}
