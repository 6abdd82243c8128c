//! xcfuse CLI - turns Swift packages into XCFramework bundles

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("xcfuse=debug")
    } else {
        EnvFilter::new("xcfuse=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.verbose),
        Commands::Buildables(args) => commands::buildables::execute(args),
        Commands::Headers(args) => commands::headers::execute(args),
        Commands::Cache(args) => commands::cache::execute(args),
    }
}
