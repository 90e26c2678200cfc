// this_file: crates/swraster-cli/src/main.rs

//! swraster CLI - draw scenes with the software rasterizer

use anyhow::Result;
use clap::Parser;

use swraster_cli::cli::{Cli, Commands};
use swraster_cli::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match &cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Demo(args) => commands::demo::run(args),
        Commands::Info => commands::info::run(),
    }
}

/// Initialize logging based on verbosity flag.
fn init_logger(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }
}
