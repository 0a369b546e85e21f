//! contentmap - content identity <-> URL mapping.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use contentmap::config::MapConfig;
use contentmap::{debug, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config = MapConfig::discover(&cwd, &cli.config)?;
    debug!("config"; "loaded {}", config.config_path.display());
    let compiled = config.compile()?;

    match &cli.command {
        Commands::Urls { args } => cli::urls::run_urls(args, &compiled),
        Commands::Resolve { args } => cli::resolve::run_resolve(args, &compiled),
        Commands::Check { args } => cli::check::run_check(args, &compiled),
    }
}
