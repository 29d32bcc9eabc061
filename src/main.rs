// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::InstallOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Some(Commands::Install {
            formula,
            prefix,
            source_cache,
            cmake,
            jobs,
            keep_builddir,
            no_deps,
            no_test,
            show_log,
        }) => commands::cmd_install(InstallOptions {
            formula: &formula,
            prefix: &prefix,
            source_cache: source_cache.as_deref(),
            cmake: &cmake,
            jobs,
            keep_builddir,
            no_deps,
            no_test,
            show_log,
        }),

        Some(Commands::Fetch {
            formula,
            source_cache,
        }) => commands::cmd_fetch(&formula, source_cache.as_deref()),

        Some(Commands::Check { formula }) => commands::cmd_check(&formula),

        Some(Commands::Test { formula, prefix }) => commands::cmd_test(&formula, &prefix),

        Some(Commands::Show { formula }) => commands::cmd_show(&formula),

        None => {
            println!("sddc-formula {}", env!("CARGO_PKG_VERSION"));
            println!("Run 'sddc-formula --help' for usage information");
            Ok(())
        }
    }
}
