// src/cli.rs
//! CLI definitions for the SDDC formula installer
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sddc-formula")]
#[command(author, version)]
#[command(about = "Build and install the SDDC SoapySDR module from a formula", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, verify, build and install a formula into a prefix
    Install {
        /// Path to a formula file, or the name of a builtin formula
        #[arg(default_value = "sddc")]
        formula: String,

        /// Installation prefix
        #[arg(short, long)]
        prefix: String,

        /// Directory for verified source archives
        #[arg(long)]
        source_cache: Option<String>,

        /// CMake executable
        #[arg(long, default_value = "cmake")]
        cmake: String,

        /// Number of parallel build jobs (default: auto)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep the build directory after completion
        #[arg(long)]
        keep_builddir: bool,

        /// Skip the dependency precondition check
        #[arg(long)]
        no_deps: bool,

        /// Skip the post-install smoke test
        #[arg(long)]
        no_test: bool,

        /// Print the full build log after installing
        #[arg(long)]
        show_log: bool,
    },

    /// Download and verify the source archive without building
    Fetch {
        /// Path to a formula file, or the name of a builtin formula
        #[arg(default_value = "sddc")]
        formula: String,

        /// Directory for verified source archives
        #[arg(long)]
        source_cache: Option<String>,
    },

    /// Parse and validate a formula
    Check {
        /// Path to a formula file, or the name of a builtin formula
        #[arg(default_value = "sddc")]
        formula: String,
    },

    /// Run the smoke test against an existing prefix
    Test {
        /// Path to a formula file, or the name of a builtin formula
        #[arg(default_value = "sddc")]
        formula: String,

        /// Installation prefix
        #[arg(short, long)]
        prefix: String,
    },

    /// Show formula metadata and dependencies
    Show {
        /// Path to a formula file, or the name of a builtin formula
        #[arg(default_value = "sddc")]
        formula: String,
    },
}
