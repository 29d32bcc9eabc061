// src/commands/install.rs

//! Install command - build and install a formula into a prefix

use anyhow::{Context, Result};
use sddc_formula::{Installer, InstallerConfig, RelocationOutcome, SmokeTestOutcome};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

use super::load_formula;

/// Options for the install command
pub struct InstallOptions<'a> {
    pub formula: &'a str,
    pub prefix: &'a str,
    pub source_cache: Option<&'a str>,
    pub cmake: &'a str,
    pub jobs: Option<u32>,
    pub keep_builddir: bool,
    pub no_deps: bool,
    pub no_test: bool,
    pub show_log: bool,
}

/// Install a formula
///
/// Fatal phases (dependencies, fetch, verify, configure, build) return an
/// error and a non-zero exit. Relocation and smoke test problems are
/// printed as warnings and leave the exit code at zero.
pub fn cmd_install(opts: InstallOptions<'_>) -> Result<()> {
    let formula = load_formula(opts.formula)?;
    println!("Formula: {}", formula.display_name());

    let mut config = InstallerConfig {
        cmake: PathBuf::from(opts.cmake),
        keep_builddir: opts.keep_builddir,
        check_dependencies: !opts.no_deps,
        run_smoke_test: !opts.no_test,
        show_progress: std::io::stderr().is_terminal(),
        ..Default::default()
    };
    if let Some(cache) = opts.source_cache {
        config.source_cache = PathBuf::from(cache);
    }
    if let Some(j) = opts.jobs {
        config.jobs = j;
    }

    if opts.no_deps {
        println!("[WARNING] Skipping dependency checks");
    }
    println!("Installing with {} parallel jobs...", config.jobs);

    let installer = Installer::new(config);
    if installer.source_cached(&formula) {
        println!("  - Source already cached");
    }

    let prefix = Path::new(opts.prefix);
    let report = installer
        .install(&formula, prefix)
        .with_context(|| format!("Failed to install {}", formula.package.name))?;

    println!("\n[COMPLETE] Installed {} into {}", report.package, report.prefix.display());

    match &report.relocation {
        RelocationOutcome::Skipped { plugin_dir } => {
            println!("  - No plugin modules at {}", plugin_dir.display());
        }
        RelocationOutcome::Copied { dest, files } => {
            println!("  - Relocated {} plugin file(s) to {}", files.len(), dest.display());
        }
    }

    match &report.smoke_test {
        SmokeTestOutcome::Passed { checks } => {
            println!("  - Smoke test passed ({} check(s))", checks.len());
        }
        SmokeTestOutcome::Failed { .. } => println!("  - Smoke test inconclusive"),
        SmokeTestOutcome::Skipped => println!("  - Smoke test skipped"),
    }

    if let Some(dir) = &report.kept_builddir {
        println!("  - Build directory kept at {}", dir.display());
    }

    for warning in &report.warnings {
        println!("[WARNING] {}", warning);
    }

    if opts.show_log {
        println!("\n{}", report.log);
    }

    info!(
        "Successfully installed {} to {}",
        report.package,
        report.prefix.display()
    );

    Ok(())
}
