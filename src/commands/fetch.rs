// src/commands/fetch.rs

//! Fetch command - download and verify sources only

use anyhow::{Context, Result};
use sddc_formula::{Installer, InstallerConfig};
use std::io::IsTerminal;
use std::path::PathBuf;

use super::load_formula;

/// Fetch and verify the source archive of a formula
pub fn cmd_fetch(formula: &str, source_cache: Option<&str>) -> Result<()> {
    let formula = load_formula(formula)?;

    let mut config = InstallerConfig {
        show_progress: std::io::stderr().is_terminal(),
        ..Default::default()
    };
    if let Some(cache) = source_cache {
        config.source_cache = PathBuf::from(cache);
    }

    let installer = Installer::new(config);
    let path = installer
        .fetch(&formula)
        .with_context(|| format!("Failed to fetch sources for {}", formula.package.name))?;

    println!("[COMPLETE] Fetched and verified: {}", path.display());
    Ok(())
}
