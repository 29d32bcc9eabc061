// src/commands/show.rs

//! Show command - print formula metadata

use anyhow::Result;
use sddc_formula::DependencyKind;

use super::load_formula;

/// Print a formula's metadata, dependencies and install layout
pub fn cmd_show(formula: &str) -> Result<()> {
    let formula = load_formula(formula)?;
    let package = &formula.package;

    println!("{}", formula.display_name());
    if let Some(desc) = &package.desc {
        println!("  {}", desc);
    }
    if let Some(homepage) = &package.homepage {
        println!("  Homepage: {}", homepage);
    }
    if let Some(license) = &package.license {
        println!("  License: {}", license);
    }
    println!("  Source: {}", formula.source_url());
    match formula.checksum() {
        Ok(hash) => println!("  Checksum: {}", hash.to_prefixed_string()),
        Err(_) => println!("  Checksum: {} (placeholder)", package.sha256),
    }

    for kind in [DependencyKind::Build, DependencyKind::Run] {
        let names: Vec<&str> = formula.dependencies(kind).map(|d| d.name.as_str()).collect();
        if !names.is_empty() {
            println!("  Depends on ({}): {}", kind, names.join(", "));
        }
    }

    println!("  Build type: {}", formula.install.build_type);
    println!(
        "  Plugins: {} -> {}",
        formula.install.plugin_dir, formula.install.lib_dir
    );
    Ok(())
}
