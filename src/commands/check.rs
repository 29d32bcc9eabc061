// src/commands/check.rs

//! Check command - parse and validate a formula

use anyhow::{Context, Result};
use sddc_formula::validate_formula;

use super::load_formula;

/// Validate a formula, printing any warnings
pub fn cmd_check(formula: &str) -> Result<()> {
    let parsed = load_formula(formula)?;
    println!("Formula: {}", parsed.display_name());

    let warnings = validate_formula(&parsed).with_context(|| "Formula validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }
    Ok(())
}
