// src/commands/mod.rs
//! Command handlers for the sddc-formula CLI

mod check;
mod fetch;
mod install;
mod show;

pub use check::cmd_check;
pub use fetch::cmd_fetch;
pub use install::{cmd_install, InstallOptions};
pub use show::cmd_show;
pub use test::cmd_test;

use anyhow::{bail, Context, Result};
use sddc_formula::formula::builtin_names;
use sddc_formula::{builtin_formula, parse_formula_file, Formula};
use std::path::Path;

/// Load a formula from a file path or a builtin name
pub(crate) fn load_formula(arg: &str) -> Result<Formula> {
    let path = Path::new(arg);
    if path.is_file() {
        return parse_formula_file(path)
            .with_context(|| format!("Failed to parse formula: {}", path.display()));
    }

    match builtin_formula(arg) {
        Some(formula) => formula.with_context(|| format!("Builtin formula {} is invalid", arg)),
        None => bail!(
            "No formula file at {} and no builtin formula named '{}' (builtins: {})",
            arg,
            arg,
            builtin_names().collect::<Vec<_>>().join(", ")
        ),
    }
}
