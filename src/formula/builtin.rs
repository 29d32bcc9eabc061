// src/formula/builtin.rs

//! Formulas shipped with the installer

use crate::error::Result;
use crate::formula::format::Formula;
use crate::formula::parser::parse_formula;

/// The SDDC libraries and SoapySDR support module
pub const SDDC_FORMULA: &str = include_str!("../../formulas/sddc.toml");

const BUILTINS: &[(&str, &str)] = &[("sddc", SDDC_FORMULA)];

/// Names of all builtin formulas
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Look up and parse a builtin formula by name
pub fn builtin_formula(name: &str) -> Option<Result<Formula>> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, content)| parse_formula(content))
}
