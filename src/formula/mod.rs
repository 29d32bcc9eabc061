// src/formula/mod.rs

//! Formulas: declarative package recipes
//!
//! A formula names one package, the source archive it is built from and that
//! archive's digest, the packages it depends on, and how the installer should
//! drive CMake and test the result.
//!
//! # Example Formula
//!
//! ```toml
//! [package]
//! name = "sddc"
//! url = "https://example.com/sddc-%(version)s.tar.gz"
//! version = "1.0.1"
//! sha256 = "3f5a..."
//!
//! [[depends_on]]
//! name = "cmake"
//! kind = "build"
//!
//! [install]
//! plugin_dir = "lib/SoapySDR/modules-1"
//!
//! [test]
//! libraries = ["libsddc"]
//! ```

mod builtin;
mod format;
pub mod parser;

pub use builtin::{builtin_formula, builtin_names, SDDC_FORMULA};
pub use format::{
    Dependency, DependencyKind, Formula, InstallSection, PackageSection, TestSection,
};
pub use parser::{parse_formula, parse_formula_file, validate_formula};
