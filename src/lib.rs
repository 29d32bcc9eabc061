// src/lib.rs

//! SDDC formula installer
//!
//! Builds and installs the SDDC libraries and SoapySDR support module from a
//! declarative formula: fetch the source tarball, verify its digest, build it
//! out of source with CMake, install into a prefix, relocate the SoapySDR
//! plugin modules, and smoke test the result.
//!
//! # Architecture
//!
//! - Formulas: TOML recipes with package metadata and dependencies
//! - Installer: linear, blocking phases; fetch/configure/build failures are
//!   fatal, relocation and smoke test problems are warnings
//! - Seams: the external build system ([`BuildTool`]) and the dependency
//!   check ([`DependencyChecker`]) are traits so hosts and tests can swap them

mod error;
pub mod formula;
pub mod hash;
pub mod installer;

pub use error::{Error, Result, Warning};
pub use formula::{
    builtin_formula, parse_formula, parse_formula_file, validate_formula, Dependency,
    DependencyKind, Formula,
};
pub use hash::{Hash, HashAlgorithm};
pub use installer::{
    BuildTool, CMake, ConfigureRequest, DependencyChecker, InstallReport, Installer,
    InstallerConfig, RelocationOutcome, SmokeTestOutcome, StepOutput,
};
