// src/installer/depends.rs

//! Dependency precondition checks
//!
//! The installer does not resolve or install dependencies. It only asserts
//! that whatever resolved them left the declared packages in place.

use crate::error::{Error, Result};
use crate::formula::{Dependency, DependencyKind, Formula};
use std::ffi::OsString;
use tracing::{debug, info};

/// Trait for checking whether declared dependencies are present
///
/// Keeps the installer decoupled from whatever package database or resolver
/// the host uses.
pub trait DependencyChecker: Send + Sync {
    /// Return the names of the dependencies that are not present
    fn check_missing(&self, deps: &[&Dependency]) -> Result<Vec<String>>;
}

/// A checker that assumes every dependency is satisfied
pub struct NoopChecker;

impl DependencyChecker for NoopChecker {
    fn check_missing(&self, _deps: &[&Dependency]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Probes `PATH` for build-time dependencies
///
/// Run-time dependencies are libraries this checker cannot see, so they are
/// reported as present.
pub struct PathChecker {
    search_path: Option<OsString>,
}

impl PathChecker {
    /// Check against the process `PATH`
    pub fn new() -> Self {
        Self { search_path: None }
    }

    /// Check against an explicit search path
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    fn is_present(&self, program: &str) -> bool {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_default();
                which::which_in(program, Some(paths), cwd).is_ok()
            }
            None => which::which(program).is_ok(),
        }
    }
}

impl Default for PathChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyChecker for PathChecker {
    fn check_missing(&self, deps: &[&Dependency]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for dep in deps {
            match dep.kind {
                DependencyKind::Build => {
                    if self.is_present(dep.probe_name()) {
                        debug!("Found build dependency {} on PATH", dep.probe_name());
                    } else {
                        missing.push(dep.name.clone());
                    }
                }
                DependencyKind::Run => {
                    debug!("Assuming run dependency {} is provided", dep.name);
                }
            }
        }
        Ok(missing)
    }
}

/// Result of checking a formula's dependencies
#[derive(Debug, Default, Clone)]
pub struct DependencyReport {
    /// Dependencies found present, in declaration order
    pub satisfied: Vec<String>,
}

/// Assert that every dependency of `formula` is present
///
/// Build-time dependencies are checked first so a missing toolchain is
/// reported even when run-time packages are also absent.
pub fn check_dependencies(
    checker: &dyn DependencyChecker,
    formula: &Formula,
) -> Result<DependencyReport> {
    if formula.depends_on.is_empty() {
        debug!("No dependencies declared");
        return Ok(DependencyReport::default());
    }

    for kind in [DependencyKind::Build, DependencyKind::Run] {
        let deps: Vec<&Dependency> = formula.dependencies(kind).collect();
        if deps.is_empty() {
            continue;
        }

        let missing = checker.check_missing(&deps)?;
        if !missing.is_empty() {
            return Err(Error::MissingDependency {
                kind: kind.to_string(),
                names: missing,
            });
        }
    }

    let satisfied: Vec<String> = formula.depends_on.iter().map(|d| d.name.clone()).collect();
    info!("Dependencies satisfied: {}", satisfied.join(", "));

    Ok(DependencyReport { satisfied })
}
