// src/formula/parser.rs

//! Formula file parsing and validation

use crate::error::{Error, Result};
use crate::formula::format::{DependencyKind, Formula};
use std::collections::HashSet;
use std::path::{Component, Path};
use url::Url;

/// Parse a formula from a TOML string
pub fn parse_formula(content: &str) -> Result<Formula> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid formula: {}", e)))
}

/// Parse a formula from a file
pub fn parse_formula_file(path: &Path) -> Result<Formula> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!("Failed to read formula file {}: {}", path.display(), e))
    })?;

    parse_formula(&content)
}

/// Validate a formula for completeness and correctness
///
/// Hard problems are returned as errors. Soft problems, including a
/// placeholder checksum, come back as warnings: the formula is readable but
/// an install will not succeed until they are fixed.
pub fn validate_formula(formula: &Formula) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    let package = &formula.package;

    if package.name.trim().is_empty() {
        return Err(Error::ParseError("Formula name cannot be empty".to_string()));
    }

    validate_source_url(&formula.source_url())?;

    match formula.checksum() {
        Ok(_) => {}
        Err(Error::PlaceholderChecksum { value, .. }) => {
            warnings.push(format!(
                "sha256 '{}' is a placeholder; install will fail until the real digest is set",
                value
            ));
        }
        Err(e) => return Err(e),
    }

    let mut seen = HashSet::new();
    for dep in &formula.depends_on {
        if dep.name.trim().is_empty() {
            return Err(Error::ParseError("Dependency name cannot be empty".to_string()));
        }
        if !seen.insert(dep.name.as_str()) {
            return Err(Error::ParseError(format!(
                "Dependency '{}' declared more than once",
                dep.name
            )));
        }
    }

    for (field, value) in [
        ("plugin_dir", &formula.install.plugin_dir),
        ("lib_dir", &formula.install.lib_dir),
    ] {
        if !is_contained_relative(value) {
            return Err(Error::ParseError(format!(
                "install.{} must be a relative path inside the prefix: {}",
                field, value
            )));
        }
    }

    if formula.install.build_type.trim().is_empty() {
        return Err(Error::ParseError("install.build_type cannot be empty".to_string()));
    }

    if !formula.test.symbols.is_empty() && formula.test.libraries.is_empty() {
        return Err(Error::ParseError(
            "test.symbols requires at least one entry in test.libraries".to_string(),
        ));
    }

    if package.desc.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if package.homepage.is_none() {
        warnings.push("Missing package homepage".to_string());
    }
    if formula.version().is_none() {
        warnings.push("No version given and none could be inferred from the url".to_string());
    }
    if !formula
        .dependencies(DependencyKind::Build)
        .any(|d| d.probe_name() == "cmake")
    {
        warnings.push("cmake is not declared as a build dependency".to_string());
    }
    if formula.test.is_empty() {
        warnings.push("Empty [test] section; the smoke test will always pass".to_string());
    }

    Ok(warnings)
}

fn validate_source_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(Error::ParseError("Formula url cannot be empty".to_string()));
    }

    match Url::parse(raw) {
        Ok(url) => match url.scheme() {
            "http" | "https" | "file" => Ok(()),
            other => Err(Error::ParseError(format!(
                "Unsupported url scheme '{}' in {}",
                other, raw
            ))),
        },
        // Plain filesystem paths are accepted for local tarballs
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(Error::ParseError(format!("Invalid url {}: {}", raw, e))),
    }
}

/// Whether `path` is relative and cannot climb out of the directory it is
/// joined onto
pub fn is_contained_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
