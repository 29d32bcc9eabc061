// src/formula/format.rs

//! Formula file format definitions
//!
//! Formulas are TOML files describing one package: where its source lives,
//! what it depends on, how CMake should be driven, and what the post-install
//! smoke test checks.

use crate::error::{Error, Result};
use crate::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Package metadata
    pub package: PackageSection,

    /// Declared dependencies, in declaration order
    #[serde(default)]
    pub depends_on: Vec<Dependency>,

    /// Build and install settings
    #[serde(default)]
    pub install: InstallSection,

    /// Post-install smoke test
    #[serde(default)]
    pub test: TestSection,
}

impl Formula {
    /// Substitute `%(version)s` and `%(name)s` in a string
    pub fn substitute(&self, template: &str) -> String {
        let version = self.version().unwrap_or_default();
        template
            .replace("%(version)s", &version)
            .replace("%(name)s", &self.package.name)
    }

    /// Source URL with variables substituted
    pub fn source_url(&self) -> String {
        self.substitute(&self.package.url)
    }

    /// Archive filename taken from the last URL path segment
    pub fn archive_filename(&self) -> String {
        let url = self.source_url();
        let path = url.split(['?', '#']).next().unwrap_or(&url);
        path.rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("source.tar.gz")
            .to_string()
    }

    /// Package version: explicit, or inferred from the archive filename
    pub fn version(&self) -> Option<String> {
        if let Some(version) = &self.package.version {
            return Some(version.clone());
        }
        let url = self.package.url.split(['?', '#']).next().unwrap_or(&self.package.url);
        let filename = url.rsplit('/').next()?;
        infer_version(filename)
    }

    /// Declared source checksum
    ///
    /// A value that is not a well-formed digest is reported as
    /// `Error::PlaceholderChecksum` so the install stops before any network
    /// or build activity. Unknown algorithm prefixes stay `InvalidChecksum`.
    pub fn checksum(&self) -> Result<Hash> {
        let value = self.package.sha256.trim();
        if let Some((algo, _)) = value.split_once(':') {
            algo.parse::<crate::hash::HashAlgorithm>()?;
        }
        Hash::parse_prefixed(value).map_err(|_| Error::PlaceholderChecksum {
            package: self.package.name.clone(),
            value: value.to_string(),
        })
    }

    /// Whether the declared checksum is still a placeholder
    pub fn has_placeholder_checksum(&self) -> bool {
        matches!(self.checksum(), Err(Error::PlaceholderChecksum { .. }))
    }

    /// Dependencies of one kind, in declaration order
    pub fn dependencies(&self, kind: DependencyKind) -> impl Iterator<Item = &Dependency> {
        self.depends_on.iter().filter(move |d| d.kind == kind)
    }

    /// Name and version for display, e.g. `sddc 1.0.1`
    pub fn display_name(&self) -> String {
        match self.version() {
            Some(version) => format!("{} {}", self.package.name, version),
            None => self.package.name.clone(),
        }
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version (inferred from the url when absent)
    #[serde(default)]
    pub version: Option<String>,

    /// One-line description
    #[serde(default)]
    pub desc: Option<String>,

    /// Project homepage
    #[serde(default)]
    pub homepage: Option<String>,

    /// Source archive URL
    ///
    /// Supports `%(version)s` and `%(name)s` substitution. `http`, `https`
    /// and `file` URLs are accepted, as are plain local paths.
    pub url: String,

    /// Source archive digest, bare SHA-256 hex or `algo:hex`
    pub sha256: String,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,
}

/// When a dependency must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed only while building
    Build,
    /// Needed by the installed artifact
    #[default]
    Run,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Run => "run",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,

    #[serde(default)]
    pub kind: DependencyKind,

    /// Executable proving the dependency is present (defaults to `name`)
    #[serde(default)]
    pub binary: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            binary: None,
        }
    }

    /// Executable name to probe for
    pub fn probe_name(&self) -> &str {
        self.binary.as_deref().unwrap_or(&self.name)
    }
}

/// Build and install settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSection {
    /// `CMAKE_BUILD_TYPE`
    #[serde(default = "default_build_type")]
    pub build_type: String,

    /// Extra arguments passed to the configure step
    #[serde(default)]
    pub cmake_args: Vec<String>,

    /// Where the build drops plugin modules, relative to the prefix
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: String,

    /// Package library directory, relative to the prefix
    #[serde(default = "default_lib_dir")]
    pub lib_dir: String,
}

impl Default for InstallSection {
    fn default() -> Self {
        Self {
            build_type: default_build_type(),
            cmake_args: Vec::new(),
            plugin_dir: default_plugin_dir(),
            lib_dir: default_lib_dir(),
        }
    }
}

fn default_build_type() -> String {
    "Release".to_string()
}

fn default_plugin_dir() -> String {
    "lib/SoapySDR/modules-1".to_string()
}

fn default_lib_dir() -> String {
    "lib".to_string()
}

/// Post-install smoke test
///
/// An empty section always passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSection {
    /// Shared library stems that must be installed (e.g. `libsddc`)
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Symbols at least one of `libraries` must export
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Command to run against the installed prefix
    #[serde(default)]
    pub command: Vec<String>,
}

impl TestSection {
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty() && self.symbols.is_empty() && self.command.is_empty()
    }
}

const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".tar.xz", ".tar.bz2", ".tar", ".zip"];

/// Infer a version from an archive filename such as `sddc-1.0.1.tar.gz`
fn infer_version(filename: &str) -> Option<String> {
    let stem = ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))
        .unwrap_or(filename);

    let candidate = match stem.rsplit_once(['-', '_']) {
        Some((_, tail)) => tail,
        None => stem,
    };
    let candidate = candidate.strip_prefix('v').unwrap_or(candidate);

    if candidate.starts_with(|c: char| c.is_ascii_digit()) {
        Some(candidate.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_formula(url: &str, sha256: &str) -> Formula {
        Formula {
            package: PackageSection {
                name: "sddc".to_string(),
                version: None,
                desc: None,
                homepage: None,
                url: url.to_string(),
                sha256: sha256.to_string(),
                license: None,
            },
            depends_on: vec![
                Dependency::new("cmake", DependencyKind::Build),
                Dependency::new("soapysdr", DependencyKind::Run),
                Dependency::new("fftw", DependencyKind::Run),
            ],
            install: InstallSection::default(),
            test: TestSection::default(),
        }
    }

    #[test]
    fn test_version_inferred_from_url() {
        let formula = make_formula("https://example.com/sddc-1.0.1.tar.gz", "x");
        assert_eq!(formula.version().as_deref(), Some("1.0.1"));
        assert_eq!(formula.display_name(), "sddc 1.0.1");
    }

    #[test]
    fn test_version_with_v_prefix() {
        assert_eq!(infer_version("ExtIO_sddc-v1.3.0.tgz").as_deref(), Some("1.3.0"));
        assert_eq!(infer_version("source.tar.gz"), None);
    }

    #[test]
    fn test_url_substitution() {
        let mut formula = make_formula("https://example.com/%(name)s-%(version)s.tar.gz", "x");
        formula.package.version = Some("2.0".to_string());
        assert_eq!(formula.source_url(), "https://example.com/sddc-2.0.tar.gz");
        assert_eq!(formula.archive_filename(), "sddc-2.0.tar.gz");
    }

    #[test]
    fn test_placeholder_checksum() {
        let formula = make_formula(
            "https://example.com/sddc-1.0.1.tar.gz",
            "REPLACE_WITH_REAL_SHA256",
        );
        assert!(formula.has_placeholder_checksum());
        assert!(matches!(
            formula.checksum(),
            Err(Error::PlaceholderChecksum { .. })
        ));
    }

    #[test]
    fn test_unknown_algorithm_is_not_placeholder() {
        let formula = make_formula("https://example.com/sddc-1.0.1.tar.gz", "md5:abc");
        assert!(matches!(formula.checksum(), Err(Error::InvalidChecksum(_))));
    }

    #[test]
    fn test_dependencies_by_kind() {
        let formula = make_formula("https://example.com/sddc-1.0.1.tar.gz", "x");
        let build: Vec<_> = formula
            .dependencies(DependencyKind::Build)
            .map(|d| d.name.as_str())
            .collect();
        let run: Vec<_> = formula
            .dependencies(DependencyKind::Run)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(build, vec!["cmake"]);
        assert_eq!(run, vec!["soapysdr", "fftw"]);
    }

    #[test]
    fn test_install_defaults() {
        let install = InstallSection::default();
        assert_eq!(install.build_type, "Release");
        assert_eq!(install.plugin_dir, "lib/SoapySDR/modules-1");
        assert_eq!(install.lib_dir, "lib");
    }
}
