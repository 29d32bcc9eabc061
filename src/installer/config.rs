// src/installer/config.rs

//! Configuration and result types for the installer

use crate::error::Warning;
use std::path::PathBuf;

use super::relocate::RelocationOutcome;
use super::smoke::SmokeTestOutcome;

/// Configuration for the Installer
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Directory for verified source archives
    pub source_cache: PathBuf,
    /// CMake executable
    pub cmake: PathBuf,
    /// Parallel build jobs passed to the build step
    pub jobs: u32,
    /// Keep the scoped build directory after the run (for debugging)
    pub keep_builddir: bool,
    /// Assert declared dependencies before fetching
    pub check_dependencies: bool,
    /// Run the post-install smoke test
    pub run_smoke_test: bool,
    /// Draw a progress bar for HTTP downloads
    pub show_progress: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("sddc-formula")
            .join("sources");

        Self {
            source_cache,
            cmake: PathBuf::from("cmake"),
            jobs,
            keep_builddir: false,
            check_dependencies: true,
            run_smoke_test: true,
            show_progress: false,
        }
    }
}

impl InstallerConfig {
    /// Configuration rooted at an explicit source cache
    pub fn with_source_cache(source_cache: impl Into<PathBuf>) -> Self {
        Self {
            source_cache: source_cache.into(),
            ..Self::default()
        }
    }
}

/// Result of installing a formula
#[derive(Debug)]
pub struct InstallReport {
    /// Package name and version
    pub package: String,
    /// Prefix the package was installed into
    pub prefix: PathBuf,
    /// Verified source archive in the cache
    pub source_archive: PathBuf,
    /// Log of every phase, including captured tool output
    pub log: String,
    /// Advisory problems; the install itself succeeded
    pub warnings: Vec<Warning>,
    /// What plugin relocation did
    pub relocation: RelocationOutcome,
    /// How the smoke test went
    pub smoke_test: SmokeTestOutcome,
    /// Build directory, when `keep_builddir` was set
    pub kept_builddir: Option<PathBuf>,
}

impl InstallReport {
    /// True when no advisory warnings were raised
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
