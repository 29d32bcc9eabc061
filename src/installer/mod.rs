// src/installer/mod.rs

//! Installer: runs a formula from source archive to installed prefix
//!
//! The install is a straight line of blocking phases:
//!
//! 1. **Depends**: assert declared dependencies are present
//! 2. **Fetch & Verify**: download the archive and check its digest
//! 3. **Unpack**: extract into a scoped build workspace
//! 4. **Configure**: run the build system's configure step out of source
//! 5. **Build & Install**: run the install target into the prefix
//! 6. **Relocate**: copy plugin modules into the package library directory
//! 7. **Smoke test**: check the installed tree is usable
//!
//! Phases 1–5 are fatal: the first failure aborts with an [`Error`] and no
//! report. Phases 6 and 7 only add [`Warning`]s to the [`InstallReport`];
//! nothing already installed is rolled back.

mod archive;
mod build;
mod config;
mod depends;
mod fetch;
mod relocate;
mod smoke;

pub use archive::{extract_archive, ArchiveFormat};
pub use build::{Build, BuildTool, CMake, ConfigureRequest, StepOutput};
pub use config::{InstallReport, InstallerConfig};
pub use depends::{
    check_dependencies, DependencyChecker, DependencyReport, NoopChecker, PathChecker,
};
pub use fetch::{cache_key, download_file, fetch_verified, SourceLocation};
pub use relocate::{relocate_plugins, RelocationOutcome};
pub use smoke::{find_library, inspect_library, run_smoke_test, InspectedLibrary, SmokeTestOutcome};

use crate::error::{Error, Result, Warning};
use crate::formula::{validate_formula, Formula};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives formulas through the install phases
pub struct Installer {
    config: InstallerConfig,
    build_tool: Arc<dyn BuildTool>,
    checker: Arc<dyn DependencyChecker>,
}

impl Installer {
    /// Installer using the configured `cmake` and a `PATH` dependency probe
    pub fn new(config: InstallerConfig) -> Self {
        let build_tool = Arc::new(CMake::new(config.cmake.clone()));
        Self {
            config,
            build_tool,
            checker: Arc::new(PathChecker::new()),
        }
    }

    /// Installer with default configuration
    pub fn with_defaults() -> Self {
        Self::new(InstallerConfig::default())
    }

    /// Replace the external build system
    pub fn with_build_tool(mut self, tool: Arc<dyn BuildTool>) -> Self {
        self.build_tool = tool;
        self
    }

    /// Replace the dependency checker
    pub fn with_checker(mut self, checker: Arc<dyn DependencyChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Install `formula` into `prefix`
    pub fn install(&self, formula: &Formula, prefix: &Path) -> Result<InstallReport> {
        info!("Installing {} into {}", formula.display_name(), prefix.display());

        validate(formula)?;

        // Placeholder digests fail before anything touches the network
        let expected = formula.checksum()?;

        if self.config.check_dependencies {
            check_dependencies(self.checker.as_ref(), formula)?;
        }

        info!("Fetching source...");
        let archive = fetch_verified(
            &formula.source_url(),
            &expected,
            &self.config.source_cache,
            self.config.show_progress,
        )?;

        let prefix = absolute_prefix(prefix)?;
        let mut build = Build::new(formula, self.build_tool.as_ref())?;

        info!("Unpacking source...");
        build.unpack(&archive)?;

        info!("Configuring...");
        build.configure(&prefix)?;

        info!("Building and installing...");
        build.build_install(self.config.jobs)?;

        let mut log = std::mem::take(&mut build.log);
        let kept_builddir = if self.config.keep_builddir {
            let path = build.keep();
            info!("Keeping build directory: {}", path.display());
            Some(path)
        } else {
            drop(build);
            None
        };

        let mut warnings = Vec::new();
        let relocation = self.relocate(formula, &prefix, &mut warnings, &mut log);
        let smoke_test = self.smoke_test(formula, &prefix, &mut warnings, &mut log);

        info!("Installed {} into {}", formula.display_name(), prefix.display());

        Ok(InstallReport {
            package: formula.display_name(),
            prefix,
            source_archive: archive,
            log,
            warnings,
            relocation,
            smoke_test,
            kept_builddir,
        })
    }

    /// Fetch and verify the source archive without building
    pub fn fetch(&self, formula: &Formula) -> Result<PathBuf> {
        validate(formula)?;
        let expected = formula.checksum()?;
        info!("Fetching sources for {}", formula.display_name());
        fetch_verified(
            &formula.source_url(),
            &expected,
            &self.config.source_cache,
            self.config.show_progress,
        )
    }

    /// Whether the verified source archive is already cached
    pub fn source_cached(&self, formula: &Formula) -> bool {
        formula
            .checksum()
            .map(|expected| self.config.source_cache.join(cache_key(&expected)).exists())
            .unwrap_or(false)
    }

    /// Run only the smoke test against an existing prefix
    pub fn test(&self, formula: &Formula, prefix: &Path) -> SmokeTestOutcome {
        run_smoke_test(&formula.test, prefix, &formula.install.lib_dir)
    }

    fn relocate(
        &self,
        formula: &Formula,
        prefix: &Path,
        warnings: &mut Vec<Warning>,
        log: &mut String,
    ) -> RelocationOutcome {
        let install = &formula.install;
        match relocate_plugins(prefix, &install.plugin_dir, &install.lib_dir) {
            Ok(outcome) => {
                match &outcome {
                    RelocationOutcome::Skipped { plugin_dir } => {
                        log.push_str(&format!("No plugin directory at {}\n", plugin_dir.display()));
                    }
                    RelocationOutcome::Copied { dest, files } => {
                        log.push_str(&format!(
                            "Relocated {} plugin file(s) to {}\n",
                            files.len(),
                            dest.display()
                        ));
                    }
                }
                outcome
            }
            Err(e) => {
                warn!("Plugin relocation failed: {}", e);
                warnings.push(Warning::Relocation(e.to_string()));
                RelocationOutcome::Skipped {
                    plugin_dir: prefix.join(&install.plugin_dir),
                }
            }
        }
    }

    fn smoke_test(
        &self,
        formula: &Formula,
        prefix: &Path,
        warnings: &mut Vec<Warning>,
        log: &mut String,
    ) -> SmokeTestOutcome {
        if !self.config.run_smoke_test {
            return SmokeTestOutcome::Skipped;
        }

        let outcome = self.test(formula, prefix);
        match &outcome {
            SmokeTestOutcome::Passed { checks } => {
                for check in checks {
                    log.push_str(&format!("test: {}\n", check));
                }
            }
            SmokeTestOutcome::Failed { reason } => {
                warn!("Smoke test failed: {}", reason);
                log.push_str(&format!("test failed: {}\n", reason));
                warnings.push(Warning::SmokeTest(reason.clone()));
            }
            SmokeTestOutcome::Skipped => {}
        }
        outcome
    }
}

/// Reject formulas with hard problems; soft ones are only logged
fn validate(formula: &Formula) -> Result<()> {
    for warning in validate_formula(formula)? {
        debug!("{}: {}", formula.package.name, warning);
    }
    Ok(())
}

/// Resolve the prefix to an absolute path without creating it
fn absolute_prefix(prefix: &Path) -> Result<PathBuf> {
    if prefix.as_os_str().is_empty() {
        return Err(Error::IoError("Install prefix cannot be empty".to_string()));
    }
    if prefix.is_absolute() {
        Ok(prefix.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(prefix))
    }
}
