// src/installer/build.rs

//! Out-of-source CMake builds
//!
//! The external build system is a black box: it gets a source directory, a
//! build type and an install prefix, and its exit status is the only signal
//! of success.

use crate::error::{Error, Result};
use crate::formula::Formula;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

use super::archive::{extract_archive, source_root};

/// Everything the configure step needs to know
#[derive(Debug, Clone)]
pub struct ConfigureRequest<'a> {
    pub source_dir: &'a Path,
    pub build_dir: &'a Path,
    pub prefix: &'a Path,
    pub build_type: &'a str,
    pub extra_args: &'a [String],
}

impl ConfigureRequest<'_> {
    /// Arguments for `cmake` in configure mode
    ///
    /// Paths are passed through as raw OS strings so a non-UTF-8 prefix
    /// reaches cmake unchanged.
    pub fn args(&self) -> Vec<OsString> {
        let mut prefix = OsString::from("-DCMAKE_INSTALL_PREFIX=");
        prefix.push(self.prefix);

        let mut args = vec![
            self.source_dir.as_os_str().to_os_string(),
            OsString::from(format!("-DCMAKE_BUILD_TYPE={}", self.build_type)),
            prefix,
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

/// Captured result of one external tool invocation
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout and stderr joined for diagnostics
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Seam for the external build system
pub trait BuildTool: Send + Sync {
    /// Configure a fresh build directory
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput>;

    /// Build the configured tree and run its install target
    fn build_install(&self, build_dir: &Path, jobs: u32) -> Result<StepOutput>;
}

/// The `cmake` command-line tool
pub struct CMake {
    program: PathBuf,
}

impl CMake {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[OsString], workdir: &Path) -> Result<StepOutput> {
        let printable: Vec<_> = args.iter().map(|a| a.to_string_lossy()).collect();
        debug!("Running {} {}", self.program.display(), printable.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(|e| {
                Error::IoError(format!("Failed to run {}: {}", self.program.display(), e))
            })?;

        Ok(StepOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl BuildTool for CMake {
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput> {
        self.run(&request.args(), request.build_dir)
    }

    fn build_install(&self, build_dir: &Path, jobs: u32) -> Result<StepOutput> {
        let mut args: Vec<OsString> = ["--build", ".", "--target", "install"]
            .iter()
            .map(OsString::from)
            .collect();
        if jobs > 0 {
            args.push(OsString::from("--parallel"));
            args.push(OsString::from(jobs.to_string()));
        }
        self.run(&args, build_dir)
    }
}

/// A single build of one formula
///
/// Owns the scoped working directory: extracted sources under `source/`,
/// the out-of-source tree under `build/`. Dropping the `Build` removes both.
pub struct Build<'a> {
    formula: &'a Formula,
    tool: &'a dyn BuildTool,
    workspace: TempDir,
    source_dir: PathBuf,
    build_dir: PathBuf,
    /// Build log accumulator
    pub(super) log: String,
}

impl<'a> Build<'a> {
    pub fn new(formula: &'a Formula, tool: &'a dyn BuildTool) -> Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix(&format!("{}-build-", formula.package.name))
            .tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;

        let source_dir = workspace.path().join("source");
        let build_dir = workspace.path().join("build");
        fs::create_dir_all(&source_dir)?;

        Ok(Self {
            formula,
            tool,
            workspace,
            source_dir,
            build_dir,
            log: String::new(),
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Unpack the verified archive into the workspace
    pub fn unpack(&mut self, archive: &Path) -> Result<()> {
        extract_archive(archive, &self.source_dir)?;
        self.source_dir = source_root(&self.source_dir)?;
        debug!("Source directory: {}", self.source_dir.display());
        self.log_line(&format!("Extracted source to {}", self.source_dir.display()));
        Ok(())
    }

    /// Create an empty build directory and run the configure step
    pub fn configure(&mut self, prefix: &Path) -> Result<()> {
        if self.build_dir.exists() {
            fs::remove_dir_all(&self.build_dir)?;
        }
        fs::create_dir_all(&self.build_dir)?;

        let install = &self.formula.install;
        let request = ConfigureRequest {
            source_dir: &self.source_dir,
            build_dir: &self.build_dir,
            prefix,
            build_type: &install.build_type,
            extra_args: &install.cmake_args,
        };

        info!("Running configure phase");
        let output = self
            .tool
            .configure(&request)
            .map_err(|e| Error::ConfigurationError {
                message: e.to_string(),
                output: String::new(),
            })?;
        self.log_step_output("configure", &output);

        if !output.success() {
            return Err(Error::ConfigurationError {
                message: format!("configure exited with status {}", describe_code(output.code)),
                output: output.combined(),
            });
        }

        Ok(())
    }

    /// Run the build system's install target
    pub fn build_install(&mut self, jobs: u32) -> Result<()> {
        info!("Running build and install phase");
        let output = self
            .tool
            .build_install(&self.build_dir, jobs)
            .map_err(|e| Error::BuildError {
                message: e.to_string(),
                output: String::new(),
            })?;
        self.log_step_output("build+install", &output);

        if !output.success() {
            return Err(Error::BuildError {
                message: format!("build exited with status {}", describe_code(output.code)),
                output: output.combined(),
            });
        }

        Ok(())
    }

    /// Keep the workspace on disk and return its path
    pub fn keep(self) -> PathBuf {
        self.workspace.keep()
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log step output (stdout/stderr) with a phase header
    fn log_step_output(&mut self, phase: &str, output: &StepOutput) {
        self.log_line(&format!("=== {} ===", phase));
        if !output.stdout.is_empty() {
            self.log.push_str(&output.stdout);
            self.log.push('\n');
        }
        if !output.stderr.is_empty() {
            self.log.push_str(&output.stderr);
            self.log.push('\n');
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}
