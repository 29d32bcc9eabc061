// src/installer/smoke.rs

//! Post-install smoke test
//!
//! Checks that the installed tree is structurally usable: the declared
//! shared libraries exist and parse as shared objects, the declared symbols
//! are exported, and an optional command runs cleanly. Object files are
//! inspected with goblin rather than loaded, so the check works for any
//! target without executing foreign code.

use crate::formula::TestSection;
use goblin::Object;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// How the smoke test went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeTestOutcome {
    /// Disabled by configuration
    Skipped,
    /// Every check passed; each entry describes one check
    Passed { checks: Vec<String> },
    /// The first failing check
    Failed { reason: String },
}

impl SmokeTestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// A shared library found under the prefix
#[derive(Debug, Clone)]
pub struct InspectedLibrary {
    pub path: PathBuf,
    pub format: &'static str,
    pub exports: HashSet<String>,
}

/// Run the smoke test described by `test` against `prefix`
pub fn run_smoke_test(test: &TestSection, prefix: &Path, lib_dir: &str) -> SmokeTestOutcome {
    match run_checks(test, prefix, lib_dir) {
        Ok(checks) => {
            info!("Smoke test passed ({} check(s))", checks.len());
            SmokeTestOutcome::Passed { checks }
        }
        Err(reason) => SmokeTestOutcome::Failed { reason },
    }
}

fn run_checks(
    test: &TestSection,
    prefix: &Path,
    lib_dir: &str,
) -> std::result::Result<Vec<String>, String> {
    let mut checks = Vec::new();
    let lib_path = prefix.join(lib_dir);

    if test.is_empty() {
        checks.push("no checks declared".to_string());
        return Ok(checks);
    }

    let mut libraries = Vec::new();
    for stem in &test.libraries {
        let path = find_library(&lib_path, stem)
            .ok_or_else(|| format!("{} not found in {}", stem, lib_path.display()))?;
        let library = inspect_library(&path)?;
        checks.push(format!(
            "{} is a {} shared library",
            path.display(),
            library.format
        ));
        libraries.push(library);
    }

    for symbol in &test.symbols {
        let found = libraries.iter().find(|lib| lib.exports.contains(symbol));
        match found {
            Some(lib) => checks.push(format!("{} exports {}", lib.path.display(), symbol)),
            None => return Err(format!("no installed library exports {}", symbol)),
        }
    }

    if let Some((program, args)) = test.command.split_first() {
        let output = Command::new(program)
            .args(args)
            .current_dir(prefix)
            .env("PREFIX", prefix)
            .output()
            .map_err(|e| format!("failed to run {}: {}", program, e))?;

        if !output.status.success() {
            return Err(format!(
                "`{}` exited with {:?}: {}",
                test.command.join(" "),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        checks.push(format!("`{}` succeeded", test.command.join(" ")));
    }

    Ok(checks)
}

/// Find a shared library by stem (`libsddc` matches `libsddc.so`,
/// `libsddc.so.0`, `libsddc.dylib`, `libsddc.0.dylib`, `libsddc.dll`)
pub fn find_library(lib_dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(lib_dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| matches_library_name(name, stem))
        })
        .collect();

    // Prefer the unversioned name when several exist
    candidates.sort_by_key(|p| p.as_os_str().len());
    candidates.into_iter().next()
}

fn matches_library_name(name: &str, stem: &str) -> bool {
    let Some(rest) = name.strip_prefix(stem) else {
        return false;
    };
    rest == ".so"
        || rest.starts_with(".so.")
        || rest == ".dylib"
        || (rest.starts_with('.') && rest.ends_with(".dylib"))
        || rest == ".dll"
}

/// Parse a shared library and collect its exported symbols
pub fn inspect_library(path: &Path) -> std::result::Result<InspectedLibrary, String> {
    let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    let (format, exports): (&'static str, HashSet<String>) = match Object::parse(&bytes) {
        Ok(Object::Elf(elf)) => {
            if elf.header.e_type != goblin::elf::header::ET_DYN {
                return Err(format!("{} is not an ELF shared object", path.display()));
            }
            let exports = elf
                .dynsyms
                .iter()
                .filter(|sym| !sym.is_import())
                .filter_map(|sym| elf.dynstrtab.get_at(sym.st_name))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            ("ELF", exports)
        }
        Ok(Object::Mach(goblin::mach::Mach::Binary(macho))) => {
            if macho.header.filetype != goblin::mach::header::MH_DYLIB
                && macho.header.filetype != goblin::mach::header::MH_BUNDLE
            {
                return Err(format!("{} is not a Mach-O dylib or bundle", path.display()));
            }
            let exports = macho
                .exports()
                .map_err(|e| format!("failed to read exports of {}: {}", path.display(), e))?
                .into_iter()
                .map(|export| {
                    export
                        .name
                        .strip_prefix('_')
                        .unwrap_or(&export.name)
                        .to_string()
                })
                .collect();
            ("Mach-O", exports)
        }
        Ok(Object::PE(pe)) => {
            if !pe.is_lib {
                return Err(format!("{} is not a DLL", path.display()));
            }
            let exports = pe
                .exports
                .iter()
                .filter_map(|export| export.name)
                .map(str::to_string)
                .collect();
            ("PE", exports)
        }
        Ok(_) => return Err(format!("{} is not a supported shared library format", path.display())),
        Err(e) => return Err(format!("failed to parse {}: {}", path.display(), e)),
    };

    debug!("{} exports {} symbol(s)", path.display(), exports.len());

    Ok(InspectedLibrary {
        path: path.to_path_buf(),
        format,
        exports,
    })
}
