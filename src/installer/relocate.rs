// src/installer/relocate.rs

//! Plugin module relocation
//!
//! SoapySDR discovers driver modules under `lib/SoapySDR/modules-1`. Where
//! the upstream build puts them is outside the formula's control, so after
//! install the plugin directory is probed and, only if it exists, its
//! contents are copied into the package library directory.

use crate::error::{Error, Result};
use crate::formula::parser::is_contained_relative;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// What relocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// The plugin directory does not exist; nothing was copied
    Skipped { plugin_dir: PathBuf },
    /// Contents were copied; paths are relative to `dest`
    Copied { dest: PathBuf, files: Vec<PathBuf> },
}

impl RelocationOutcome {
    /// Number of files copied
    pub fn copied_count(&self) -> usize {
        match self {
            Self::Skipped { .. } => 0,
            Self::Copied { files, .. } => files.len(),
        }
    }
}

/// Copy everything under `<prefix>/<plugin_dir>` into `<prefix>/<lib_dir>`
///
/// Existing destination files are overwritten, so running this twice leaves
/// the same tree as running it once.
pub fn relocate_plugins(
    prefix: &Path,
    plugin_dir: &str,
    lib_dir: &str,
) -> Result<RelocationOutcome> {
    for dir in [plugin_dir, lib_dir] {
        if !is_contained_relative(dir) {
            return Err(Error::IoError(format!(
                "Refusing to relocate outside the prefix: {}",
                dir
            )));
        }
    }

    let source = prefix.join(plugin_dir);
    let dest = prefix.join(lib_dir);

    if !source.is_dir() {
        debug!("No plugin directory at {}, skipping relocation", source.display());
        return Ok(RelocationOutcome::Skipped { plugin_dir: source });
    }

    if dest.starts_with(&source) {
        return Err(Error::IoError(format!(
            "Library directory {} lies inside plugin directory {}",
            dest.display(),
            source.display()
        )));
    }

    // Collect first: the destination may be an ancestor of the source
    let entries: Vec<walkdir::DirEntry> = WalkDir::new(&source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::IoError(format!("Failed to walk {}: {}", source.display(), e)))?;

    fs::create_dir_all(&dest)?;
    let mut files = Vec::new();

    for entry in entries {
        let relative = entry
            .path()
            .strip_prefix(&source)
            .map_err(|e| Error::IoError(e.to_string()))?
            .to_path_buf();
        let target = dest.join(&relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            files.push(relative);
        } else {
            if target.is_symlink() {
                fs::remove_file(&target)?;
            }
            fs::copy(entry.path(), &target).map_err(|e| {
                Error::IoError(format!(
                    "Failed to copy {} to {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                ))
            })?;
            files.push(relative);
        }
    }

    info!(
        "Relocated {} plugin file(s) from {} to {}",
        files.len(),
        source.display(),
        dest.display()
    );

    Ok(RelocationOutcome::Copied { dest, files })
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link)?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(points_to, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const PLUGIN_DIR: &str = "lib/SoapySDR/modules-1";

    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(dir).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    fn prefix_with_modules() -> tempfile::TempDir {
        let prefix = tempfile::tempdir().unwrap();
        let modules = prefix.path().join(PLUGIN_DIR);
        fs::create_dir_all(&modules).unwrap();
        fs::write(modules.join("libSoapySDDC.so"), b"module").unwrap();
        fs::write(prefix.path().join("lib/libsddc.so"), b"library").unwrap();
        prefix
    }

    #[test]
    fn test_missing_plugin_dir_is_noop() {
        let prefix = tempfile::tempdir().unwrap();
        fs::create_dir_all(prefix.path().join("lib")).unwrap();
        fs::write(prefix.path().join("lib/libsddc.so"), b"library").unwrap();
        let before = snapshot(prefix.path());

        let outcome = relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();
        assert!(matches!(outcome, RelocationOutcome::Skipped { .. }));
        assert_eq!(outcome.copied_count(), 0);
        assert_eq!(snapshot(prefix.path()), before);
    }

    #[test]
    fn test_copies_modules_into_lib() {
        let prefix = prefix_with_modules();
        let outcome = relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();

        assert_eq!(outcome.copied_count(), 1);
        assert_eq!(
            fs::read(prefix.path().join("lib/libSoapySDDC.so")).unwrap(),
            b"module"
        );
        // Source stays in place for SoapySDR's own discovery
        assert!(prefix.path().join(PLUGIN_DIR).join("libSoapySDDC.so").exists());
    }

    #[test]
    fn test_relocation_is_idempotent() {
        let prefix = prefix_with_modules();
        let modules = prefix.path().join(PLUGIN_DIR);
        fs::create_dir_all(modules.join("extra")).unwrap();
        fs::write(modules.join("extra/conf.ini"), b"x=1").unwrap();

        relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();
        let first = snapshot(prefix.path());
        let outcome = relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();
        let second = snapshot(prefix.path());

        assert_eq!(first, second);
        assert_eq!(outcome.copied_count(), 2);
    }

    #[test]
    fn test_overwrites_stale_copy() {
        let prefix = prefix_with_modules();
        fs::write(prefix.path().join("lib/libSoapySDDC.so"), b"stale").unwrap();
        relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();
        assert_eq!(
            fs::read(prefix.path().join("lib/libSoapySDDC.so")).unwrap(),
            b"module"
        );
    }

    #[test]
    fn test_lib_dir_inside_plugin_dir_rejected() {
        let prefix = prefix_with_modules();
        let lib_dir = format!("{}/nested", PLUGIN_DIR);
        assert!(relocate_plugins(prefix.path(), PLUGIN_DIR, &lib_dir).is_err());
    }

    #[test]
    fn test_paths_outside_prefix_rejected() {
        let prefix = prefix_with_modules();
        let outside = tempfile::tempdir().unwrap();
        let absolute = outside.path().join("lib");

        let result = relocate_plugins(prefix.path(), PLUGIN_DIR, absolute.to_str().unwrap());
        assert!(result.is_err());
        assert!(!absolute.exists());

        assert!(relocate_plugins(prefix.path(), PLUGIN_DIR, "../lib").is_err());
        assert!(relocate_plugins(prefix.path(), "../modules", "lib").is_err());
        assert!(!prefix.path().join("lib/libSoapySDDC.so").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_preserved() {
        let prefix = prefix_with_modules();
        let modules = prefix.path().join(PLUGIN_DIR);
        std::os::unix::fs::symlink("libSoapySDDC.so", modules.join("libSoapySDDC.so.0")).unwrap();

        relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();
        relocate_plugins(prefix.path(), PLUGIN_DIR, "lib").unwrap();

        let link = prefix.path().join("lib/libSoapySDDC.so.0");
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("libSoapySDDC.so"));
    }
}
