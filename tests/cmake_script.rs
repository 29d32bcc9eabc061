// tests/cmake_script.rs

//! Drives the real `CMake` tool wrapper with a shell script standing in for
//! the cmake executable.

#![cfg(unix)]

mod common;

use common::{formula_for, write_source_tarball, PLUGIN_DIR};
use sddc_formula::installer::NoopChecker;
use sddc_formula::{Error, Installer, InstallerConfig};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};

// Writing an executable while another test thread forks can fail with
// ETXTBSY, so script tests run one at a time.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

const FAKE_CMAKE: &str = r#"#!/bin/sh
if [ "$1" = "--build" ]; then
    prefix=$(cat prefix.txt)
    mkdir -p "$prefix/lib/SoapySDR/modules-1"
    echo library > "$prefix/lib/libsddc.so"
    echo module > "$prefix/lib/SoapySDR/modules-1/libSoapySDDC.so"
    echo "-- Installing: $prefix/lib/libsddc.so"
    exit 0
fi
for arg in "$@"; do
    case "$arg" in
        -DCMAKE_INSTALL_PREFIX=*) echo "${arg#-DCMAKE_INSTALL_PREFIX=}" > prefix.txt ;;
        -DCMAKE_BUILD_TYPE=*) [ "$arg" = "-DCMAKE_BUILD_TYPE=Release" ] || exit 3 ;;
    esac
done
if [ ! -f "$1/CMakeLists.txt" ]; then
    echo "CMake Error: configuration failed" >&2
    exit 1
fi
echo "-- Configuring done"
"#;

fn write_script(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("cmake");
    fs::write(&script, FAKE_CMAKE).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[test]
fn test_install_with_cmake_executable() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let archive = write_source_tarball(dir.path());
    let script = write_script(dir.path());
    let prefix = dir.path().join("prefix");

    let config = InstallerConfig {
        cmake: script,
        jobs: 2,
        ..InstallerConfig::with_source_cache(dir.path().join("cache"))
    };
    let installer = Installer::new(config).with_checker(Arc::new(NoopChecker));
    let formula = formula_for(&archive, "");

    let report = installer.install(&formula, &prefix).unwrap();

    assert!(report.log.contains("-- Configuring done"));
    assert!(report.log.contains("-- Installing:"));
    assert_eq!(report.relocation.copied_count(), 1);
    assert!(prefix.join("lib/libSoapySDDC.so").is_file());
    assert!(prefix.join(PLUGIN_DIR).join("libSoapySDDC.so").is_file());
}

#[test]
fn test_configure_failure_from_cmake_executable() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let archive = write_source_tarball(dir.path());
    let script = write_script(dir.path());
    let prefix = dir.path().join("prefix");

    let config = InstallerConfig {
        cmake: script,
        ..InstallerConfig::with_source_cache(dir.path().join("cache"))
    };
    let installer = Installer::new(config).with_checker(Arc::new(NoopChecker));
    // An unexpected build type makes the script refuse to configure
    let mut formula = formula_for(&archive, "");
    formula.install.build_type = "Debug".to_string();

    match installer.install(&formula, &prefix) {
        Err(Error::ConfigurationError { message, .. }) => assert!(message.contains("status 3")),
        other => panic!("expected configuration error, got {:?}", other.map(|r| r.package)),
    }
    assert!(!prefix.exists());
}
