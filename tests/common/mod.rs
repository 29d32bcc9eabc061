// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use sddc_formula::hash::hash_file;
use sddc_formula::installer::{BuildTool, ConfigureRequest, StepOutput};
use sddc_formula::{parse_formula, Formula, HashAlgorithm, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const PLUGIN_DIR: &str = "lib/SoapySDR/modules-1";

/// Write a release-style tarball with a single top-level directory.
pub fn write_source_tarball(dir: &Path) -> PathBuf {
    let archive = dir.join("sddc-1.0.1.tar.gz");
    let file = File::create(&archive).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let files: &[(&str, &[u8])] = &[
        ("sddc-1.0.1/CMakeLists.txt", b"project(sddc C CXX)\n"),
        ("sddc-1.0.1/libsddc/libsddc.c", b"int sddc_get_device_count(void) { return 0; }\n"),
        ("sddc-1.0.1/SoapySDDC/SoapySDDC.cpp", b"// module\n"),
    ];
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    archive
}

/// Formula pointing at a local archive through a `file://` URL.
///
/// `extra` is appended verbatim, for `[[depends_on]]` or `[test]` tables.
pub fn formula_with_checksum(archive: &Path, sha256: &str, extra: &str) -> Formula {
    let url = url::Url::from_file_path(archive).unwrap();
    let content = format!(
        r#"
[package]
name = "sddc"
desc = "SDDC libraries and SoapySDR support module"
homepage = "www.rx-888.com/rx/"
url = "{url}"
sha256 = "{sha256}"
license = "GPL-3.0-or-later"

{extra}
"#
    );
    parse_formula(&content).unwrap()
}

/// Formula with the archive's real digest.
pub fn formula_for(archive: &Path, extra: &str) -> Formula {
    let digest = hash_file(archive, HashAlgorithm::Sha256).unwrap();
    formula_with_checksum(archive, &digest.value, extra)
}

/// Build system stand-in that records calls and installs a fake tree.
#[derive(Default)]
pub struct FakeCMake {
    pub calls: Mutex<Vec<String>>,
    pub configure_args: Mutex<Vec<String>>,
    prefix: Mutex<Option<PathBuf>>,
    pub fail_configure: bool,
    pub install_plugins: bool,
}

impl FakeCMake {
    pub fn installing_plugins() -> Self {
        Self {
            install_plugins: true,
            ..Default::default()
        }
    }

    pub fn failing_configure() -> Self {
        Self {
            fail_configure: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl BuildTool for FakeCMake {
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput> {
        self.calls.lock().unwrap().push("configure".to_string());
        assert!(request.source_dir.join("CMakeLists.txt").is_file());
        assert_eq!(fs::read_dir(request.build_dir).unwrap().count(), 0);

        *self.configure_args.lock().unwrap() = request
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        *self.prefix.lock().unwrap() = Some(request.prefix.to_path_buf());

        if self.fail_configure {
            return Ok(StepOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "CMake Error: Could NOT find SoapySDR".to_string(),
            });
        }
        Ok(StepOutput {
            code: Some(0),
            stdout: "-- Configuring done".to_string(),
            stderr: String::new(),
        })
    }

    fn build_install(&self, _build_dir: &Path, _jobs: u32) -> Result<StepOutput> {
        self.calls.lock().unwrap().push("build_install".to_string());
        let prefix = self.prefix.lock().unwrap().clone().unwrap();

        let lib = prefix.join("lib");
        fs::create_dir_all(&lib)?;
        fs::write(lib.join("libsddc.so"), b"library")?;
        if self.install_plugins {
            let modules = prefix.join(PLUGIN_DIR);
            fs::create_dir_all(&modules)?;
            fs::write(modules.join("libSoapySDDC.so"), b"module")?;
        }

        Ok(StepOutput {
            code: Some(0),
            stdout: "-- Installing: libsddc.so".to_string(),
            stderr: String::new(),
        })
    }
}
