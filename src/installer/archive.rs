// src/installer/archive.rs

//! Source archive extraction

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive compression detected from name or magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
}

impl ArchiveFormat {
    /// Detect the format from the file name, falling back to magic bytes
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Ok(Self::TarGz);
        }
        if name.ends_with(".tar") {
            return Ok(Self::Tar);
        }

        let mut magic = [0u8; 262];
        let mut file = File::open(path)?;
        let n = file.read(&mut magic)?;

        // gzip: 1f 8b
        if n >= 2 && magic[0..2] == [0x1F, 0x8B] {
            return Ok(Self::TarGz);
        }
        // ustar magic lives at offset 257
        if n >= 262 && &magic[257..262] == b"ustar" {
            return Ok(Self::Tar);
        }

        Err(Error::ParseError(format!("Unknown archive format: {}", name)))
    }
}

/// Extract an archive into `dest`
///
/// Supports: .tar.gz, .tgz, .tar
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let format = ArchiveFormat::detect(archive)?;
    debug!("Extracting {} as {:?}", archive.display(), format);

    fs::create_dir_all(dest)?;
    let file = BufReader::new(File::open(archive)?);

    let result = match format {
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(file)).unpack(dest),
        ArchiveFormat::Tar => tar::Archive::new(file).unpack(dest),
    };

    result.map_err(|e| {
        Error::IoError(format!(
            "Failed to extract {}: {}",
            archive.display(),
            e
        ))
    })
}

/// Find the source root inside an extraction directory
///
/// Release tarballs usually wrap everything in one top-level directory;
/// in that case the directory itself is the root.
pub fn source_root(extract_dir: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extract_dir)?
        .filter_map(|e| e.ok())
        .collect();

    if entries.len() == 1 && entries[0].file_type().map(|t| t.is_dir()).unwrap_or(false) {
        return Ok(entries[0].path());
    }

    if entries.is_empty() {
        return Err(Error::IoError(format!(
            "Source archive extracted nothing into {}",
            extract_dir.display()
        )));
    }

    Ok(extract_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn write_tarball(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_tarball_with_top_level_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("sddc-1.0.1.tar.gz");
        write_tarball(
            &archive,
            &[
                ("sddc-1.0.1/CMakeLists.txt", b"project(sddc)\n"),
                ("sddc-1.0.1/src/libsddc.c", b"int x;\n"),
            ],
        );

        let dest = dir.path().join("source");
        extract_archive(&archive, &dest).unwrap();
        let root = source_root(&dest).unwrap();
        assert_eq!(root, dest.join("sddc-1.0.1"));
        assert!(root.join("CMakeLists.txt").is_file());
    }

    #[test]
    fn test_source_root_flat_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("flat.tgz");
        write_tarball(&archive, &[("CMakeLists.txt", b"x"), ("README", b"y")]);

        let dest = dir.path().join("source");
        extract_archive(&archive, &dest).unwrap();
        assert_eq!(source_root(&dest).unwrap(), dest);
    }

    #[test]
    fn test_detect_gzip_by_magic() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("download");
        write_tarball(&archive, &[("a", b"b")]);
        assert_eq!(ArchiveFormat::detect(&archive).unwrap(), ArchiveFormat::TarGz);
    }

    #[test]
    fn test_extract_archive_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("file.unknown");
        std::fs::write(&archive, b"not an archive").unwrap();
        assert!(extract_archive(&archive, &dir.path().join("out")).is_err());
    }
}
