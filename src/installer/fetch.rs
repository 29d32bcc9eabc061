// src/installer/fetch.rs

//! Source archive download and verification
//!
//! Archives are downloaded to a `.part` file next to the cache entry, hashed,
//! and only renamed into place once the digest matches. A corrupt download
//! therefore never lands in the cache under its digest name.

use crate::error::{Error, Result};
use crate::hash::{verify_file, Hash};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Timeout for HTTP requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Where a source archive comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Remote `http`/`https` URL
    Remote(String),
    /// Local file, from a `file://` URL or a plain path
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify a formula url
    pub fn parse(raw: &str) -> Result<Self> {
        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(raw.to_string())),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|_| Error::FetchError(format!("Invalid file url: {}", raw))),
                other => Err(Error::FetchError(format!(
                    "Unsupported url scheme '{}': {}",
                    other, raw
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local(PathBuf::from(raw))),
            Err(e) => Err(Error::FetchError(format!("Invalid url {}: {}", raw, e))),
        }
    }
}

/// Cache entry name for a digest, e.g. `sha256_3f5a...`
pub fn cache_key(expected: &Hash) -> String {
    format!("{}_{}", expected.algorithm, expected.value)
}

/// Fetch a source archive into `cache_dir` and verify it against `expected`
///
/// A cached archive whose digest still matches is reused without touching
/// the network. A cached archive that no longer matches is discarded and
/// fetched again.
pub fn fetch_verified(
    url: &str,
    expected: &Hash,
    cache_dir: &Path,
    show_progress: bool,
) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir).map_err(|e| {
        Error::IoError(format!(
            "Failed to create source cache {}: {}",
            cache_dir.display(),
            e
        ))
    })?;

    let key = cache_key(expected);
    let cached_path = cache_dir.join(&key);

    if cached_path.exists() {
        debug!("Using cached source: {}", cached_path.display());
        match verify_file(&cached_path, expected) {
            Ok(()) => return Ok(cached_path),
            Err(Error::ChecksumMismatch { actual, .. }) => {
                warn!("Cached source hashes to {}, re-fetching", actual);
                fs::remove_file(&cached_path)?;
            }
            Err(e) => return Err(e),
        }
    }

    let temp_path = cache_dir.join(format!("{}.part", key));
    if let Err(e) = download_file(url, &temp_path, show_progress) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = verify_file(&temp_path, expected) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    info!("Verified {} ({})", url, expected.to_prefixed_string());

    fs::rename(&temp_path, &cached_path)?;
    Ok(cached_path)
}

/// Download `url` to `dest`
pub fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    match SourceLocation::parse(url)? {
        SourceLocation::Local(path) => {
            info!("Copying local source: {}", path.display());
            if !path.is_file() {
                return Err(Error::FetchError(format!(
                    "Source archive not found: {}",
                    path.display()
                )));
            }
            fs::copy(&path, dest).map_err(|e| {
                Error::FetchError(format!("Failed to copy {}: {}", path.display(), e))
            })?;
            Ok(())
        }
        SourceLocation::Remote(url) => download_http(&url, dest, show_progress),
    }
}

fn download_http(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    info!("Downloading: {}", url);

    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::FetchError(format!("Failed to create HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::FetchError(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::FetchError(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress = show_progress.then(|| download_progress_bar(url, total_size));

    let mut file = File::create(dest)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", dest.display(), e)))?;
    let downloaded = stream_response_to_file(response, &mut file, progress.as_ref())?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    debug!("Downloaded {} bytes from {}", downloaded, url);

    Ok(())
}

/// Stream an HTTP response to a file in fixed-size chunks
fn stream_response_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::FetchError(format!("Failed to read response: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;

        downloaded += bytes_read as u64;

        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    Ok(downloaded)
}

fn download_progress_bar(url: &str, total_size: u64) -> ProgressBar {
    let name = url.rsplit('/').next().unwrap_or(url).to_string();
    if total_size > 0 {
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:30}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(name);
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("{} (unknown size)", name));
        pb
    }
}
