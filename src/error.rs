// src/error.rs

//! Error types for the formula installer
//!
//! Every [`Error`] variant aborts an install. Problems that only make the
//! result inconclusive (plugin relocation, smoke test) are reported as
//! [`Warning`]s instead and never undo completed steps.

use std::fmt;
use thiserror::Error;

/// Fatal installer errors
#[derive(Error, Debug)]
pub enum Error {
    /// The formula still carries a placeholder instead of a real digest
    #[error("Checksum for {package} is a placeholder ({value}); set the real sha256")]
    PlaceholderChecksum { package: String, value: String },

    /// Downloaded content does not hash to the declared value
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Source archive could not be downloaded (network error, 404, ...)
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// The external build system's configure step failed
    #[error("Configure step failed: {message}\n{output}")]
    ConfigurationError { message: String, output: String },

    /// The external build system's build/install step failed
    #[error("Build step failed: {message}\n{output}")]
    BuildError { message: String, output: String },

    /// A declared dependency is not present
    #[error("Missing {kind} dependencies: {}", names.join(", "))]
    MissingDependency { kind: String, names: Vec<String> },

    /// Checksum string is malformed or uses an unknown algorithm
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    /// Formula file could not be parsed or failed validation
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem error with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Plain I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlaceholderChecksum { .. } => "placeholder-checksum",
            Self::ChecksumMismatch { .. } => "checksum-mismatch",
            Self::FetchError(_) => "fetch",
            Self::ConfigurationError { .. } => "configure",
            Self::BuildError { .. } => "build",
            Self::MissingDependency { .. } => "missing-dependency",
            Self::InvalidChecksum(_) => "invalid-checksum",
            Self::ParseError(_) => "parse",
            Self::IoError(_) | Self::Io(_) => "io",
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Advisory problems surfaced after installation completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Copying plugin modules into the library directory failed
    Relocation(String),
    /// The post-install smoke test did not pass
    SmokeTest(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relocation(msg) => write!(f, "plugin relocation: {msg}"),
            Self::SmokeTest(msg) => write!(f, "smoke test: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_message() {
        let err = Error::MissingDependency {
            kind: "build".to_string(),
            names: vec!["cmake".to_string(), "ninja".to_string()],
        };
        assert_eq!(err.to_string(), "Missing build dependencies: cmake, ninja");
        assert_eq!(err.kind(), "missing-dependency");
    }

    #[test]
    fn test_configuration_error_carries_output() {
        let err = Error::ConfigurationError {
            message: "cmake exited with status 1".to_string(),
            output: "CMake Error: could not find FFTW".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exited with status 1"));
        assert!(msg.contains("could not find FFTW"));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::SmokeTest("libsddc not found".to_string());
        assert_eq!(w.to_string(), "smoke test: libsddc not found");
    }
}
