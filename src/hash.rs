// src/hash.rs

//! Checksums for source archive verification
//!
//! Formulas declare the digest of their source archive either bare
//! (`"3f5a..."`, taken as SHA-256) or prefixed (`"sha256:3f5a..."`).
//! Archives are hashed while streaming so large tarballs never sit in memory.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256, the digest formulas declare by default
    #[default]
    Sha256,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Digest length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(Error::InvalidChecksum(format!(
                "unsupported algorithm '{}' (supported: sha256, sha512)",
                s
            ))),
        }
    }
}

/// A digest value with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest
    pub value: String,
}

impl Hash {
    /// Create a hash value, validating length and hex characters
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Result<Self> {
        let value = value.into();

        if value.len() != algorithm.hex_len() {
            return Err(Error::InvalidChecksum(format!(
                "{} digest must be {} hex characters, got {}",
                algorithm,
                algorithm.hex_len(),
                value.len()
            )));
        }

        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidChecksum(format!(
                "digest contains non-hex characters: {}",
                value
            )));
        }

        Ok(Self {
            algorithm,
            value: value.to_lowercase(),
        })
    }

    /// Parse a bare (SHA-256) or prefixed (`sha512:...`) digest
    pub fn parse_prefixed(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((algo, hash)) => Self::new(algo.parse()?, hash),
            None => Self::new(HashAlgorithm::Sha256, s),
        }
    }

    /// Format as a prefixed string (e.g. "sha256:abc123...")
    pub fn to_prefixed_string(&self) -> String {
        format!("{}:{}", self.algorithm.name(), self.value)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Incremental hasher over any supported algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: HasherState,
}

enum HasherState {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        Self { algorithm, state }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(hasher) => hasher.update(data),
            HasherState::Sha512(hasher) => hasher.update(data),
        }
    }

    pub fn finalize(self) -> Hash {
        let value = match self.state {
            HasherState::Sha256(hasher) => hex::encode(hasher.finalize()),
            HasherState::Sha512(hasher) => hex::encode(hasher.finalize()),
        };
        Hash {
            algorithm: self.algorithm,
            value,
        }
    }
}

/// Compute the hash of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Hash {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Compute the hash of everything a reader yields
pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, reader: &mut R) -> io::Result<Hash> {
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Hash a file on disk
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<Hash> {
    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok(hash_reader(algorithm, &mut file)?)
}

/// Verify a file against an expected digest
///
/// Returns `Error::ChecksumMismatch` carrying both digests on mismatch.
pub fn verify_file(path: &Path, expected: &Hash) -> Result<()> {
    let actual = hash_file(path, expected.algorithm)?;
    if actual.value == expected.value {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.to_prefixed_string(),
            actual: actual.to_prefixed_string(),
        })
    }
}
