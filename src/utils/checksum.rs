use anyhow::{anyhow, Context, Result};
use md5::Md5;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Determine the algorithm from the length of a hex digest
    pub fn from_digest(digest: &str) -> Result<Self> {
        match digest.trim().len() {
            32 => Ok(Self::Md5),
            64 => Ok(Self::Sha256),
            128 => Ok(Self::Sha512),
            other => Err(anyhow!(
                "Cannot determine checksum algorithm from length: {}",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ChecksumVerifier;

impl ChecksumVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Compare a file's digest with `expected`, case-insensitively
    pub fn verify_file(&self, file_path: &Path, expected: &str) -> Result<()> {
        let expected = expected.trim();
        let algorithm = ChecksumAlgorithm::from_digest(expected)?;
        info!("Verifying {} checksum for: {}", algorithm, file_path.display());

        let calculated = self.calculate_checksum(file_path, algorithm)?;

        if calculated.eq_ignore_ascii_case(expected) {
            info!("The checksum has been matched, proceeding.");
            Ok(())
        } else {
            Err(ValidationError::ChecksumMismatch {
                expected: expected.to_string(),
                calculated,
            }
            .into())
        }
    }

    pub fn calculate_checksum(&self, file_path: &Path, algorithm: ChecksumAlgorithm) -> Result<String> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;
        let reader = BufReader::new(file);

        debug!("Hashing {} with {}", file_path.display(), algorithm);
        match algorithm {
            ChecksumAlgorithm::Md5 => digest_reader::<Md5, _>(reader),
            ChecksumAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
            ChecksumAlgorithm::Sha512 => digest_reader::<Sha512, _>(reader),
        }
    }

    /// Write `<file>.<algorithm>` next to the file in `sha256sum` format
    pub fn generate_checksum_file(
        &self,
        file_path: &Path,
        checksum: &str,
        algorithm: ChecksumAlgorithm,
    ) -> Result<PathBuf> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| anyhow!("Not a file path: {}", file_path.display()))?
            .to_string_lossy();
        let checksum_path = file_path.with_file_name(format!("{}.{}", file_name, algorithm));

        std::fs::write(&checksum_path, format!("{}  {}\n", checksum, file_name)).with_context(|| {
            format!("Failed to write checksum file: {}", checksum_path.display())
        })?;

        info!("Generated checksum file: {}", checksum_path.display());
        Ok(checksum_path)
    }
}

impl Default for ChecksumVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0; 8192]; // 8KB buffer
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .context("Failed to read file data")?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
