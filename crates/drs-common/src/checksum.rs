//! Checksum utilities for payload and blob verification
//!
//! Downstream pipelines record a checksum of the content they processed
//! alongside the processed timestamp; these helpers produce those values.

use crate::error::{DrsError, Result};
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::io::Read;
use std::path::Path;

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            let mut buffer = [0u8; 8192];

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }

            Ok(hex::encode(hasher.finalize()))
        },
        ChecksumAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            let mut buffer = [0u8; 8192];

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }

            Ok(hex::encode(hasher.finalize()))
        },
    }
}

/// Compute checksum for an in-memory payload
pub fn compute_payload_checksum(payload: &str, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut cursor = std::io::Cursor::new(payload.as_bytes());
    compute_checksum(&mut cursor, algorithm)
}

/// Verify checksum for a file
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<bool> {
    let actual = compute_file_checksum(path, algorithm)?;
    if actual == expected {
        Ok(true)
    } else {
        Err(DrsError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
