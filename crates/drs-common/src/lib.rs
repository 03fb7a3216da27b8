//! DRS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the DRS project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all DRS workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: Content integrity utilities for downstream pipelines
//! - **Logging**: Centralized tracing initialization
//!
//! # Example
//!
//! ```no_run
//! use drs_common::{Result, DrsError};
//! use drs_common::checksum::compute_file_checksum;
//! use drs_common::types::ChecksumAlgorithm;
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let checksum = compute_file_checksum(path, ChecksumAlgorithm::Sha256)?;
//!     println!("File checksum: {}", checksum);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DrsError, Result};
