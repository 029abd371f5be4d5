//! Error types for Shardflow
//!
//! Provides a unified error type for chunking, hashing and data-source reads.

use thiserror::Error;

/// Result type alias for Shardflow operations
pub type Result<T> = std::result::Result<T, ShardflowError>;

/// Unified error type for Shardflow
#[derive(Error, Debug)]
pub enum ShardflowError {
    // ===== Data Source Errors =====
    #[error("Invalid offset: {offset} (padded size: {padded_size})")]
    InvalidOffset { offset: u64, padded_size: u64 },

    #[error("Data is empty")]
    EmptyData,

    // ===== Hashing Errors =====
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid merkle proof: {0}")]
    InvalidProof(String),

    // ===== Executor Errors =====
    #[error("Executor error: {0}")]
    Executor(String),

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
