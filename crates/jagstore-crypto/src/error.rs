//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key size
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Key dump could not be parsed
    #[error("Key dump parse error: {0}")]
    KeyDump(#[from] serde_json::Error),

    /// Region coordinates out of range
    #[error("Region coordinates out of range: ({x}, {y})")]
    InvalidRegion {
        /// Region x coordinate
        x: u32,
        /// Region y coordinate
        y: u32,
    },
}
