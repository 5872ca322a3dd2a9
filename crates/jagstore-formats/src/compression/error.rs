//! Compression error types

use thiserror::Error;

use super::Algorithm;

/// Compression result type
pub type CompressionResult<T> = Result<T, CompressionError>;

/// Errors raised by the compression codec
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Algorithm byte not recognized
    #[error("unknown compression algorithm: {0}")]
    UnknownAlgorithm(u8),

    /// Compressed stream is malformed
    #[error("corrupt {algorithm} stream: {reason}")]
    CorruptStream {
        /// Algorithm the stream was decoded with
        algorithm: Algorithm,
        /// Decoder diagnostic
        reason: String,
    },

    /// Stream decoded to a different length than recorded
    #[error("{algorithm} stream length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Algorithm the stream was decoded with
        algorithm: Algorithm,
        /// Length recorded alongside the stream
        expected: usize,
        /// Length produced, capped at `expected + 1`
        actual: usize,
    },

    /// Encoder failed
    #[error("{algorithm} compression failed: {source}")]
    Compress {
        /// Algorithm being encoded
        algorithm: Algorithm,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CompressionError {
    /// Whether the error describes a bad compressed stream
    pub fn is_corrupt_stream(&self) -> bool {
        matches!(
            self,
            Self::CorruptStream { .. } | Self::LengthMismatch { .. }
        )
    }
}
