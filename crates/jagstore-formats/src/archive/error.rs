//! Error types for archive operations

use thiserror::Error;

use crate::compression::CompressionError;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while encoding or decoding an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Header or entry table could not be parsed
    #[error("malformed archive framing: {0}")]
    Framing(#[from] binrw::Error),

    /// Layout byte not recognized
    #[error("unknown archive layout: {0}")]
    UnknownLayout(u8),

    /// Layout and algorithm bytes disagree
    #[error("layout {layout} cannot use compression algorithm {algorithm}")]
    AlgorithmMismatch {
        /// Layout byte
        layout: u8,
        /// Algorithm byte
        algorithm: u8,
    },

    /// Stored body length disagrees with the bytes present
    #[error("archive body length mismatch: header says {declared} bytes, found {actual}")]
    BodyLength {
        /// Length from the header
        declared: usize,
        /// Bytes actually following the header
        actual: usize,
    },

    /// Two entries share an identifier
    #[error("duplicate archive entry id {0}")]
    DuplicateEntry(i32),

    /// An uncompressed entry records different stored and raw lengths
    #[error("entry {id} stored length {stored} differs from length {uncompressed}")]
    EntryLength {
        /// Entry identifier
        id: i32,
        /// Stored length
        stored: u32,
        /// Uncompressed length
        uncompressed: u32,
    },

    /// Entry table lengths disagree with the payload region
    #[error("payload region is {actual} bytes, entry table describes {declared}")]
    PayloadLength {
        /// Sum of the table's stored lengths
        declared: u64,
        /// Bytes present after the table
        actual: u64,
    },

    /// Entry payload could not be decompressed
    #[error("entry {id}: {source}")]
    EntryStream {
        /// Entry identifier
        id: i32,
        /// Underlying error
        #[source]
        source: CompressionError,
    },

    /// Whole-archive stream or algorithm byte could not be handled
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// Too many entries for the 16-bit count
    #[error("archive holds {0} entries, at most 65535 can be encoded")]
    TooManyEntries(usize),

    /// Value too large for its 32-bit field
    #[error("{what} of {len} bytes does not fit a 32-bit length")]
    TooLarge {
        /// What was being encoded
        what: &'static str,
        /// Offending length
        len: usize,
    },
}

impl ArchiveError {
    /// Whether the failure came from a compressed stream rather than the
    /// archive framing
    pub fn is_stream_error(&self) -> bool {
        match self {
            Self::EntryStream { source, .. } | Self::Compression(source) => {
                source.is_corrupt_stream()
            }
            _ => false,
        }
    }

    /// Entry implicated by the failure, if any
    pub fn entry(&self) -> Option<i32> {
        match self {
            Self::DuplicateEntry(id)
            | Self::EntryStream { id, .. }
            | Self::EntryLength { id, .. } => Some(*id),
            _ => None,
        }
    }
}
