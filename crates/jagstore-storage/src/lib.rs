//! Sector file store for jagstore caches.
//!
//! This crate persists archives as chains of fixed-size sectors inside one
//! data file, located through per-index pointer files. Two generations of
//! the on-disk layout are supported and share one chain walker:
//!
//! - **Legacy**: `main_file_cache.dat` with five index files and a fixed
//!   name table for the archives of index 0
//! - **Modern**: `main_file_cache.dat2` with up to 255 index files and a
//!   master index holding a reference (name) table per index
//!
//! On top of the raw store sits the crypto-aware loader: it decrypts map
//! location archives with their XTEA key, verifies checksums, decodes the
//! archive and memoizes the result for the lifetime of the [`Store`].
//!
//! # Example
//!
//! ```rust,no_run
//! use jagstore_formats::definition::NpcDefinition;
//! use jagstore_storage::{Store, StoreConfig};
//!
//! # fn example() -> jagstore_storage::Result<()> {
//! let store = Store::open(StoreConfig::new("/path/to/cache"))?;
//! if let Some(npc) = store.definition::<NpcDefinition>(0)? {
//!     println!("npc 0 is {}", npc.name);
//! }
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;

use jagstore_formats::archive::ArchiveError;
use jagstore_formats::crc_list::ChecksumError;
use jagstore_formats::definition::{DecodeError, DefinitionKind};
use jagstore_formats::reference::ReferenceError;
use thiserror::Error;

// Configuration
pub mod config;

// Generation geometry
pub mod layout;

// Sector headers
pub mod sector;

// Index pointer files
pub mod index;

// Positioned file I/O
mod positioned;

// Raw sector store
pub mod store;

// Crypto-aware archive loading and typed lookups
pub mod loader;

pub use config::{AccessMode, LengthPolicy, StoreConfig};
pub use layout::{Generation, SectorLayout};
pub use store::{ArchiveRef, Store};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing files are missing or malformed; the store cannot be used.
    #[error("invalid store at {}: {reason}", path.display())]
    InvalidStore {
        /// Path that was opened
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// The index has no archive with this id.
    #[error("archive {archive} not found in index {index}")]
    NotFound {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
    },

    /// The index has no archive with this name.
    #[error("no archive named {name:?} in index {index}")]
    NameNotFound {
        /// Index id
        index: u8,
        /// Name that was looked up
        name: String,
    },

    /// The sector chain ended before the declared length.
    #[error("archive {index}/{archive} truncated: expected {expected} bytes, read {actual}")]
    TruncatedArchive {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Length from the index entry
        expected: u32,
        /// Bytes recovered from the chain
        actual: u32,
    },

    /// Sector chain, archive framing or checksum is inconsistent.
    #[error("archive {index}/{archive} is corrupt: {source}")]
    CorruptArchive {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// What was found
        #[source]
        source: Corruption,
    },

    /// A compressed stream inside the archive could not be inflated.
    #[error("archive {index}/{archive} has a corrupt stream: {source}")]
    CorruptStream {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Entry whose payload failed, when the layout is per-entry
        entry: Option<i32>,
        /// Underlying codec error
        #[source]
        source: ArchiveError,
    },

    /// The archive is encrypted and no key was supplied.
    #[error("archive {index}/{archive} is encrypted and no key was supplied")]
    MissingKey {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
    },

    /// A definition record carries an opcode its family does not know.
    #[error("archive {index}/{archive} entry {entry}: unknown {kind} opcode {opcode}")]
    UnknownOpcode {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Definition id
        entry: u32,
        /// Offending opcode
        opcode: u8,
        /// Entity family being decoded
        kind: DefinitionKind,
    },

    /// A definition record could not be decoded for another reason.
    #[error("archive {index}/{archive} entry {entry}: {source}")]
    MalformedDefinition {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Definition id
        entry: u32,
        /// Underlying decoder error
        #[source]
        source: DecodeError,
    },

    /// The archive could not be encoded for writing.
    #[error("archive {index}/{archive} could not be encoded: {source}")]
    Encode {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Underlying codec error
        #[source]
        source: ArchiveError,
    },

    /// The archive cannot be written with this store's geometry.
    #[error("archive {index}/{archive} cannot be written: {reason}")]
    Unwritable {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Limit that was exceeded
        reason: String,
    },

    /// The store was opened read-only.
    #[error("store is opened read-only")]
    ReadOnly,

    /// I/O failed while reading or writing one archive.
    #[error("I/O error on archive {index}/{archive}: {source}")]
    ArchiveIo {
        /// Index id
        index: u8,
        /// Archive id
        archive: u32,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Inconsistency found while reading an archive
#[derive(Debug, Error)]
pub enum Corruption {
    /// A sector header disagrees with the chain being followed
    #[error("sector chain: {0}")]
    Chain(String),

    /// The archive framing could not be decoded
    #[error(transparent)]
    Framing(ArchiveError),

    /// Stored bytes disagree with the reference table
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Stored bytes disagree with the versionlist CRC
    #[error("versionlist CRC mismatch: recorded {expected:08x}, computed {actual:08x}")]
    Crc {
        /// Recorded CRC
        expected: u32,
        /// CRC of the stored bytes
        actual: u32,
    },

    /// The versionlist archive is malformed
    #[error(transparent)]
    CrcList(#[from] ChecksumError),
}

impl StorageError {
    /// Whether the store as a whole is unusable
    ///
    /// Callers should not retry without fixing the path or the files.
    pub fn is_fatal_for_store(&self) -> bool {
        matches!(self, Self::InvalidStore { .. })
    }

    /// Whether only one archive is affected and others may still be read
    pub fn is_per_archive(&self) -> bool {
        self.location().is_some() || matches!(self, Self::NameNotFound { .. })
    }

    /// Index and archive implicated by the failure, if any
    pub fn location(&self) -> Option<(u8, u32)> {
        match self {
            Self::NotFound { index, archive }
            | Self::TruncatedArchive { index, archive, .. }
            | Self::CorruptArchive { index, archive, .. }
            | Self::CorruptStream { index, archive, .. }
            | Self::MissingKey { index, archive }
            | Self::UnknownOpcode { index, archive, .. }
            | Self::MalformedDefinition { index, archive, .. }
            | Self::Encode { index, archive, .. }
            | Self::Unwritable { index, archive, .. }
            | Self::ArchiveIo { index, archive, .. } => Some((*index, *archive)),
            _ => None,
        }
    }

    /// Entry implicated by the failure, if any
    pub fn entry(&self) -> Option<i64> {
        match self {
            Self::UnknownOpcode { entry, .. } | Self::MalformedDefinition { entry, .. } => {
                Some(i64::from(*entry))
            }
            Self::CorruptStream { entry, .. } => entry.map(i64::from),
            Self::CorruptArchive {
                source: Corruption::Framing(source),
                ..
            } => source.entry().map(i64::from),
            _ => None,
        }
    }

    /// Wrap an archive decode failure for `(index, archive)`
    pub(crate) fn from_archive(index: u8, archive: u32, source: ArchiveError) -> Self {
        if source.is_stream_error() {
            Self::CorruptStream {
                index,
                archive,
                entry: source.entry(),
                source,
            }
        } else {
            Self::CorruptArchive {
                index,
                archive,
                source: Corruption::Framing(source),
            }
        }
    }

    /// Wrap a definition decode failure for `(index, archive, entry)`
    pub(crate) fn from_decode(index: u8, archive: u32, entry: u32, source: DecodeError) -> Self {
        match source {
            DecodeError::UnknownOpcode { opcode, kind, .. } => Self::UnknownOpcode {
                index,
                archive,
                entry,
                opcode,
                kind,
            },
            source => Self::MalformedDefinition {
                index,
                archive,
                entry,
                source,
            },
        }
    }

    pub(crate) fn corrupt(index: u8, archive: u32, source: impl Into<Corruption>) -> Self {
        Self::CorruptArchive {
            index,
            archive,
            source: source.into(),
        }
    }
}

/// Version information for the storage crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let invalid = StorageError::InvalidStore {
            path: PathBuf::from("/nowhere"),
            reason: "missing".into(),
        };
        assert!(invalid.is_fatal_for_store());
        assert!(!invalid.is_per_archive());

        let missing = StorageError::MissingKey {
            index: 5,
            archive: 12,
        };
        assert!(!missing.is_fatal_for_store());
        assert_eq!(missing.location(), Some((5, 12)));
        assert!(!StorageError::ReadOnly.is_per_archive());
    }

    #[test]
    fn test_decode_errors_keep_opcode_and_entry() {
        let err = StorageError::from_decode(
            2,
            9,
            7,
            DecodeError::UnknownOpcode {
                opcode: 201,
                kind: DefinitionKind::Npc,
                id: 7,
                offset: 3,
            },
        );
        assert!(matches!(
            err,
            StorageError::UnknownOpcode {
                opcode: 201,
                kind: DefinitionKind::Npc,
                ..
            }
        ));
        assert_eq!(err.entry(), Some(7));
        assert!(err.to_string().contains("201"));
    }

    #[test]
    fn test_duplicate_entry_is_framing_corruption() {
        let err = StorageError::from_archive(1, 4, ArchiveError::DuplicateEntry(3));
        assert!(matches!(err, StorageError::CorruptArchive { .. }));
        assert_eq!(err.entry(), Some(3));
    }
}
