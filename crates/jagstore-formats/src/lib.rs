//! Binary codecs for jagstore caches
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::struct_excessive_bools)] // Definitions mirror on-disk flags
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate turns the raw bytes the sector store hands out into typed values
//! and back. Every codec is symmetric where the cache format allows it.
//!
//! # Supported Formats
//!
//! - **Compression**: gzip, bzip2 (headerless) and lzma streams selected per archive
//! - **Archive**: a compressed table of id-addressed entries, the unit of storage
//! - **CRC lists**: per-index checksum tables stored in the `versionlist` archive
//! - **Reference tables**: the modern generation's archive name/CRC/version table
//! - **Definitions**: opcode-tagged entity records (NPCs, objects, locations, ...)
//!
//! # Example
//!
//! ```
//! use jagstore_formats::archive::{Archive, CompressionType};
//! use jagstore_formats::compression::Algorithm;
//!
//! let mut archive = Archive::new();
//! archive.insert(0, b"first".to_vec());
//! archive.insert_named("npc.dat", b"second".to_vec());
//!
//! let bytes = archive.encode(CompressionType::Whole, Algorithm::Gzip).unwrap();
//! let decoded = Archive::decode(&bytes).unwrap();
//! assert_eq!(decoded, archive);
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod compression;
pub mod crc_list;
pub mod definition;
pub mod ioutils;
pub mod reference;

pub use archive::{Archive, ArchiveEntry, ArchiveError, CompressionType};
pub use compression::{Algorithm, CompressionError};
pub use crc_list::{CrcList, IndexType};
pub use definition::{
    DecodeError, DecoderOptions, Definition, DefinitionKind, UnknownOpcodePolicy,
};
pub use reference::ReferenceTable;
