//! CRC list codec for the `versionlist` archive
//!
//! The legacy generation records one CRC-32 per archive of each content
//! index in the `versionlist` archive, under an entry named after the
//! index (`model_crc`, `anim_crc`, ...). An entry is a flat run of
//! big-endian `u32` values with no count or terminator.

use std::fmt;

use thiserror::Error;

use crate::archive::{Archive, ArchiveEntry};

/// Store index of the `versionlist` archive
pub const VERSIONLIST_INDEX: u8 = 0;

/// Archive id of the `versionlist` archive within its index
pub const VERSIONLIST_ARCHIVE: u32 = 5;

/// Errors raised by the CRC list codec
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// The versionlist archive has no entry for this index type
    #[error("versionlist has no {0} entry")]
    MissingEntry(IndexType),

    /// Entry length is not a whole number of CRCs
    #[error("{index_type} entry is {len} bytes, not a multiple of 4")]
    Misaligned {
        /// Index type whose entry is malformed
        index_type: IndexType,
        /// Entry length
        len: usize,
    },
}

/// Content indices that carry a CRC list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexType {
    /// 3D models
    Model,
    /// Animation frames
    Anim,
    /// Music tracks
    Midi,
    /// Map terrain and locations
    Map,
}

impl IndexType {
    /// Every index type in store order
    pub const ALL: [Self; 4] = [Self::Model, Self::Anim, Self::Midi, Self::Map];

    /// Legacy store index holding this content
    pub const fn store_index(self) -> u8 {
        match self {
            Self::Model => 1,
            Self::Anim => 2,
            Self::Midi => 3,
            Self::Map => 4,
        }
    }

    /// Index type stored at a legacy store index
    pub const fn from_store_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Model),
            2 => Some(Self::Anim),
            3 => Some(Self::Midi),
            4 => Some(Self::Map),
            _ => None,
        }
    }

    /// Short name used in versionlist entry names
    pub const fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Anim => "anim",
            Self::Midi => "midi",
            Self::Map => "map",
        }
    }

    /// Name of the versionlist entry holding this index's CRCs
    pub fn crc_entry_name(self) -> String {
        format!("{}_crc", self.name())
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CRCs for every archive of one index, in archive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcList {
    /// Index the CRCs belong to
    pub index_type: IndexType,
    /// One CRC per archive
    pub crcs: Vec<u32>,
}

impl CrcList {
    /// Create a list
    pub fn new(index_type: IndexType, crcs: Vec<u32>) -> Self {
        Self { index_type, crcs }
    }

    /// CRC recorded for an archive
    pub fn get(&self, archive: u32) -> Option<u32> {
        self.crcs.get(archive as usize).copied()
    }

    /// Decode one entry payload
    pub fn from_payload(index_type: IndexType, payload: &[u8]) -> Result<Self, ChecksumError> {
        if payload.len() % 4 != 0 {
            return Err(ChecksumError::Misaligned {
                index_type,
                len: payload.len(),
            });
        }
        let crcs = payload
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self::new(index_type, crcs))
    }

    /// Encode as one entry payload
    pub fn to_payload(&self) -> Vec<u8> {
        self.crcs.iter().flat_map(|crc| crc.to_be_bytes()).collect()
    }

    /// Encode as a versionlist entry
    pub fn to_entry(&self) -> ArchiveEntry {
        ArchiveEntry::named(&self.index_type.crc_entry_name(), self.to_payload())
    }
}

/// Read the CRC lists for `index_types` from a decoded versionlist archive
pub fn decode(
    versionlist: &Archive,
    index_types: &[IndexType],
) -> Result<Vec<CrcList>, ChecksumError> {
    index_types
        .iter()
        .map(|&index_type| {
            let payload = versionlist
                .get_named(&index_type.crc_entry_name())
                .ok_or(ChecksumError::MissingEntry(index_type))?;
            CrcList::from_payload(index_type, payload)
        })
        .collect()
}

/// Build versionlist entries for `lists`
pub fn encode(lists: &[CrcList]) -> Vec<ArchiveEntry> {
    lists.iter().map(CrcList::to_entry).collect()
}
