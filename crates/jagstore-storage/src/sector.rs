//! Sector headers
//!
//! ```text
//! u16 archive_id   (u32 in the extended form)
//! u16 chunk        position of this sector in the chain
//! u24 next_sector  0 on the last sector
//! u8  index_tag
//! ```

use crate::layout::{EXTENDED_HEADER_SIZE, HEADER_SIZE, MAX_U24, SectorLayout};

/// Header at the start of every sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorHeader {
    /// Archive owning the sector
    pub archive: u32,
    /// Position within the archive's chain
    pub chunk: u16,
    /// Following sector, 0 when this is the last
    pub next_sector: u32,
    /// Index tag, see [`SectorLayout::index_tag`]
    pub index_tag: u8,
}

impl SectorHeader {
    /// Parse a header for `archive`
    ///
    /// The header width follows from the archive id the caller expects, the
    /// same way it was chosen when the sector was written. Returns `None`
    /// when `bytes` is shorter than the header.
    pub fn parse(layout: &SectorLayout, archive: u32, bytes: &[u8]) -> Option<Self> {
        if layout.is_extended(archive) {
            let b = bytes.get(..EXTENDED_HEADER_SIZE)?;
            Some(Self {
                archive: u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
                chunk: u16::from_be_bytes([b[4], b[5]]),
                next_sector: u32::from_be_bytes([0, b[6], b[7], b[8]]),
                index_tag: b[9],
            })
        } else {
            let b = bytes.get(..HEADER_SIZE)?;
            Some(Self {
                archive: u32::from(u16::from_be_bytes([b[0], b[1]])),
                chunk: u16::from_be_bytes([b[2], b[3]]),
                next_sector: u32::from_be_bytes([0, b[4], b[5], b[6]]),
                index_tag: b[7],
            })
        }
    }

    /// Append the header to `out`
    ///
    /// The caller guarantees `next_sector` fits 24 bits and that the archive
    /// id fits the chosen width.
    pub fn write(&self, layout: &SectorLayout, out: &mut Vec<u8>) {
        debug_assert!(self.next_sector <= MAX_U24);
        if layout.is_extended(self.archive) {
            out.extend_from_slice(&self.archive.to_be_bytes());
        } else {
            out.extend_from_slice(&(self.archive as u16).to_be_bytes());
        }
        out.extend_from_slice(&self.chunk.to_be_bytes());
        out.extend_from_slice(&self.next_sector.to_be_bytes()[1..]);
        out.push(self.index_tag);
    }

    /// Check the header against the chain being followed
    ///
    /// Returns a description of the first mismatch.
    pub fn validate(&self, archive: u32, chunk: u16, index_tag: u8) -> Result<(), String> {
        if self.archive != archive {
            return Err(format!(
                "chunk {chunk} belongs to archive {}, expected {archive}",
                self.archive
            ));
        }
        if self.chunk != chunk {
            return Err(format!(
                "sector holds chunk {}, expected chunk {chunk}",
                self.chunk
            ));
        }
        if self.index_tag != index_tag {
            return Err(format!(
                "chunk {chunk} carries index tag {}, expected {index_tag}",
                self.index_tag
            ));
        }
        Ok(())
    }
}
