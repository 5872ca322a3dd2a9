//! Archive framing structures

use binrw::{BinRead, BinWrite};

/// Bytes at the start of an archive that are never encrypted
pub const PLAIN_HEADER_LEN: usize = 6;

/// Layout byte value for whole-archive compression
pub const LAYOUT_WHOLE: u8 = 1;

/// Archive header
///
/// The first [`PLAIN_HEADER_LEN`] bytes are always plaintext; `raw_len`
/// only exists for whole-archive compression and is covered by
/// encryption when the archive is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct ArchiveHeader {
    /// Layout byte, see [`super::CompressionType`]
    pub layout: u8,

    /// Algorithm byte, see [`crate::compression::Algorithm`]
    pub algorithm: u8,

    /// Stored body length in bytes
    pub body_len: u32,

    /// Decompressed body length (whole-archive layout only)
    #[br(if(layout == LAYOUT_WHOLE))]
    #[bw(if(*layout == LAYOUT_WHOLE))]
    pub raw_len: Option<u32>,
}

impl ArchiveHeader {
    /// Encoded size of this header
    pub fn size(&self) -> usize {
        PLAIN_HEADER_LEN + if self.raw_len.is_some() { 4 } else { 0 }
    }
}

/// Per-entry record in the archive body's entry table
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct EntryRecord {
    /// Entry identifier
    pub id: i32,

    /// Payload length after decompression
    pub uncompressed_len: u32,

    /// Payload length as stored
    pub stored_len: u32,
}

/// Size of one [`EntryRecord`]
pub const ENTRY_RECORD_LEN: usize = 12;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::BinReaderExt;
    use std::io::Cursor;

    #[test]
    fn test_whole_header_has_raw_len() {
        let header = ArchiveHeader {
            layout: LAYOUT_WHOLE,
            algorithm: 2,
            body_len: 0x0102_0304,
            raw_len: Some(0x0A0B_0C0D),
        };
        let mut cursor = Cursor::new(Vec::new());
        header.write(&mut cursor).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes, [1, 2, 1, 2, 3, 4, 0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(header.size(), bytes.len());

        let parsed: ArchiveHeader = Cursor::new(&bytes).read_be().unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_plain_header_is_six_bytes() {
        let bytes = [0u8, 0, 0, 0, 0, 9];
        let parsed: ArchiveHeader = Cursor::new(&bytes).read_be().unwrap();
        assert_eq!(parsed.body_len, 9);
        assert_eq!(parsed.raw_len, None);
        assert_eq!(parsed.size(), PLAIN_HEADER_LEN);
    }
}
