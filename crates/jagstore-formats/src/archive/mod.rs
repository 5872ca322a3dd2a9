//! Archive codec
//!
//! An archive is a set of byte payloads addressed by 32-bit identifiers and
//! serialized as one blob, the unit the sector store persists. Identifiers
//! are either small sequential integers (definition ids) or
//! [`entry_name_hash`] values of entry names such as `npc.dat`.
//!
//! # Layout
//!
//! All integers are big-endian.
//!
//! ```text
//! u8  layout      0 = uncompressed, 1 = whole-archive, 2 = per-entry
//! u8  algorithm   0 none | 1 bzip2 | 2 gzip | 3 lzma
//! u32 body_len
//! u32 raw_len     whole-archive only
//! body:
//!   u16 entry_count
//!   entry_count x { i32 id, u32 uncompressed_len, u32 stored_len }
//!   payloads in table order
//! ```

mod error;
pub mod header;

pub use error::{ArchiveError, ArchiveResult};
pub use header::{ArchiveHeader, EntryRecord, PLAIN_HEADER_LEN};

use std::collections::HashSet;
use std::io::Cursor;

use binrw::{BinReaderExt, BinWrite, BinWriterExt};
use jagstore_crypto::entry_name_hash;

use crate::compression::{self, Algorithm};
use crate::ioutils::ReadInt;
use header::{ENTRY_RECORD_LEN, LAYOUT_WHOLE};

/// How an archive's body is compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Stored as-is
    #[default]
    Uncompressed = 0,
    /// The whole body is one compressed stream
    Whole = LAYOUT_WHOLE,
    /// Each entry payload is compressed on its own
    PerEntry = 2,
}

impl CompressionType {
    /// Every layout in header-byte order
    pub const ALL: [Self; 3] = [Self::Uncompressed, Self::Whole, Self::PerEntry];

    /// Parse from the header layout byte
    pub fn from_byte(byte: u8) -> ArchiveResult<Self> {
        match byte {
            0 => Ok(Self::Uncompressed),
            1 => Ok(Self::Whole),
            2 => Ok(Self::PerEntry),
            other => Err(ArchiveError::UnknownLayout(other)),
        }
    }

    /// Header layout byte
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One identified payload inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry identifier
    pub id: i32,
    /// Uncompressed payload
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Create an entry
    pub fn new(id: i32, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Create an entry addressed by name
    pub fn named(name: &str, data: Vec<u8>) -> Self {
        Self::new(entry_name_hash(name), data)
    }
}

/// A decoded archive
///
/// Entry order is kept for deterministic encoding only. Equality ignores
/// it.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, failing on duplicate identifiers
    pub fn from_entries(entries: Vec<ArchiveEntry>) -> ArchiveResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(ArchiveError::DuplicateEntry(entry.id));
            }
        }
        Ok(Self { entries })
    }

    /// Insert or replace an entry, returning the replaced payload
    pub fn insert(&mut self, id: i32, data: Vec<u8>) -> Option<Vec<u8>> {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => Some(std::mem::replace(&mut existing.data, data)),
            None => {
                self.entries.push(ArchiveEntry::new(id, data));
                None
            }
        }
    }

    /// Insert or replace an entry addressed by name
    pub fn insert_named(&mut self, name: &str, data: Vec<u8>) -> Option<Vec<u8>> {
        self.insert(entry_name_hash(name), data)
    }

    /// Remove an entry
    pub fn remove(&mut self, id: i32) -> Option<Vec<u8>> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos).data)
    }

    /// Payload of an entry
    pub fn get(&self, id: i32) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.data.as_slice())
    }

    /// Payload of an entry addressed by name
    pub fn get_named(&self, name: &str) -> Option<&[u8]> {
        self.get(entry_name_hash(name))
    }

    /// Whether an entry exists
    pub fn contains(&self, id: i32) -> bool {
        self.get(id).is_some()
    }

    /// Entries in encoding order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Iterate over entries in encoding order
    pub fn iter(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode an archive from its raw (decrypted) bytes
    pub fn decode(raw: &[u8]) -> ArchiveResult<Self> {
        let mut cursor = Cursor::new(raw);
        let header: ArchiveHeader = cursor.read_be()?;
        let layout = CompressionType::from_byte(header.layout)?;
        let algorithm = Algorithm::from_byte(header.algorithm)?;
        check_algorithm(layout, algorithm)?;

        let body = &raw[header.size()..];
        let declared = header.body_len as usize;
        if body.len() != declared {
            return Err(ArchiveError::BodyLength {
                declared,
                actual: body.len(),
            });
        }

        match header.raw_len {
            Some(raw_len) => {
                let body = compression::decompress(algorithm, body, raw_len as usize)?;
                decode_body(&body, layout, algorithm)
            }
            None => decode_body(body, layout, algorithm),
        }
    }

    /// Encode with the given layout and algorithm
    ///
    /// `algorithm` is ignored for [`CompressionType::Uncompressed`]; for the
    /// other layouts [`Algorithm::None`] is rejected.
    pub fn encode(&self, layout: CompressionType, algorithm: Algorithm) -> ArchiveResult<Vec<u8>> {
        let algorithm = match layout {
            CompressionType::Uncompressed => Algorithm::None,
            _ => algorithm,
        };
        check_algorithm(layout, algorithm)?;

        let count = u16::try_from(self.entries.len())
            .map_err(|_| ArchiveError::TooManyEntries(self.entries.len()))?;

        let mut records = Vec::with_capacity(self.entries.len());
        let mut payloads = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let stored = match layout {
                CompressionType::PerEntry => {
                    compression::compress(algorithm, &entry.data).map_err(|source| {
                        ArchiveError::EntryStream {
                            id: entry.id,
                            source,
                        }
                    })?
                }
                _ => entry.data.clone(),
            };
            records.push(EntryRecord {
                id: entry.id,
                uncompressed_len: to_u32("entry payload", entry.data.len())?,
                stored_len: to_u32("stored entry payload", stored.len())?,
            });
            payloads.push(stored);
        }

        let mut body = Cursor::new(Vec::new());
        body.write_be(&count)?;
        body.write_be(&records)?;
        let mut body = body.into_inner();
        for payload in payloads {
            body.extend_from_slice(&payload);
        }

        let (body, raw_len) = match layout {
            CompressionType::Whole => {
                let raw_len = to_u32("archive body", body.len())?;
                (compression::compress(algorithm, &body)?, Some(raw_len))
            }
            _ => (body, None),
        };

        let header = ArchiveHeader {
            layout: layout.as_byte(),
            algorithm: algorithm.as_byte(),
            body_len: to_u32("stored archive body", body.len())?,
            raw_len,
        };
        let mut out = Cursor::new(Vec::with_capacity(header.size() + body.len()));
        header.write(&mut out)?;
        let mut out = out.into_inner();
        out.extend_from_slice(&body);
        Ok(out)
    }
}

impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|e| other.get(e.id) == Some(e.data.as_slice()))
    }
}

impl Eq for Archive {}

impl FromIterator<ArchiveEntry> for Archive {
    /// Later entries replace earlier ones with the same id
    fn from_iter<I: IntoIterator<Item = ArchiveEntry>>(iter: I) -> Self {
        let mut archive = Self::new();
        for entry in iter {
            archive.insert(entry.id, entry.data);
        }
        archive
    }
}

fn check_algorithm(layout: CompressionType, algorithm: Algorithm) -> ArchiveResult<()> {
    let uncompressed = layout == CompressionType::Uncompressed;
    if uncompressed != (algorithm == Algorithm::None) {
        return Err(ArchiveError::AlgorithmMismatch {
            layout: layout.as_byte(),
            algorithm: algorithm.as_byte(),
        });
    }
    Ok(())
}

fn to_u32(what: &'static str, len: usize) -> ArchiveResult<u32> {
    u32::try_from(len).map_err(|_| ArchiveError::TooLarge { what, len })
}

fn decode_body(body: &[u8], layout: CompressionType, algorithm: Algorithm) -> ArchiveResult<Archive> {
    let mut cursor = Cursor::new(body);
    let count = cursor.read_u16be().map_err(binrw::Error::Io)?;
    let records: Vec<EntryRecord> = (0..count)
        .map(|_| cursor.read_be())
        .collect::<Result<_, _>>()?;

    let payload_start = 2 + usize::from(count) * ENTRY_RECORD_LEN;
    let declared: u64 = records.iter().map(|r| u64::from(r.stored_len)).sum();
    let actual = (body.len() - payload_start) as u64;
    if declared != actual {
        return Err(ArchiveError::PayloadLength { declared, actual });
    }

    let mut seen = HashSet::with_capacity(records.len());
    let mut entries = Vec::with_capacity(records.len());
    let mut offset = payload_start;
    for record in records {
        if !seen.insert(record.id) {
            return Err(ArchiveError::DuplicateEntry(record.id));
        }
        let stored = &body[offset..offset + record.stored_len as usize];
        offset += stored.len();

        let data = match layout {
            CompressionType::PerEntry => {
                compression::decompress(algorithm, stored, record.uncompressed_len as usize)
                    .map_err(|source| ArchiveError::EntryStream {
                        id: record.id,
                        source,
                    })?
            }
            _ if record.stored_len != record.uncompressed_len => {
                return Err(ArchiveError::EntryLength {
                    id: record.id,
                    stored: record.stored_len,
                    uncompressed: record.uncompressed_len,
                });
            }
            _ => stored.to_vec(),
        };
        entries.push(ArchiveEntry::new(record.id, data));
    }

    Ok(Archive { entries })
}
