//! Reference tables of the modern generation
//!
//! Each content index `n` has a reference table stored, uncompressed and
//! unencrypted, as archive `n` of the master index. It lists the archives
//! present in the index with their optional [`djb2`] name hash, CRC-32,
//! optional MD5 digest and version.
//!
//! ```text
//! u8  protocol (5 or 6)
//! u32 revision             protocol 6 only
//! u8  flags                bit 0 named, bit 1 digests
//! u16 count
//! count x u16              archive ids, delta encoded
//! count x i32              name hashes, when named
//! count x u32              CRC-32
//! count x [u8; 16]         MD5 digests, when digests
//! count x u32              versions
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Read};

use jagstore_crypto::{Digest, crc32, djb2};
use thiserror::Error;

use crate::ioutils::{ReadInt, WriteInt};

/// Oldest protocol understood
pub const PROTOCOL_UNVERSIONED: u8 = 5;

/// Protocol carrying a revision number, written by [`ReferenceTable::encode`]
pub const PROTOCOL_VERSIONED: u8 = 6;

const FLAG_NAMED: u8 = 0x01;
const FLAG_DIGESTS: u8 = 0x02;

/// Errors raised by the reference table codec
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Protocol byte not understood
    #[error("unsupported reference table protocol {0}")]
    UnsupportedProtocol(u8),

    /// Table ended early
    #[error("truncated reference table: {0}")]
    Truncated(#[from] io::Error),

    /// Bytes left after the table
    #[error("{0} trailing bytes after reference table")]
    TrailingBytes(usize),

    /// Archive ids are too far apart for 16-bit deltas, or too many
    #[error("reference table cannot encode archive id {0}")]
    Unencodable(u32),

    /// Payload CRC differs from the recorded one
    #[error("archive {id} CRC mismatch: recorded {expected:08x}, computed {actual:08x}")]
    CrcMismatch {
        /// Archive id
        id: u32,
        /// Recorded CRC
        expected: u32,
        /// CRC of the payload
        actual: u32,
    },

    /// Payload digest differs from the recorded one
    #[error("archive {id} digest mismatch: recorded {expected}, computed {actual}")]
    DigestMismatch {
        /// Archive id
        id: u32,
        /// Recorded digest
        expected: Digest,
        /// Digest of the payload
        actual: Digest,
    },
}

/// One archive listed in a reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Archive id within the index
    pub id: u32,
    /// [`djb2`] hash of the archive name
    pub name_hash: Option<i32>,
    /// CRC-32 of the stored archive bytes
    pub crc: u32,
    /// MD5 of the stored archive bytes
    pub digest: Option<Digest>,
    /// Archive version
    pub version: u32,
}

/// Archive listing for one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    /// Table protocol
    pub protocol: u8,
    /// Table revision (protocol 6)
    pub revision: u32,
    named: bool,
    digests: bool,
    entries: BTreeMap<u32, ReferenceEntry>,
    names: HashMap<i32, u32>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ReferenceTable {
    /// Create an empty table
    pub fn new(named: bool, digests: bool) -> Self {
        Self {
            protocol: PROTOCOL_VERSIONED,
            revision: 0,
            named,
            digests,
            entries: BTreeMap::new(),
            names: HashMap::new(),
        }
    }

    /// Whether entries carry name hashes
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Whether entries carry MD5 digests
    pub fn has_digests(&self) -> bool {
        self.digests
    }

    /// Number of listed archives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table lists nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for an archive id
    pub fn get(&self, id: u32) -> Option<&ReferenceEntry> {
        self.entries.get(&id)
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.values()
    }

    /// Archive id whose name hashes to `hash`
    pub fn id_for_hash(&self, hash: i32) -> Option<u32> {
        self.names.get(&hash).copied()
    }

    /// Archive id for a name
    pub fn id_for_name(&self, name: &str) -> Option<u32> {
        self.id_for_hash(djb2(name))
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: ReferenceEntry) -> Option<ReferenceEntry> {
        let replaced = self.entries.insert(entry.id, entry);
        if let Some(old_hash) = replaced.and_then(|old| old.name_hash)
            && self.names.get(&old_hash) == Some(&entry.id)
        {
            self.names.remove(&old_hash);
        }
        // On a hash collision the first archive keeps the name
        if let Some(hash) = entry.name_hash {
            self.names.entry(hash).or_insert(entry.id);
        }
        replaced
    }

    /// Record a freshly written archive, bumping its version
    pub fn record(&mut self, id: u32, name: Option<&str>, stored: &[u8]) -> &ReferenceEntry {
        let previous = self.entries.get(&id).copied();
        let name_hash = match name {
            Some(name) if self.named => Some(djb2(name)),
            _ => previous.and_then(|p| p.name_hash),
        };
        let entry = ReferenceEntry {
            id,
            name_hash,
            crc: crc32(stored),
            digest: self.digests.then(|| Digest::of(stored)),
            version: previous.map_or(1, |p| p.version.wrapping_add(1)),
        };
        self.insert(entry);
        self.revision = self.revision.wrapping_add(1);
        &self.entries[&id]
    }

    /// Check stored archive bytes against the recorded CRC and digest
    ///
    /// Archives the table does not list pass unchecked.
    pub fn verify(&self, id: u32, stored: &[u8]) -> Result<(), ReferenceError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(());
        };
        let actual = crc32(stored);
        if actual != entry.crc {
            return Err(ReferenceError::CrcMismatch {
                id,
                expected: entry.crc,
                actual,
            });
        }
        if let Some(expected) = entry.digest {
            let actual = Digest::of(stored);
            if actual != expected {
                return Err(ReferenceError::DigestMismatch {
                    id,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Decode a table
    pub fn decode(data: &[u8]) -> Result<Self, ReferenceError> {
        let mut cursor = Cursor::new(data);
        let protocol = cursor.read_u8()?;
        let revision = match protocol {
            PROTOCOL_UNVERSIONED => 0,
            PROTOCOL_VERSIONED => cursor.read_u32be()?,
            other => return Err(ReferenceError::UnsupportedProtocol(other)),
        };
        let flags = cursor.read_u8()?;
        let named = flags & FLAG_NAMED != 0;
        let digests = flags & FLAG_DIGESTS != 0;
        let count = usize::from(cursor.read_u16be()?);

        let mut ids = Vec::with_capacity(count);
        let mut last = 0u32;
        for _ in 0..count {
            last += u32::from(cursor.read_u16be()?);
            ids.push(last);
        }

        let name_hashes = if named {
            (0..count)
                .map(|_| cursor.read_i32be().map(Some))
                .collect::<io::Result<Vec<_>>>()?
        } else {
            vec![None; count]
        };
        let crcs = (0..count)
            .map(|_| cursor.read_u32be())
            .collect::<io::Result<Vec<_>>>()?;
        let digest_list = if digests {
            (0..count)
                .map(|_| {
                    let mut bytes = [0u8; 16];
                    cursor.read_exact(&mut bytes).map(|()| Some(Digest::from_bytes(bytes)))
                })
                .collect::<io::Result<Vec<_>>>()?
        } else {
            vec![None; count]
        };
        let versions = (0..count)
            .map(|_| cursor.read_u32be())
            .collect::<io::Result<Vec<_>>>()?;

        let remaining = data.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(ReferenceError::TrailingBytes(remaining));
        }

        let mut table = Self::new(named, digests);
        table.protocol = protocol;
        table.revision = revision;
        for i in 0..count {
            table.insert(ReferenceEntry {
                id: ids[i],
                name_hash: name_hashes[i],
                crc: crcs[i],
                digest: digest_list[i],
                version: versions[i],
            });
        }
        Ok(table)
    }

    /// Encode the table with protocol 6
    pub fn encode(&self) -> Result<Vec<u8>, ReferenceError> {
        let count = u16::try_from(self.entries.len()).map_err(|_| {
            ReferenceError::Unencodable(self.entries.keys().last().copied().unwrap_or_default())
        })?;
        let mut out = Vec::new();
        out.write_u8(PROTOCOL_VERSIONED)?;
        out.write_u32be(self.revision)?;
        let mut flags = 0;
        if self.named {
            flags |= FLAG_NAMED;
        }
        if self.digests {
            flags |= FLAG_DIGESTS;
        }
        out.write_u8(flags)?;
        out.write_u16be(count)?;

        let mut last = 0u32;
        for &id in self.entries.keys() {
            let delta = u16::try_from(id - last).map_err(|_| ReferenceError::Unencodable(id))?;
            out.write_u16be(delta)?;
            last = id;
        }
        if self.named {
            for entry in self.entries.values() {
                out.write_i32be(entry.name_hash.unwrap_or_default())?;
            }
        }
        for entry in self.entries.values() {
            out.write_u32be(entry.crc)?;
        }
        if self.digests {
            for entry in self.entries.values() {
                out.extend_from_slice(entry.digest.unwrap_or_default().as_bytes());
            }
        }
        for entry in self.entries.values() {
            out.write_u32be(entry.version)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_and_lookup() {
        let mut table = ReferenceTable::default();
        table.record(3, Some("m50_50"), b"terrain");
        table.record(9, Some("l50_50"), b"locations");

        assert_eq!(table.id_for_name("m50_50"), Some(3));
        assert_eq!(table.id_for_name("l50_50"), Some(9));
        assert_eq!(table.id_for_name("m0_0"), None);
        assert_eq!(table.get(3).unwrap().version, 1);

        table.record(3, None, b"terrain v2");
        let entry = table.get(3).unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.name_hash, Some(djb2("m50_50")));
        assert_eq!(entry.crc, crc32(b"terrain v2"));
    }

    #[test]
    fn test_encode_decode() {
        let mut table = ReferenceTable::new(true, false);
        table.record(0, Some("a"), b"1");
        table.record(700, Some("b"), b"2");
        let bytes = table.encode().unwrap();
        assert_eq!(&bytes[..6], &[6, 0, 0, 0, 2, 1]);

        let decoded = ReferenceTable::decode(&bytes).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.id_for_name("b"), Some(700));
    }

    #[test]
    fn test_verify() {
        let mut table = ReferenceTable::default();
        table.record(1, None, b"payload");
        assert!(table.verify(1, b"payload").is_ok());
        assert!(matches!(
            table.verify(1, b"tampered"),
            Err(ReferenceError::CrcMismatch { id: 1, .. })
        ));
        assert!(table.verify(2, b"unlisted").is_ok());
    }

    #[test]
    fn test_unversioned_protocol() {
        // protocol 5, no flags, one archive with id 4
        let bytes = [5, 0, 0, 1, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 3];
        let table = ReferenceTable::decode(&bytes).unwrap();
        assert_eq!(table.revision, 0);
        assert_eq!(table.get(4).unwrap().crc, 0xDEAD_BEEF);
        assert_eq!(table.get(4).unwrap().version, 3);
    }

    #[test]
    fn test_malformed_tables() {
        assert!(matches!(
            ReferenceTable::decode(&[7]),
            Err(ReferenceError::UnsupportedProtocol(7))
        ));
        assert!(matches!(
            ReferenceTable::decode(&[5, 0, 0, 1]),
            Err(ReferenceError::Truncated(_))
        ));
        assert!(matches!(
            ReferenceTable::decode(&[5, 0, 0, 0, 9]),
            Err(ReferenceError::TrailingBytes(1))
        ));
    }
}
