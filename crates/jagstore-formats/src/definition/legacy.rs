//! Definition sources of the legacy generation
//!
//! The legacy `config` archive stores each family as two entries:
//! `<name>.dat` with every record back to back after a 2-byte count, and
//! `<name>.idx` with `u16 count` followed by one `u16` record length per
//! definition.

use std::io::Cursor;
use std::ops::Range;

use super::{DecodeError, DecodeResult, DecoderOptions, Definition, DefinitionKind, decode};
use crate::archive::Archive;
use crate::ioutils::ReadInt;

/// Offset of the first record in a `.dat` entry
pub const DAT_HEADER_LEN: usize = 2;

/// Record offsets parsed from a `.idx` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDefinitionIndex {
    kind: DefinitionKind,
    ranges: Vec<Range<usize>>,
}

impl LegacyDefinitionIndex {
    /// Parse a `.idx` entry
    pub fn parse(kind: DefinitionKind, idx: &[u8]) -> DecodeResult<Self> {
        let malformed = |reason: String| DecodeError::LegacyIndex { kind, reason };
        let mut cursor = Cursor::new(idx);
        let count = cursor
            .read_u16be()
            .map_err(|_| malformed("missing record count".into()))?;
        let mut ranges = Vec::with_capacity(usize::from(count));
        let mut offset = DAT_HEADER_LEN;
        for i in 0..count {
            let len = cursor
                .read_u16be()
                .map_err(|_| malformed(format!("index ends before record {i} of {count}")))?;
            let end = offset + usize::from(len);
            ranges.push(offset..end);
            offset = end;
        }
        Ok(Self { kind, ranges })
    }

    /// Read the `.idx` entry of `D` from a legacy `config` archive
    pub fn from_config<D: Definition>(config: &Archive) -> DecodeResult<Self> {
        let name = format!("{}.idx", D::KIND.legacy_name());
        let idx = config
            .get_named(&name)
            .ok_or_else(|| DecodeError::LegacyIndex {
                kind: D::KIND,
                reason: format!("config archive has no {name} entry"),
            })?;
        Self::parse(D::KIND, idx)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Byte range of a record within the `.dat` entry
    pub fn range(&self, id: u32) -> Option<Range<usize>> {
        self.ranges.get(id as usize).cloned()
    }

    /// Decode record `id` from the matching `.dat` entry
    ///
    /// Returns `Ok(None)` when `id` is past the end of the index.
    pub fn decode<D: Definition>(
        &self,
        dat: &[u8],
        id: u32,
        options: &DecoderOptions,
    ) -> DecodeResult<Option<D>> {
        let Some(range) = self.range(id) else {
            return Ok(None);
        };
        let record = dat.get(range.clone()).ok_or_else(|| DecodeError::LegacyIndex {
            kind: self.kind,
            reason: format!(
                "record {id} spans {}..{} but the data is {} bytes",
                range.start,
                range.end,
                dat.len()
            ),
        })?;
        decode(id, &mut Cursor::new(record), options).map(Some)
    }

    /// Decode every record
    pub fn decode_all<D: Definition>(
        &self,
        dat: &[u8],
        options: &DecoderOptions,
    ) -> DecodeResult<Vec<D>> {
        (0..self.ranges.len() as u32)
            .filter_map(|id| self.decode(dat, id, options).transpose())
            .collect()
    }
}
