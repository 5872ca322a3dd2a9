//! CRC-32 checksums used by the per-index version tables

/// CRC-32 (ISO-HDLC) of `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Collects one CRC per archive, in archive order
///
/// The resulting sequence is what a versionlist CRC table stores for an
/// index.
#[derive(Debug, Clone, Default)]
pub struct CrcAccumulator {
    crcs: Vec<u32>,
    combined: crc32fast::Hasher,
}

impl CrcAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the CRC of the next archive payload
    pub fn push(&mut self, payload: &[u8]) -> u32 {
        let crc = crc32(payload);
        self.push_crc(crc);
        crc
    }

    /// Record a CRC for an archive that is absent from the store
    pub fn push_missing(&mut self) {
        self.push_crc(0);
    }

    fn push_crc(&mut self, crc: u32) {
        self.combined.update(&crc.to_be_bytes());
        self.crcs.push(crc);
    }

    /// Number of CRCs recorded
    pub fn len(&self) -> usize {
        self.crcs.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.crcs.is_empty()
    }

    /// CRC over the big-endian concatenation of all recorded CRCs
    pub fn combined(&self) -> u32 {
        self.combined.clone().finalize()
    }

    /// Finish and return the per-archive CRCs
    pub fn finish(self) -> Vec<u32> {
        self.crcs
    }
}
