//! Compression codec for archive payloads
//!
//! The algorithm is recorded per archive in its header; nothing is
//! configured globally. Bzip2 streams are stored without their 4-byte
//! `BZh1` magic, which is stripped on compression and restored before
//! decoding.
//!
//! Decompression is always bounded by the length recorded next to the
//! stream, so a hostile stream cannot expand past what the archive claims.

mod error;

pub use error::{CompressionError, CompressionResult};

use std::fmt;
use std::io::{self, Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Magic a bzip2 stream with 100k blocks starts with
pub const BZIP2_HEADER: [u8; 4] = *b"BZh1";

/// Compression algorithms an archive can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Algorithm {
    /// Stored as-is
    #[default]
    None = 0,
    /// Headerless bzip2, block size 1
    Bzip2 = 1,
    /// gzip (RFC 1952)
    Gzip = 2,
    /// `.lzma` stream
    Lzma = 3,
}

impl Algorithm {
    /// Every algorithm in header-byte order
    pub const ALL: [Self; 4] = [Self::None, Self::Bzip2, Self::Gzip, Self::Lzma];

    /// Parse from the archive header byte
    pub fn from_byte(byte: u8) -> CompressionResult<Self> {
        match byte {
            0 => Ok(Self::None),
            1 => Ok(Self::Bzip2),
            2 => Ok(Self::Gzip),
            3 => Ok(Self::Lzma),
            other => Err(CompressionError::UnknownAlgorithm(other)),
        }
    }

    /// Header byte
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
            Self::Lzma => "lzma",
        })
    }
}

/// Compress `data` with `algorithm`
pub fn compress(algorithm: Algorithm, data: &[u8]) -> CompressionResult<Vec<u8>> {
    let wrap = |source| CompressionError::Compress { algorithm, source };
    match algorithm {
        Algorithm::None => Ok(data.to_vec()),
        Algorithm::Bzip2 => {
            let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::new(1));
            encoder.write_all(data).map_err(wrap)?;
            let mut stream = encoder.finish().map_err(wrap)?;
            if !stream.starts_with(&BZIP2_HEADER) {
                return Err(wrap(io::Error::other("bzip2 encoder emitted unexpected header")));
            }
            stream.drain(..BZIP2_HEADER.len());
            Ok(stream)
        }
        Algorithm::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        Algorithm::Lzma => {
            let mut stream = Vec::new();
            lzma_rs::lzma_compress(&mut &data[..], &mut stream).map_err(wrap)?;
            Ok(stream)
        }
    }
}

/// Decompress `data`, which must expand to exactly `expected_len` bytes
pub fn decompress(
    algorithm: Algorithm,
    data: &[u8],
    expected_len: usize,
) -> CompressionResult<Vec<u8>> {
    let output = match algorithm {
        Algorithm::None => data.to_vec(),
        Algorithm::Bzip2 => {
            let stream = BZIP2_HEADER.as_slice().chain(data);
            read_bounded(BzDecoder::new(stream), expected_len)
                .map_err(|e| corrupt(algorithm, e))?
        }
        Algorithm::Gzip => {
            read_bounded(GzDecoder::new(data), expected_len)
                .map_err(|e| corrupt(algorithm, e))?
        }
        Algorithm::Lzma => {
            let mut sink = BoundedSink::new(expected_len);
            lzma_rs::lzma_decompress(&mut &data[..], &mut sink)
                .map_err(|e| corrupt(algorithm, e))?;
            sink.buf
        }
    };

    if output.len() != expected_len {
        return Err(CompressionError::LengthMismatch {
            algorithm,
            expected: expected_len,
            actual: output.len(),
        });
    }
    Ok(output)
}

fn corrupt(algorithm: Algorithm, reason: impl fmt::Display) -> CompressionError {
    CompressionError::CorruptStream {
        algorithm,
        reason: reason.to_string(),
    }
}

/// Upper bound on up-front output allocation
const MAX_PREALLOC: usize = 1 << 20;

/// Read at most `limit + 1` bytes so overlong streams are detected without
/// materializing them
fn read_bounded<R: Read>(reader: R, limit: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(limit.min(MAX_PREALLOC));
    reader.take(limit as u64 + 1).read_to_end(&mut out)?;
    Ok(out)
}

/// Writer that accepts at most `limit + 1` bytes
struct BoundedSink {
    buf: Vec<u8>,
    limit: usize,
}

impl BoundedSink {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit.min(MAX_PREALLOC)),
            limit,
        }
    }
}

impl Write for BoundedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let room = (self.limit + 1).saturating_sub(self.buf.len());
        if room == 0 {
            return Err(io::Error::other("stream exceeds recorded length"));
        }
        let n = data.len().min(room);
        self.buf.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
