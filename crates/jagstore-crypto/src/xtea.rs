//! XTEA block cipher for map location archives
//!
//! Each 8-byte block is processed independently with 32 rounds of the
//! standard XTEA schedule. Words are read big-endian. A trailing partial
//! block shorter than 8 bytes is left as-is, which is how the stored map
//! archives were written.

use crate::error::CryptoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// XTEA block size in bytes
pub const BLOCK_SIZE: usize = 8;

/// Number of Feistel rounds
pub const ROUNDS: u32 = 32;

const DELTA: u32 = 0x9E37_79B9;

/// A 128-bit XTEA key as four 32-bit words
///
/// The all-zero key is the [`XteaKey::NONE`] sentinel, meaning the archive
/// is stored in the clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct XteaKey([u32; 4]);

impl XteaKey {
    /// The "no encryption" sentinel
    pub const NONE: Self = Self([0; 4]);

    /// Create a key from four words
    pub const fn new(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// Create a key from signed words, the shape key dumps use
    pub const fn from_signed(words: [i32; 4]) -> Self {
        Self([
            words[0] as u32,
            words[1] as u32,
            words[2] as u32,
            words[3] as u32,
        ])
    }

    /// Create a key from 16 big-endian bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }

    /// Parse a key from a 32 character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))?;
        let bytes: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeySize {
                expected: 16,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Key words
    pub const fn words(&self) -> [u32; 4] {
        self.0
    }

    /// Whether this is the [`XteaKey::NONE`] sentinel
    pub fn is_none(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Key as 16 big-endian bytes
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }
}

impl From<[u32; 4]> for XteaKey {
    fn from(words: [u32; 4]) -> Self {
        Self(words)
    }
}

impl FromStr for XteaKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for XteaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// Encrypt one block in place
pub fn encrypt_block(block: &mut [u8; BLOCK_SIZE], key: &XteaKey) {
    let k = key.0;
    let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    let mut sum = 0u32;

    for _ in 0..ROUNDS {
        v0 = v0.wrapping_add(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(k[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ sum.wrapping_add(k[((sum >> 11) & 3) as usize]),
        );
    }

    block[..4].copy_from_slice(&v0.to_be_bytes());
    block[4..].copy_from_slice(&v1.to_be_bytes());
}

/// Decrypt one block in place
pub fn decrypt_block(block: &mut [u8; BLOCK_SIZE], key: &XteaKey) {
    let k = key.0;
    let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    let mut sum = DELTA.wrapping_mul(ROUNDS);

    for _ in 0..ROUNDS {
        v1 = v1.wrapping_sub(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ sum.wrapping_add(k[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(k[(sum & 3) as usize]),
        );
    }

    block[..4].copy_from_slice(&v0.to_be_bytes());
    block[4..].copy_from_slice(&v1.to_be_bytes());
}

/// Encrypt every whole block of `data` in place
///
/// Does nothing for [`XteaKey::NONE`].
pub fn encrypt(data: &mut [u8], key: &XteaKey) {
    if key.is_none() {
        return;
    }
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        encrypt_block(&mut block, key);
        chunk.copy_from_slice(&block);
    }
}

/// Decrypt every whole block of `data` in place
///
/// Does nothing for [`XteaKey::NONE`].
pub fn decrypt(data: &mut [u8], key: &XteaKey) {
    if key.is_none() {
        return;
    }
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        decrypt_block(&mut block, key);
        chunk.copy_from_slice(&block);
    }
}
