//! Cryptographic and hashing primitives for jagstore caches
//!
//! This crate provides the leaf operations the storage engine builds on.
//!
//! # Components
//!
//! - **Encryption**: XTEA block cipher protecting map location archives
//! - **Key Management**: per-region XTEA key lookup ([`XteaKeyStore`])
//! - **Name Hashing**: archive entry names and archive names to 32-bit ids
//! - **Integrity**: MD5 payload digests and CRC-32 accumulation
//!
//! # Examples
//!
//! ## Name hashing
//!
//! ```
//! use jagstore_crypto::hash::{djb2, entry_name_hash};
//!
//! assert_eq!(entry_name_hash("test"), 11_943_852);
//! assert_eq!(djb2("test"), 3_556_498);
//! ```
//!
//! ## XTEA
//!
//! ```
//! use jagstore_crypto::xtea::{XteaKey, decrypt, encrypt};
//!
//! let key = XteaKey::new([1, 2, 3, 4]);
//! let mut data = b"sixteen byte msg".to_vec();
//! encrypt(&mut data, &key);
//! decrypt(&mut data, &key);
//! assert_eq!(&data, b"sixteen byte msg");
//! ```

#![warn(missing_docs)]

pub mod charset;
pub mod crc;
pub mod digest;
pub mod error;
pub mod hash;
pub mod keys;
pub mod xtea;

pub use error::CryptoError;

// Re-export commonly used types
pub use crc::{CrcAccumulator, crc32};
pub use digest::Digest;
pub use hash::{djb2, entry_name_hash};
pub use keys::{RegionId, XteaKeyProvider, XteaKeyStore};
pub use xtea::XteaKey;
