//! Name hashes mapping human readable names to 32-bit identifiers
//!
//! Two hashes are in use:
//!
//! - [`entry_name_hash`] identifies named entries inside an archive
//!   (`versionlist` CRC tables, `npc.dat`, ...). It upper-cases ASCII
//!   letters and uses a multiplier of 61 with a bias of 32.
//! - [`djb2`] identifies named archives in the modern generation's
//!   reference tables (`m50_50`, `l50_50`, ...). It uses a multiplier of
//!   31 over CP1252 bytes with no case folding.
//!
//! Neither hash is collision resistant.

use crate::charset;

/// Hash an archive entry name
///
/// `h = h * 61 + upper(c) - 32`, wrapping, starting at 0.
///
/// ```
/// use jagstore_crypto::hash::entry_name_hash;
///
/// assert_eq!(entry_name_hash("test"), 11_943_852);
/// assert_eq!(entry_name_hash("TEST"), entry_name_hash("test"));
/// ```
pub fn entry_name_hash(name: &str) -> i32 {
    name.chars().fold(0i32, |hash, c| {
        let upper = c.to_ascii_uppercase();
        hash.wrapping_mul(61)
            .wrapping_add(i32::from(charset::encode_char(upper)))
            .wrapping_sub(32)
    })
}

/// Hash an archive name
///
/// `h = h * 31 + b` over the CP1252 byte of each character, wrapping,
/// starting at 0.
///
/// ```
/// use jagstore_crypto::hash::djb2;
///
/// assert_eq!(djb2("test"), 3_556_498);
/// assert_ne!(djb2("Test"), djb2("test"));
/// ```
pub fn djb2(name: &str) -> i32 {
    name.chars().fold(0i32, |hash, c| {
        hash.wrapping_mul(31)
            .wrapping_add(i32::from(charset::encode_char(c)))
    })
}
