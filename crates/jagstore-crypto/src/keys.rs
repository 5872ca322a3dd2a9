//! Per-region XTEA key management
//!
//! Map location archives are encrypted with a key chosen per map region.
//! A region is a 64x64 tile square addressed by `(x, y)` with both
//! coordinates below 256; its packed id is `x << 8 | y`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::xtea::XteaKey;

/// Packed map region identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(u16);

impl RegionId {
    /// Create from coordinates, each of which must be below 256
    pub fn new(x: u32, y: u32) -> Result<Self, CryptoError> {
        match (u8::try_from(x), u8::try_from(y)) {
            (Ok(x), Ok(y)) => Ok(Self::from_coords(x, y)),
            _ => Err(CryptoError::InvalidRegion { x, y }),
        }
    }

    /// Create from coordinates already known to be in range
    pub const fn from_coords(x: u8, y: u8) -> Self {
        Self(((x as u16) << 8) | y as u16)
    }

    /// Create from a packed id
    pub const fn from_packed(packed: u16) -> Self {
        Self(packed)
    }

    /// Packed `x << 8 | y` form
    pub const fn packed(self) -> u16 {
        self.0
    }

    /// Region x coordinate
    pub const fn x(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Region y coordinate
    pub const fn y(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Name of the region's terrain archive, `m{x}_{y}`
    pub fn terrain_name(self) -> String {
        format!("m{}_{}", self.x(), self.y())
    }

    /// Name of the region's location archive, `l{x}_{y}`
    pub fn locations_name(self) -> String {
        format!("l{}_{}", self.x(), self.y())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x(), self.y())
    }
}

/// Source of XTEA keys for map regions
pub trait XteaKeyProvider {
    /// Key for a region, if one is known
    fn region_key(&self, region: RegionId) -> Option<XteaKey>;

    /// Whether a key is known for a region
    fn has_key(&self, region: RegionId) -> bool {
        self.region_key(region).is_some()
    }
}

/// One entry of a JSON key dump
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyDumpEntry {
    region: u16,
    keys: [i32; 4],
}

/// In-memory region key table
#[derive(Debug, Clone, Default)]
pub struct XteaKeyStore {
    keys: HashMap<RegionId, XteaKey>,
}

impl XteaKeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from a JSON dump
    ///
    /// The dump is an array of `{"region": <packed id>, "keys": [i32; 4]}`
    /// objects. All-zero keys are skipped since they mean "not encrypted".
    ///
    /// ```
    /// use jagstore_crypto::keys::{RegionId, XteaKeyProvider, XteaKeyStore};
    ///
    /// let json = r#"[{"region": 12850, "keys": [1, 2, 3, -4]}]"#;
    /// let store = XteaKeyStore::from_json(json).unwrap();
    /// assert!(store.has_key(RegionId::from_coords(50, 50)));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let entries: Vec<KeyDumpEntry> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for entry in entries {
            let key = XteaKey::from_signed(entry.keys);
            if !key.is_none() {
                store.insert(RegionId::from_packed(entry.region), key);
            }
        }
        Ok(store)
    }

    /// Serialize to the JSON dump format read by [`Self::from_json`]
    pub fn to_json(&self) -> Result<String, CryptoError> {
        let mut entries: Vec<KeyDumpEntry> = self
            .keys
            .iter()
            .map(|(region, key)| {
                let w = key.words();
                KeyDumpEntry {
                    region: region.packed(),
                    keys: [w[0] as i32, w[1] as i32, w[2] as i32, w[3] as i32],
                }
            })
            .collect();
        entries.sort_by_key(|e| e.region);
        Ok(serde_json::to_string(&entries)?)
    }

    /// Add or replace a region key
    pub fn insert(&mut self, region: RegionId, key: XteaKey) -> Option<XteaKey> {
        self.keys.insert(region, key)
    }

    /// Remove a region key
    pub fn remove(&mut self, region: RegionId) -> Option<XteaKey> {
        self.keys.remove(&region)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl XteaKeyProvider for XteaKeyStore {
    fn region_key(&self, region: RegionId) -> Option<XteaKey> {
        self.keys.get(&region).copied()
    }
}

impl<P: XteaKeyProvider + ?Sized> XteaKeyProvider for &P {
    fn region_key(&self, region: RegionId) -> Option<XteaKey> {
        (**self).region_key(region)
    }
}
