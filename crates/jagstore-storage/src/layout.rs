//! Geometry of the two store generations
//!
//! Both generations chain 520-byte sectors through the same walker. What
//! differs is captured in a [`SectorLayout`]: file names, which index files
//! must exist, the sector header width and the index tag written into each
//! header.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Size of one sector including its header
pub const SECTOR_SIZE: usize = 520;

/// Size of one index file entry
pub const INDEX_ENTRY_SIZE: usize = 6;

/// Sector header with a 16-bit archive id
pub const HEADER_SIZE: usize = 8;

/// Sector header with a 32-bit archive id
pub const EXTENDED_HEADER_SIZE: usize = 10;

/// Largest value of a 24-bit field
pub const MAX_U24: u32 = 0x00FF_FFFF;

/// Index of the modern master index
pub const MASTER_INDEX: u8 = 255;

/// Number of index files in a legacy store
pub const LEGACY_INDEX_COUNT: u8 = 5;

/// Well-known modern index ids
pub mod modern_index {
    /// Animation frames
    pub const ANIMATIONS: u8 = 0;
    /// Animation skeletons
    pub const SKELETONS: u8 = 1;
    /// Entity definitions
    pub const CONFIG: u8 = 2;
    /// Interfaces
    pub const INTERFACES: u8 = 3;
    /// Sound effects
    pub const SOUND_EFFECTS: u8 = 4;
    /// Map terrain and locations
    pub const MAPS: u8 = 5;
    /// Music tracks
    pub const MUSIC: u8 = 6;
    /// Models
    pub const MODELS: u8 = 7;
}

/// Named archives of legacy index 0
pub const LEGACY_ARCHIVES: [(&str, u32); 8] = [
    ("title", 1),
    ("config", 2),
    ("interface", 3),
    ("media", 4),
    ("versionlist", 5),
    ("textures", 6),
    ("wordenc", 7),
    ("sounds", 8),
];

/// Archive id of the legacy `config` archive in index 0
pub const LEGACY_CONFIG_ARCHIVE: u32 = 2;

/// Store layout generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Single data file with five index files
    Legacy,
    /// Data file with per-category index files and a master index
    Modern,
}

impl Generation {
    /// Geometry of this generation
    pub const fn layout(self) -> SectorLayout {
        match self {
            Self::Legacy => SectorLayout::LEGACY,
            Self::Modern => SectorLayout::MODERN,
        }
    }

    /// Detect the generation from the data file present in `dir`
    pub fn detect(dir: &Path) -> Option<Self> {
        [Self::Modern, Self::Legacy]
            .into_iter()
            .find(|generation| generation.layout().data_path(dir).is_file())
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        })
    }
}

/// Per-generation store geometry consumed by the chain walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    /// Generation described
    pub generation: Generation,
    /// Data file name
    pub data_file: &'static str,
    /// Index files that must exist, in addition to the master index
    pub required_indices: &'static [u8],
    /// Master index id, if the generation has one
    pub master_index: Option<u8>,
    /// Whether archive ids above 0xFFFF use the 10-byte header
    pub extended_ids: bool,
    /// Added to the index id to form the sector's index tag
    pub tag_offset: u8,
}

impl SectorLayout {
    /// Legacy geometry
    pub const LEGACY: Self = Self {
        generation: Generation::Legacy,
        data_file: "main_file_cache.dat",
        required_indices: &[0, 1, 2, 3, 4],
        master_index: None,
        extended_ids: false,
        tag_offset: 1,
    };

    /// Modern geometry
    pub const MODERN: Self = Self {
        generation: Generation::Modern,
        data_file: "main_file_cache.dat2",
        required_indices: &[],
        master_index: Some(MASTER_INDEX),
        extended_ids: true,
        tag_offset: 0,
    };

    /// Path of the data file
    pub fn data_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.data_file)
    }

    /// Path of the index file for `index`
    pub fn index_path(&self, dir: &Path, index: u8) -> PathBuf {
        dir.join(format!("main_file_cache.idx{index}"))
    }

    /// Index ids this generation can address, master index excluded
    pub fn addressable_indices(&self) -> std::ops::Range<u8> {
        match self.generation {
            Generation::Legacy => 0..LEGACY_INDEX_COUNT,
            Generation::Modern => 0..MASTER_INDEX,
        }
    }

    /// Whether `index` can exist in this generation
    pub fn is_addressable(&self, index: u8) -> bool {
        self.addressable_indices().contains(&index) || self.master_index == Some(index)
    }

    /// Tag byte written into the sectors of `index`
    pub const fn index_tag(&self, index: u8) -> u8 {
        index.wrapping_add(self.tag_offset)
    }

    /// Whether `archive` needs the 10-byte header
    pub const fn is_extended(&self, archive: u32) -> bool {
        self.extended_ids && archive > 0xFFFF
    }

    /// Header size for `archive`
    pub const fn header_size(&self, archive: u32) -> usize {
        if self.is_extended(archive) {
            EXTENDED_HEADER_SIZE
        } else {
            HEADER_SIZE
        }
    }

    /// Payload bytes per sector for `archive`
    pub const fn payload_size(&self, archive: u32) -> usize {
        SECTOR_SIZE - self.header_size(archive)
    }

    /// Largest archive id this generation can address
    pub const fn max_archive_id(&self) -> u32 {
        if self.extended_ids { u32::MAX } else { 0xFFFF }
    }
}

/// Id of a named archive in legacy index 0
pub fn legacy_archive_id(name: &str) -> Option<u32> {
    LEGACY_ARCHIVES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, id)| id)
}
