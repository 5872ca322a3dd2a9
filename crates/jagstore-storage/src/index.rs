//! Index pointer files
//!
//! An index file is a flat array of 6-byte entries, one per archive id:
//! `u24 length` followed by `u24 first_sector`. An entry with either field
//! zero marks an absent archive.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::AccessMode;
use crate::layout::{INDEX_ENTRY_SIZE, MAX_U24};
use crate::positioned::{read_at_most, write_all_at};

/// Location of one archive in the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Archive length in bytes
    pub length: u32,
    /// First sector of the chain
    pub sector: u32,
}

impl IndexEntry {
    /// Parse an entry
    pub fn from_bytes(bytes: [u8; INDEX_ENTRY_SIZE]) -> Self {
        Self {
            length: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
            sector: u32::from_be_bytes([0, bytes[3], bytes[4], bytes[5]]),
        }
    }

    /// Serialize the entry; both fields must fit 24 bits
    pub fn to_bytes(self) -> [u8; INDEX_ENTRY_SIZE] {
        debug_assert!(self.length <= MAX_U24 && self.sector <= MAX_U24);
        let length = self.length.to_be_bytes();
        let sector = self.sector.to_be_bytes();
        [length[1], length[2], length[3], sector[1], sector[2], sector[3]]
    }

    /// Whether the entry points at an archive
    pub fn is_present(self) -> bool {
        self.length != 0 && self.sector != 0
    }
}

/// One open index file with the lock serializing access to its archives
#[derive(Debug)]
pub struct IndexFile {
    index: u8,
    path: PathBuf,
    file: RwLock<File>,
}

impl IndexFile {
    /// Open an existing index file
    pub fn open(index: u8, path: &Path, access: AccessMode) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(access.is_writable())
            .open(path)?;
        Ok(Self {
            index,
            path: path.to_path_buf(),
            file: RwLock::new(file),
        })
    }

    /// Index id
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes left over after the last whole entry
    pub fn trailing_bytes(&self) -> io::Result<u64> {
        Ok(self.file.read().metadata()?.len() % INDEX_ENTRY_SIZE as u64)
    }

    /// Shared access for reading archives of this index
    pub fn read(&self) -> IndexReadGuard<'_> {
        IndexReadGuard {
            file: self.file.read(),
        }
    }

    /// Exclusive access for writing archives of this index
    pub fn write(&self) -> IndexWriteGuard<'_> {
        IndexWriteGuard {
            file: self.file.write(),
        }
    }
}

// A partial trailing entry is rejected at open under the strict policy, so
// rounding down only matters for the truncating one.
fn entry_count(file: &File) -> io::Result<u32> {
    Ok((file.metadata()?.len() / INDEX_ENTRY_SIZE as u64).min(u64::from(u32::MAX)) as u32)
}

fn read_entry(file: &File, archive: u32) -> io::Result<Option<IndexEntry>> {
    let mut bytes = [0u8; INDEX_ENTRY_SIZE];
    let offset = u64::from(archive) * INDEX_ENTRY_SIZE as u64;
    if read_at_most(file, &mut bytes, offset)? < INDEX_ENTRY_SIZE {
        return Ok(None);
    }
    let entry = IndexEntry::from_bytes(bytes);
    Ok(entry.is_present().then_some(entry))
}

/// Shared lock on an index file
pub struct IndexReadGuard<'a> {
    file: RwLockReadGuard<'a, File>,
}

impl IndexReadGuard<'_> {
    /// Entry for `archive`, `None` when absent or past the end of the file
    pub fn entry(&self, archive: u32) -> io::Result<Option<IndexEntry>> {
        read_entry(&self.file, archive)
    }

    /// Number of entry slots in the file
    pub fn len(&self) -> io::Result<u32> {
        entry_count(&self.file)
    }
}

/// Exclusive lock on an index file
pub struct IndexWriteGuard<'a> {
    file: RwLockWriteGuard<'a, File>,
}

impl IndexWriteGuard<'_> {
    /// Entry for `archive`, `None` when absent or past the end of the file
    pub fn entry(&self, archive: u32) -> io::Result<Option<IndexEntry>> {
        read_entry(&self.file, archive)
    }

    /// Number of entry slots in the file
    pub fn len(&self) -> io::Result<u32> {
        entry_count(&self.file)
    }

    /// Store the entry for `archive`, growing the file with absent entries
    pub fn set_entry(&self, archive: u32, entry: IndexEntry) -> io::Result<()> {
        let offset = u64::from(archive) * INDEX_ENTRY_SIZE as u64;
        write_all_at(&self.file, &entry.to_bytes(), offset)
    }

    /// Flush the file to disk
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_bytes() {
        let entry = IndexEntry {
            length: 0x01_0203,
            sector: 0x0A_0B0C,
        };
        let bytes = entry.to_bytes();
        assert_eq!(bytes, [1, 2, 3, 0x0A, 0x0B, 0x0C]);
        assert_eq!(IndexEntry::from_bytes(bytes), entry);
        assert!(!IndexEntry { length: 5, sector: 0 }.is_present());
        assert!(!IndexEntry { length: 0, sector: 5 }.is_present());
    }

    #[test]
    fn test_read_and_write_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main_file_cache.idx2");
        std::fs::write(&path, []).unwrap();

        let index = IndexFile::open(2, &path, AccessMode::ReadWrite).unwrap();
        let entry = IndexEntry {
            length: 700,
            sector: 3,
        };
        {
            let guard = index.write();
            guard.set_entry(4, entry).unwrap();
            assert_eq!(guard.len().unwrap(), 5);
        }

        let guard = index.read();
        assert_eq!(guard.entry(4).unwrap(), Some(entry));
        assert_eq!(guard.entry(1).unwrap(), None);
        assert_eq!(guard.entry(9).unwrap(), None);
        assert_eq!(index.trailing_bytes().unwrap(), 0);
    }

    #[test]
    fn test_partial_trailing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main_file_cache.idx0");
        std::fs::write(&path, [0, 0, 9, 0, 0, 1, 0, 0]).unwrap();

        let index = IndexFile::open(0, &path, AccessMode::ReadOnly).unwrap();
        assert_eq!(index.trailing_bytes().unwrap(), 2);
        assert_eq!(index.read().len().unwrap(), 1);
        assert_eq!(index.read().entry(1).unwrap(), None);
    }
}
