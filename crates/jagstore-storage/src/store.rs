//! Raw sector store
//!
//! [`Store`] owns the data file and every index file of one cache directory.
//! It reads and writes archives as opaque byte strings; decoding and
//! decryption live in [`crate::loader`].

use dashmap::DashMap;
use jagstore_crypto::CrcAccumulator;
use jagstore_formats::archive::Archive;
use jagstore_formats::reference::ReferenceTable;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::config::{LengthPolicy, StoreConfig};
use crate::index::{IndexEntry, IndexFile, IndexReadGuard, IndexWriteGuard};
use crate::layout::{
    Generation, INDEX_ENTRY_SIZE, MAX_U24, SECTOR_SIZE, SectorLayout, legacy_archive_id,
};
use crate::positioned::{read_at_most, write_all_at};
use crate::sector::SectorHeader;
use crate::{Corruption, Result, StorageError};

/// Archive addressed by id or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveRef<'a> {
    /// Archive id
    Id(u32),
    /// Archive name, resolved through the index's name table
    Name(&'a str),
}

impl From<u32> for ArchiveRef<'_> {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for ArchiveRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

/// An open cache directory
///
/// Each index file carries its own read/write lock: reads of different
/// indices run in parallel and a write excludes every other access to the
/// same index. Sector allocation in the shared data file is serialized by a
/// mutex. File handles are released when the store is dropped or closed.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    config: StoreConfig,
    layout: SectorLayout,
    data: File,
    next_free: Mutex<u32>,
    indices: BTreeMap<u8, IndexFile>,
    pub(crate) memo: DashMap<(u8, u32), Arc<Archive>>,
    pub(crate) references: DashMap<u8, Arc<ReferenceTable>>,
    pub(crate) reference_writes: Mutex<()>,
}

impl Store {
    /// Open the store described by `config`
    pub fn open(config: StoreConfig) -> Result<Self> {
        let root = config.path.clone();
        let invalid = |reason: String| StorageError::InvalidStore {
            path: root.clone(),
            reason,
        };

        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(invalid("expected a cache directory, found a file".into())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(invalid("directory does not exist".into()));
            }
            Err(e) => return Err(e.into()),
        }

        let generation = match config.generation {
            Some(generation) => generation,
            None => Generation::detect(&root).ok_or_else(|| {
                invalid(format!(
                    "neither {} nor {} is present",
                    SectorLayout::MODERN.data_file,
                    SectorLayout::LEGACY.data_file
                ))
            })?,
        };
        let layout = generation.layout();
        debug!("Opening {} store at {}", generation, root.display());

        let data_path = layout.data_path(&root);
        if !data_path.is_file() {
            return Err(invalid(format!("missing data file {}", layout.data_file)));
        }
        for &index in layout.required_indices.iter().chain(&layout.master_index) {
            if !layout.index_path(&root, index).is_file() {
                return Err(invalid(format!(
                    "missing index file main_file_cache.idx{index}"
                )));
            }
        }

        let mut indices = BTreeMap::new();
        for index in layout.addressable_indices().chain(layout.master_index) {
            let path = layout.index_path(&root, index);
            if !path.is_file() {
                continue;
            }
            let file = IndexFile::open(index, &path, config.access)?;
            let trailing = file.trailing_bytes()?;
            if trailing != 0 {
                match config.length_policy {
                    LengthPolicy::Strict => {
                        return Err(invalid(format!(
                            "main_file_cache.idx{index} ends with a partial {trailing}-byte entry"
                        )));
                    }
                    LengthPolicy::Truncate => warn!(
                        "Ignoring {} trailing bytes of {}",
                        trailing,
                        path.display()
                    ),
                }
            }
            indices.insert(index, file);
        }

        let data = OpenOptions::new()
            .read(true)
            .write(config.access.is_writable())
            .open(&data_path)?;
        let sectors = data.metadata()?.len().div_ceil(SECTOR_SIZE as u64);
        let next_free = sectors.clamp(1, u64::from(MAX_U24) + 1) as u32;

        info!(
            "Opened {} store at {} with {} index files",
            generation,
            root.display(),
            indices.len()
        );

        Ok(Self {
            root,
            config,
            layout,
            data,
            next_free: Mutex::new(next_free),
            indices,
            memo: DashMap::new(),
            references: DashMap::new(),
            reference_writes: Mutex::new(()),
        })
    }

    /// Open `path` read-only, detecting its generation
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(StoreConfig::new(path))
    }

    /// Lay out empty backing files in `path` and open them for writing
    ///
    /// A legacy store always gets its five index files. A modern store gets
    /// the master index plus one file per id in `indices`.
    pub fn create<P: AsRef<Path>>(path: P, generation: Generation, indices: &[u8]) -> Result<Self> {
        let root = path.as_ref();
        let layout = generation.layout();
        let invalid = |reason: String| StorageError::InvalidStore {
            path: root.to_path_buf(),
            reason,
        };

        if let Some(&index) = indices.iter().find(|&&i| !layout.is_addressable(i)) {
            return Err(invalid(format!(
                "index {index} is not addressable in a {generation} store"
            )));
        }
        fs::create_dir_all(root)?;

        let create = |path: PathBuf| -> Result<()> {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    Err(invalid(format!("{} already exists", path.display())))
                }
                Err(e) => Err(e.into()),
            }
        };

        create(layout.data_path(root))?;
        let mut wanted: Vec<u8> = layout
            .required_indices
            .iter()
            .chain(&layout.master_index)
            .chain(indices)
            .copied()
            .collect();
        wanted.sort_unstable();
        wanted.dedup();
        for index in wanted {
            create(layout.index_path(root, index))?;
        }
        info!("Created {} store at {}", generation, root.display());

        Self::open(
            StoreConfig::new(root)
                .with_generation(generation)
                .writable(),
        )
    }

    /// Directory holding the backing files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Layout generation
    pub fn generation(&self) -> Generation {
        self.layout.generation
    }

    /// Geometry of the layout generation
    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    /// Content indices with an index file, master index excluded
    pub fn indices(&self) -> Vec<u8> {
        self.indices
            .keys()
            .copied()
            .filter(|&index| Some(index) != self.layout.master_index)
            .collect()
    }

    /// Number of archive slots in `index`, 0 when it has no index file
    pub fn archive_count(&self, index: u8) -> Result<u32> {
        match self.indices.get(&index) {
            Some(file) => Ok(file.read().len()?),
            None => Ok(0),
        }
    }

    /// Whether `index` holds the archive
    pub fn contains<'a>(&self, index: u8, archive: impl Into<ArchiveRef<'a>>) -> Result<bool> {
        let id = match archive.into() {
            ArchiveRef::Id(id) => id,
            ArchiveRef::Name(name) => match self.resolve(index, name)? {
                Some(id) => id,
                None => return Ok(false),
            },
        };
        let Some(file) = self.indices.get(&index) else {
            return Ok(false);
        };
        let entry = file.read().entry(id).map_err(io_error(index, id))?;
        Ok(entry.is_some())
    }

    /// Id of the archive named `name` in `index`
    ///
    /// Legacy stores only name the archives of index 0. Modern stores look
    /// the name up in the index's reference table.
    pub fn resolve(&self, index: u8, name: &str) -> Result<Option<u32>> {
        match self.layout.generation {
            Generation::Legacy => Ok((index == 0).then(|| legacy_archive_id(name)).flatten()),
            Generation::Modern => Ok(self
                .reference_table(index)?
                .and_then(|table| table.id_for_name(name))),
        }
    }

    /// Reference table of `index`, read from the master index
    ///
    /// `None` for legacy stores and for indices the master index does not
    /// describe. Tables are cached until the master index entry is rewritten.
    pub fn reference_table(&self, index: u8) -> Result<Option<Arc<ReferenceTable>>> {
        if let Some(table) = self.references.get(&index) {
            return Ok(Some(Arc::clone(table.value())));
        }
        self.reload_reference_table(index)
    }

    /// Read the reference table of `index` from disk and cache it
    ///
    /// The cache is filled while the master index read lock is held, so a
    /// table written concurrently is never replaced by an older copy.
    pub(crate) fn reload_reference_table(
        &self,
        index: u8,
    ) -> Result<Option<Arc<ReferenceTable>>> {
        let Some(master) = self.layout.master_index else {
            return Ok(None);
        };
        let Some(file) = self.indices.get(&master) else {
            return Ok(None);
        };
        let guard = file.read();
        let raw = match self.read_locked(&guard, master, u32::from(index)) {
            Ok(raw) => raw,
            Err(StorageError::NotFound { .. }) => {
                trace!("No reference table for index {}", index);
                self.references.remove(&index);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let table = ReferenceTable::decode(&raw)
            .map_err(|e| StorageError::corrupt(master, u32::from(index), e))?;
        let table = Arc::new(table);
        self.references.insert(index, Arc::clone(&table));
        drop(guard);
        Ok(Some(table))
    }

    /// Raw bytes of an archive as stored
    pub fn read_archive(&self, index: u8, archive: u32) -> Result<Vec<u8>> {
        let file = self
            .indices
            .get(&index)
            .ok_or(StorageError::NotFound { index, archive })?;
        self.read_locked(&file.read(), index, archive)
    }

    /// Index file of `index`
    pub(crate) fn index_file(&self, index: u8) -> Option<&IndexFile> {
        self.indices.get(&index)
    }

    /// Read an archive while the caller holds the index's read lock
    pub(crate) fn read_locked(
        &self,
        guard: &IndexReadGuard<'_>,
        index: u8,
        archive: u32,
    ) -> Result<Vec<u8>> {
        let entry = guard
            .entry(archive)
            .map_err(io_error(index, archive))?
            .ok_or(StorageError::NotFound { index, archive })?;
        self.read_chain(index, archive, entry)
    }

    /// Follow the sector chain of `entry`
    ///
    /// Traversal is bounded by the declared length: every hop consumes at
    /// least one byte of it, and the chunk counter rules out cycles.
    fn read_chain(&self, index: u8, archive: u32, entry: IndexEntry) -> Result<Vec<u8>> {
        let expected = entry.length as usize;
        let header_size = self.layout.header_size(archive);
        let payload_size = self.layout.payload_size(archive);
        let tag = self.layout.index_tag(index);

        let mut data = Vec::with_capacity(expected);
        let mut buf = [0u8; SECTOR_SIZE];
        let mut sector = entry.sector;
        let mut chunk: u16 = 0;

        while data.len() < expected {
            let truncated = |actual: usize| StorageError::TruncatedArchive {
                index,
                archive,
                expected: entry.length,
                actual: actual as u32,
            };
            if sector == 0 {
                return Err(truncated(data.len()));
            }

            let want = header_size + payload_size.min(expected - data.len());
            let offset = u64::from(sector) * SECTOR_SIZE as u64;
            let got = read_at_most(&self.data, &mut buf[..want], offset)
                .map_err(io_error(index, archive))?;

            let header = SectorHeader::parse(&self.layout, archive, &buf[..got]);
            if let Some(header) = header {
                header
                    .validate(archive, chunk, tag)
                    .map_err(|reason| StorageError::corrupt(index, archive, Corruption::Chain(reason)))?;
            }

            if got < want {
                let usable = got.saturating_sub(header_size);
                match self.config.length_policy {
                    LengthPolicy::Strict => return Err(truncated(data.len() + usable)),
                    LengthPolicy::Truncate => {
                        data.extend_from_slice(&buf[header_size.min(got)..got]);
                        warn!(
                            "Archive {}/{} runs past the end of the data file, keeping {} of {} bytes",
                            index,
                            archive,
                            data.len(),
                            expected
                        );
                        return Ok(data);
                    }
                }
            }

            data.extend_from_slice(&buf[header_size..want]);
            chunk = chunk.wrapping_add(1);
            sector = header.map_or(0, |h| h.next_sector);
        }

        trace!(
            "Read archive {}/{} ({} bytes, {} sectors)",
            index, archive, expected, chunk
        );
        Ok(data)
    }

    /// Store raw archive bytes
    ///
    /// The existing chain is reused while its headers validate and further
    /// sectors are appended to the data file. Reused sectors are overwritten
    /// in place, so a write that fails midway can leave the archive
    /// unreadable; the index entry is only updated once every sector is
    /// written. Writing an empty payload marks the archive absent.
    pub fn write_archive(&self, index: u8, archive: u32, bytes: &[u8]) -> Result<()> {
        let file = self.writable_index(index, archive)?;
        let guard = file.write();
        self.write_locked(&guard, index, archive, bytes)
    }

    /// Index file of `index` for a write, checking the access mode
    pub(crate) fn writable_index(&self, index: u8, archive: u32) -> Result<&IndexFile> {
        if !self.config.access.is_writable() {
            return Err(StorageError::ReadOnly);
        }
        self.indices
            .get(&index)
            .ok_or_else(|| StorageError::Unwritable {
                index,
                archive,
                reason: format!("index {index} has no index file"),
            })
    }

    /// Write an archive while the caller holds the index's write lock
    pub(crate) fn write_locked(
        &self,
        guard: &IndexWriteGuard<'_>,
        index: u8,
        archive: u32,
        bytes: &[u8],
    ) -> Result<()> {
        let unwritable = |reason: String| StorageError::Unwritable {
            index,
            archive,
            reason,
        };
        if archive > self.layout.max_archive_id() {
            return Err(unwritable(format!(
                "{} stores address at most {} archives",
                self.layout.generation,
                u64::from(self.layout.max_archive_id()) + 1
            )));
        }
        if bytes.len() > MAX_U24 as usize {
            return Err(unwritable(format!(
                "{} bytes exceed the 24-bit length field",
                bytes.len()
            )));
        }
        if u64::from(archive) * INDEX_ENTRY_SIZE as u64 + INDEX_ENTRY_SIZE as u64
            > u64::from(u32::MAX)
        {
            return Err(unwritable("index file would exceed 4 GiB".into()));
        }

        self.evict(index, archive);

        if bytes.is_empty() {
            guard
                .set_entry(archive, IndexEntry { length: 0, sector: 0 })
                .map_err(io_error(index, archive))?;
            debug!("Cleared archive {}/{}", index, archive);
            return Ok(());
        }

        let payload_size = self.layout.payload_size(archive);
        let chunks: Vec<&[u8]> = bytes.chunks(payload_size).collect();
        let mut sectors = self.existing_chain(guard, index, archive, chunks.len())?;
        let reused = sectors.len();
        sectors.extend(self.allocate(index, archive, chunks.len() - reused)?);

        let tag = self.layout.index_tag(index);
        let mut out = Vec::with_capacity(SECTOR_SIZE);
        for (chunk, part) in chunks.iter().enumerate() {
            let header = SectorHeader {
                archive,
                chunk: chunk as u16,
                next_sector: sectors.get(chunk + 1).copied().unwrap_or(0),
                index_tag: tag,
            };
            out.clear();
            header.write(&self.layout, &mut out);
            out.extend_from_slice(part);
            let offset = u64::from(sectors[chunk]) * SECTOR_SIZE as u64;
            write_all_at(&self.data, &out, offset).map_err(io_error(index, archive))?;
        }

        guard
            .set_entry(
                archive,
                IndexEntry {
                    length: bytes.len() as u32,
                    sector: sectors[0],
                },
            )
            .map_err(io_error(index, archive))?;

        debug!(
            "Wrote archive {}/{} ({} bytes, {} sectors reused, {} allocated)",
            index,
            archive,
            bytes.len(),
            reused,
            sectors.len() - reused
        );
        Ok(())
    }

    /// Sectors of the current chain that can be overwritten, at most `limit`
    fn existing_chain(
        &self,
        guard: &IndexWriteGuard<'_>,
        index: u8,
        archive: u32,
        limit: usize,
    ) -> Result<Vec<u32>> {
        let Some(entry) = guard.entry(archive).map_err(io_error(index, archive))? else {
            return Ok(Vec::new());
        };
        let header_size = self.layout.header_size(archive);
        let tag = self.layout.index_tag(index);
        let mut sectors = Vec::new();
        let mut sector = entry.sector;
        let mut buf = [0u8; SECTOR_SIZE];

        while sector != 0 && sectors.len() < limit {
            let offset = u64::from(sector) * SECTOR_SIZE as u64;
            let got = read_at_most(&self.data, &mut buf[..header_size], offset)
                .map_err(io_error(index, archive))?;
            let Some(header) = SectorHeader::parse(&self.layout, archive, &buf[..got]) else {
                break;
            };
            if header
                .validate(archive, sectors.len() as u16, tag)
                .is_err()
            {
                trace!(
                    "Chain of {}/{} stops validating at sector {}",
                    index, archive, sector
                );
                break;
            }
            sectors.push(sector);
            sector = header.next_sector;
        }
        Ok(sectors)
    }

    /// Reserve `count` fresh sectors past the end of the data file
    fn allocate(&self, index: u8, archive: u32, count: usize) -> Result<Vec<u32>> {
        let mut next_free = self.next_free.lock();
        let first = *next_free;
        let end = u64::from(first) + count as u64;
        if end > u64::from(MAX_U24) + 1 {
            return Err(StorageError::Unwritable {
                index,
                archive,
                reason: "data file has no addressable sectors left".into(),
            });
        }
        *next_free = end as u32;
        Ok((first..end as u32).collect())
    }

    /// Drop memoized state that a write to `(index, archive)` invalidates
    fn evict(&self, index: u8, archive: u32) {
        if self.memo.remove(&(index, archive)).is_some() {
            trace!("Evicted {}/{} from the memo", index, archive);
        }
        if Some(index) == self.layout.master_index
            && let Ok(described) = u8::try_from(archive)
        {
            self.references.remove(&described);
        }
    }

    /// CRC-32 of every archive slot of `index`, 0 for absent archives
    pub fn crc_list(&self, index: u8) -> Result<Vec<u32>> {
        let mut crcs = CrcAccumulator::new();
        for archive in 0..self.archive_count(index)? {
            match self.read_archive(index, archive) {
                Ok(raw) => {
                    crcs.push(&raw);
                }
                Err(StorageError::NotFound { .. }) => crcs.push_missing(),
                Err(e) => return Err(e),
            }
        }
        Ok(crcs.finish())
    }

    /// Flush pending writes and release the store
    pub fn close(self) -> Result<()> {
        if self.config.access.is_writable() {
            self.data.sync_data()?;
            for file in self.indices.values() {
                file.write().sync()?;
            }
        }
        self.memo.clear();
        info!("Closed store at {}", self.root.display());
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let released = self.memo.len();
        self.memo.clear();
        self.references.clear();
        debug!(
            "Released store at {} ({} memoized archives)",
            self.root.display(),
            released
        );
    }
}

fn io_error(index: u8, archive: u32) -> impl FnOnce(io::Error) -> StorageError {
    move |source| StorageError::ArchiveIo {
        index,
        archive,
        source,
    }
}
