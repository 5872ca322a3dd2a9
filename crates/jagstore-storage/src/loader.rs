//! Crypto-aware archive loading
//!
//! [`Store::load`] turns stored bytes into a decoded [`Archive`]: it refuses
//! encrypted map archives without a key, verifies checksums, decrypts,
//! decodes and memoizes the result until the archive is rewritten or the
//! store is released. Typed lookups for definitions, map regions and CRC
//! lists are built on top of it.

use jagstore_crypto::keys::{RegionId, XteaKeyProvider};
use jagstore_crypto::{XteaKey, crc32, djb2, xtea};
use jagstore_formats::archive::{Archive, CompressionType, PLAIN_HEADER_LEN};
use jagstore_formats::compression::Algorithm;
use jagstore_formats::crc_list::{self, CrcList, IndexType, VERSIONLIST_ARCHIVE, VERSIONLIST_INDEX};
use jagstore_formats::definition::{self, Definition, LegacyDefinitionIndex};
use jagstore_formats::reference::ReferenceTable;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace, warn};

use crate::layout::{Generation, LEGACY_CONFIG_ARCHIVE, modern_index};
use crate::store::Store;
use crate::{Corruption, Result, StorageError};

/// [`djb2`] hashes of every `l{x}_{y}` region name
fn location_hashes() -> &'static HashSet<i32> {
    static HASHES: OnceLock<HashSet<i32>> = OnceLock::new();
    HASHES.get_or_init(|| {
        (0..=u8::MAX)
            .flat_map(|x| (0..=u8::MAX).map(move |y| RegionId::from_coords(x, y)))
            .map(|region| djb2(&region.locations_name()))
            .collect()
    })
}

impl Store {
    /// Whether the archive is stored encrypted
    ///
    /// Only map location archives of a modern store are, recognized by their
    /// name hash in the MAPS reference table.
    pub fn requires_key(&self, index: u8, archive: u32) -> Result<bool> {
        if self.generation() != Generation::Modern || index != modern_index::MAPS {
            return Ok(false);
        }
        let Some(table) = self.reference_table(index)? else {
            return Ok(false);
        };
        Ok(table
            .get(archive)
            .and_then(|entry| entry.name_hash)
            .is_some_and(|hash| location_hashes().contains(&hash)))
    }

    /// Load and decode an archive
    ///
    /// `key` is applied to everything after the plaintext framing header;
    /// pass [`XteaKey::NONE`] for unencrypted archives.
    pub fn load(&self, index: u8, archive: u32, key: XteaKey) -> Result<Arc<Archive>> {
        if key.is_none() && self.requires_key(index, archive)? {
            warn!("Archive {}/{} requires an XTEA key", index, archive);
            return Err(StorageError::MissingKey { index, archive });
        }

        let file = self
            .index_file(index)
            .ok_or(StorageError::NotFound { index, archive })?;
        // Holding the index lock keeps a concurrent write from slipping in
        // between the read and the memo insert.
        let guard = file.read();
        if self.config().memoize
            && let Some(hit) = self.memo.get(&(index, archive))
        {
            trace!("Memo hit for {}/{}", index, archive);
            return Ok(Arc::clone(hit.value()));
        }

        let mut raw = self.read_locked(&guard, index, archive)?;
        self.verify(index, archive, &raw)?;
        if !key.is_none() && raw.len() > PLAIN_HEADER_LEN {
            xtea::decrypt(&mut raw[PLAIN_HEADER_LEN..], &key);
        }
        let decoded =
            Archive::decode(&raw).map_err(|e| StorageError::from_archive(index, archive, e))?;
        let decoded = Arc::new(decoded);

        if self.config().memoize {
            trace!("Memo miss for {}/{}", index, archive);
            self.memo.insert((index, archive), Arc::clone(&decoded));
        }
        drop(guard);
        Ok(decoded)
    }

    /// Load an archive by name
    pub fn load_named(&self, index: u8, name: &str, key: XteaKey) -> Result<Arc<Archive>> {
        let archive = self
            .resolve(index, name)?
            .ok_or_else(|| StorageError::NameNotFound {
                index,
                name: name.to_owned(),
            })?;
        self.load(index, archive, key)
    }

    /// Number of memoized archives
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Drop every memoized archive
    pub fn clear_memo(&self) {
        self.memo.clear();
    }

    fn verify(&self, index: u8, archive: u32, raw: &[u8]) -> Result<()> {
        if !self.config().verify_checksums {
            return Ok(());
        }
        match self.generation() {
            Generation::Modern => {
                if Some(index) == self.layout().master_index {
                    return Ok(());
                }
                let Some(table) = self.reference_table(index)? else {
                    return Ok(());
                };
                if table.verify(archive, raw).is_ok() {
                    return Ok(());
                }
                // The cached table may predate a rewrite of the master index.
                debug!("Re-reading reference table {} to verify archive {}", index, archive);
                match self.reload_reference_table(index)? {
                    Some(table) => table
                        .verify(archive, raw)
                        .map_err(|e| StorageError::corrupt(index, archive, e)),
                    None => Ok(()),
                }
            }
            Generation::Legacy => {
                let Some(index_type) = IndexType::from_store_index(index) else {
                    return Ok(());
                };
                let Some(expected) = self.recorded_crc(index_type, archive)? else {
                    return Ok(());
                };
                let actual = crc32(raw);
                if expected != 0 && expected != actual {
                    return Err(StorageError::corrupt(
                        index,
                        archive,
                        Corruption::Crc { expected, actual },
                    ));
                }
                Ok(())
            }
        }
    }

    /// CRC the versionlist records for a legacy archive, if any
    fn recorded_crc(&self, index_type: IndexType, archive: u32) -> Result<Option<u32>> {
        let versionlist = match self.load(VERSIONLIST_INDEX, VERSIONLIST_ARCHIVE, XteaKey::NONE) {
            Ok(versionlist) => versionlist,
            Err(StorageError::NotFound { .. }) => {
                trace!("No versionlist, skipping CRC check of {}", index_type);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let Some(payload) = versionlist.get_named(&index_type.crc_entry_name()) else {
            return Ok(None);
        };
        let list = CrcList::from_payload(index_type, payload)
            .map_err(|e| StorageError::corrupt(VERSIONLIST_INDEX, VERSIONLIST_ARCHIVE, e))?;
        Ok(list.get(archive))
    }

    /// Encode, encrypt and store an archive
    ///
    /// In a modern store the index's reference table is updated with the
    /// new CRC, digest and version before the index lock is released, so
    /// concurrent loads see either the old archive and table or the new
    /// ones.
    pub fn store_archive(
        &self,
        index: u8,
        archive: u32,
        contents: &Archive,
        layout: CompressionType,
        algorithm: Algorithm,
        key: XteaKey,
    ) -> Result<()> {
        let raw = encode(index, archive, contents, layout, algorithm, &key)?;
        let file = self.writable_index(index, archive)?;
        let guard = file.write();
        self.write_locked(&guard, index, archive, &raw)?;
        self.record_reference(index, archive, None, &raw)?;
        drop(guard);
        Ok(())
    }

    /// Store an archive under a name, returning its id
    ///
    /// An existing archive of that name is replaced. Otherwise a modern
    /// store assigns the next free id; legacy stores only accept the fixed
    /// names of index 0.
    pub fn store_named(
        &self,
        index: u8,
        name: &str,
        contents: &Archive,
        layout: CompressionType,
        algorithm: Algorithm,
        key: XteaKey,
    ) -> Result<u32> {
        let file = match self.writable_index(index, 0) {
            Ok(file) => file,
            Err(StorageError::Unwritable { reason, .. }) => {
                let archive = self.resolve(index, name)?.unwrap_or(0);
                return Err(StorageError::Unwritable {
                    index,
                    archive,
                    reason,
                });
            }
            Err(e) => return Err(e),
        };
        // Ids are assigned under the index lock so two new names never
        // share one.
        let guard = file.write();
        let archive = match self.resolve(index, name)? {
            Some(id) => id,
            None if self.generation() == Generation::Modern => self
                .reference_table(index)?
                .and_then(|table| table.iter().map(|entry| entry.id).max())
                .map_or(0, |id| id + 1),
            None => {
                return Err(StorageError::NameNotFound {
                    index,
                    name: name.to_owned(),
                });
            }
        };
        let raw = encode(index, archive, contents, layout, algorithm, &key)?;
        self.write_locked(&guard, index, archive, &raw)?;
        self.record_reference(index, archive, Some(name), &raw)?;
        drop(guard);
        Ok(archive)
    }

    /// Record stored bytes in the reference table of `index`
    ///
    /// The table is written and cached under the master index write lock.
    fn record_reference(
        &self,
        index: u8,
        archive: u32,
        name: Option<&str>,
        raw: &[u8],
    ) -> Result<()> {
        let Some(master) = self.layout().master_index else {
            return Ok(());
        };
        if index == master {
            return Ok(());
        }
        let Some(file) = self.index_file(master) else {
            return Err(StorageError::Unwritable {
                index: master,
                archive: u32::from(index),
                reason: format!("index {master} has no index file"),
            });
        };
        let _serialized = self.reference_writes.lock();
        let mut table = self
            .reference_table(index)?
            .map_or_else(ReferenceTable::default, |table| (*table).clone());
        table.record(archive, name, raw);
        let bytes = table.encode().map_err(|e| StorageError::Unwritable {
            index: master,
            archive: u32::from(index),
            reason: e.to_string(),
        })?;

        let guard = file.write();
        self.write_locked(&guard, master, u32::from(index), &bytes)?;
        self.references.insert(index, Arc::new(table));
        drop(guard);
        Ok(())
    }

    /// Decode definition `id` of family `D`
    ///
    /// Returns `Ok(None)` when the family has no record with that id.
    pub fn definition<D: Definition>(&self, id: u32) -> Result<Option<D>> {
        let options = self.config().decoder_options();
        match self.generation() {
            Generation::Modern => {
                let archive = D::KIND.config_archive();
                let config = self.load(modern_index::CONFIG, archive, XteaKey::NONE)?;
                let Some(record) = i32::try_from(id).ok().and_then(|entry| config.get(entry))
                else {
                    return Ok(None);
                };
                definition::decode::<D>(id, &mut Cursor::new(record), &options)
                    .map(Some)
                    .map_err(|e| StorageError::from_decode(modern_index::CONFIG, archive, id, e))
            }
            Generation::Legacy => {
                let (index, dat) = self.legacy_sources::<D>()?;
                index
                    .decode::<D>(&dat, id, &options)
                    .map_err(|e| StorageError::from_decode(0, LEGACY_CONFIG_ARCHIVE, id, e))
            }
        }
    }

    /// Decode every definition of family `D`, in id order
    pub fn definitions<D: Definition>(&self) -> Result<Vec<D>> {
        let options = self.config().decoder_options();
        match self.generation() {
            Generation::Modern => {
                let archive = D::KIND.config_archive();
                let config = self.load(modern_index::CONFIG, archive, XteaKey::NONE)?;
                let mut records: Vec<(u32, &[u8])> = config
                    .iter()
                    .filter_map(|entry| {
                        u32::try_from(entry.id)
                            .ok()
                            .map(|id| (id, entry.data.as_slice()))
                    })
                    .collect();
                records.sort_unstable_by_key(|&(id, _)| id);
                records
                    .into_iter()
                    .map(|(id, record)| {
                        definition::decode::<D>(id, &mut Cursor::new(record), &options).map_err(|e| {
                            StorageError::from_decode(modern_index::CONFIG, archive, id, e)
                        })
                    })
                    .collect()
            }
            Generation::Legacy => {
                let (index, dat) = self.legacy_sources::<D>()?;
                (0..index.len() as u32)
                    .filter_map(|id| {
                        index
                            .decode::<D>(&dat, id, &options)
                            .map_err(|e| {
                                StorageError::from_decode(0, LEGACY_CONFIG_ARCHIVE, id, e)
                            })
                            .transpose()
                    })
                    .collect()
            }
        }
    }

    /// Record offsets and data of family `D` from the legacy `config` archive
    fn legacy_sources<D: Definition>(&self) -> Result<(LegacyDefinitionIndex, Vec<u8>)> {
        let config = self.load(0, LEGACY_CONFIG_ARCHIVE, XteaKey::NONE)?;
        let malformed = |source| StorageError::MalformedDefinition {
            index: 0,
            archive: LEGACY_CONFIG_ARCHIVE,
            entry: 0,
            source,
        };
        let index = LegacyDefinitionIndex::from_config::<D>(&config).map_err(malformed)?;
        let name = format!("{}.dat", D::KIND.legacy_name());
        let dat = config.get_named(&name).ok_or_else(|| {
            malformed(definition::DecodeError::LegacyIndex {
                kind: D::KIND,
                reason: format!("config archive has no {name} entry"),
            })
        })?;
        Ok((index, dat.to_vec()))
    }

    /// Terrain archive of a map region, `None` when the region has none
    ///
    /// Map archives are only addressable by name in a modern store.
    pub fn map_terrain(&self, x: u8, y: u8) -> Result<Option<Arc<Archive>>> {
        let name = RegionId::from_coords(x, y).terrain_name();
        self.load_map(&name, XteaKey::NONE)
    }

    /// Location archive of a map region, decrypted with `key`
    pub fn map_locations(&self, x: u8, y: u8, key: XteaKey) -> Result<Option<Arc<Archive>>> {
        let name = RegionId::from_coords(x, y).locations_name();
        self.load_map(&name, key)
    }

    /// Location archive of a map region, with its key taken from `keys`
    pub fn map_locations_with<P: XteaKeyProvider>(
        &self,
        keys: &P,
        x: u8,
        y: u8,
    ) -> Result<Option<Arc<Archive>>> {
        let key = keys
            .region_key(RegionId::from_coords(x, y))
            .unwrap_or(XteaKey::NONE);
        self.map_locations(x, y, key)
    }

    fn load_map(&self, name: &str, key: XteaKey) -> Result<Option<Arc<Archive>>> {
        if self.generation() != Generation::Modern {
            return Ok(None);
        }
        match self.resolve(modern_index::MAPS, name)? {
            Some(archive) => self.load(modern_index::MAPS, archive, key).map(Some),
            None => {
                debug!("No map archive named {}", name);
                Ok(None)
            }
        }
    }

    /// CRC lists recorded in the legacy versionlist archive
    ///
    /// Modern stores keep CRCs in their reference tables and return an
    /// empty list.
    pub fn stored_crc_lists(&self) -> Result<Vec<CrcList>> {
        if self.generation() != Generation::Legacy {
            return Ok(Vec::new());
        }
        let versionlist = self.load(VERSIONLIST_INDEX, VERSIONLIST_ARCHIVE, XteaKey::NONE)?;
        crc_list::decode(&versionlist, &IndexType::ALL)
            .map_err(|e| StorageError::corrupt(VERSIONLIST_INDEX, VERSIONLIST_ARCHIVE, e))
    }

    /// Recompute the CRC lists of a legacy store and write them to the
    /// versionlist archive, keeping its other entries
    pub fn rebuild_crc_lists(&self, layout: CompressionType, algorithm: Algorithm) -> Result<()> {
        if self.generation() != Generation::Legacy {
            return Ok(());
        }
        let lists = IndexType::ALL
            .iter()
            .map(|&index_type| {
                self.crc_list(index_type.store_index())
                    .map(|crcs| CrcList::new(index_type, crcs))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut versionlist =
            match self.load(VERSIONLIST_INDEX, VERSIONLIST_ARCHIVE, XteaKey::NONE) {
                Ok(existing) => (*existing).clone(),
                Err(StorageError::NotFound { .. }) => Archive::new(),
                Err(e) => return Err(e),
            };
        for entry in crc_list::encode(&lists) {
            versionlist.insert(entry.id, entry.data);
        }
        self.store_archive(
            VERSIONLIST_INDEX,
            VERSIONLIST_ARCHIVE,
            &versionlist,
            layout,
            algorithm,
            XteaKey::NONE,
        )
    }
}

fn encode(
    index: u8,
    archive: u32,
    contents: &Archive,
    layout: CompressionType,
    algorithm: Algorithm,
    key: &XteaKey,
) -> Result<Vec<u8>> {
    let mut raw = contents
        .encode(layout, algorithm)
        .map_err(|source| StorageError::Encode {
            index,
            archive,
            source,
        })?;
    if !key.is_none() && raw.len() > PLAIN_HEADER_LEN {
        xtea::encrypt(&mut raw[PLAIN_HEADER_LEN..], key);
    }
    Ok(raw)
}
