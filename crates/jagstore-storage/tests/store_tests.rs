#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end tests against store fixtures built in temporary directories

use jagstore_crypto::keys::{RegionId, XteaKeyStore};
use jagstore_crypto::{XteaKey, crc32};
use jagstore_formats::archive::{Archive, CompressionType};
use jagstore_formats::compression::Algorithm;
use jagstore_formats::crc_list::IndexType;
use jagstore_formats::definition::{DefinitionKind, NpcDefinition, UnknownOpcodePolicy};
use jagstore_storage::layout::SECTOR_SIZE;
use jagstore_storage::{
    Corruption, Generation, LengthPolicy, StorageError, Store, StoreConfig,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: u8 = 2;
const MAPS: u8 = 5;
const NPC_ARCHIVE: u32 = 9;

fn npc_config_archive() -> Archive {
    let mut archive = Archive::new();
    archive.insert(0, b"\x02Tool Leprechaun\0\0".to_vec());
    archive.insert(1, vec![200, 0]);
    archive.insert(3, b"\x02Guard\0\x0C\x02\0".to_vec());
    archive
}

/// A modern store with the NPC config archive
fn modern_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(dir.path(), Generation::Modern, &[CONFIG, MAPS]).unwrap();
    store
        .store_archive(
            CONFIG,
            NPC_ARCHIVE,
            &npc_config_archive(),
            CompressionType::Whole,
            Algorithm::Gzip,
            XteaKey::NONE,
        )
        .unwrap();
    store.close().unwrap();
    dir
}

fn set_len(path: &Path, len: u64) {
    OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_len(len)
        .unwrap();
}

#[test]
fn test_npc_zero_is_tool_leprechaun() {
    let dir = modern_fixture();
    let store = Store::open_path(dir.path()).unwrap();
    assert_eq!(store.generation(), Generation::Modern);

    let npc = store.definition::<NpcDefinition>(0).unwrap().unwrap();
    assert_eq!(npc.id, 0);
    assert_eq!(npc.name, "Tool Leprechaun");

    let guard = store.definition::<NpcDefinition>(3).unwrap().unwrap();
    assert_eq!(guard.name, "Guard");
    assert_eq!(guard.size, 2);

    assert!(store.definition::<NpcDefinition>(2).unwrap().is_none());
}

#[test]
fn test_unknown_opcode_names_the_record() {
    let dir = modern_fixture();
    let store = Store::open_path(dir.path()).unwrap();

    let err = store.definition::<NpcDefinition>(1).unwrap_err();
    match err {
        StorageError::UnknownOpcode {
            index,
            archive,
            entry,
            opcode,
            kind,
        } => {
            assert_eq!((index, archive, entry), (CONFIG, NPC_ARCHIVE, 1));
            assert_eq!(opcode, 200);
            assert_eq!(kind, DefinitionKind::Npc);
        }
        other => panic!("expected UnknownOpcode, got {other}"),
    }
    assert!(store.definitions::<NpcDefinition>().is_err());
}

#[test]
fn test_skip_policy_decodes_past_unknown_opcodes() {
    let dir = modern_fixture();
    let store = Store::open(
        StoreConfig::new(dir.path()).with_unknown_opcodes(UnknownOpcodePolicy::Skip),
    )
    .unwrap();

    let all = store.definitions::<NpcDefinition>().unwrap();
    let ids: Vec<u32> = all.iter().map(|npc| npc.id).collect();
    assert_eq!(ids, vec![0, 1, 3]);
}

#[test]
fn test_index_without_data_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main_file_cache.idx255"), []).unwrap();
    fs::write(dir.path().join("main_file_cache.idx0"), []).unwrap();

    let err = Store::open_path(dir.path()).unwrap_err();
    assert!(
        matches!(err, StorageError::InvalidStore { .. }),
        "unexpected error: {err}"
    );
    assert!(err.is_fatal_for_store());
}

#[test]
fn test_file_instead_of_directory_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main_file_cache.dat2");
    fs::write(&file, []).unwrap();

    assert!(matches!(
        Store::open_path(&file),
        Err(StorageError::InvalidStore { .. })
    ));
    assert!(matches!(
        Store::open_path(dir.path().join("missing")),
        Err(StorageError::InvalidStore { .. })
    ));
}

#[test]
fn test_missing_required_index_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main_file_cache.dat"), []).unwrap();
    for index in 0..4 {
        fs::write(dir.path().join(format!("main_file_cache.idx{index}")), []).unwrap();
    }

    let err = Store::open_path(dir.path()).unwrap_err();
    assert!(err.to_string().contains("idx4"), "unexpected error: {err}");
}

#[test]
fn test_generation_detection() {
    let modern = tempfile::tempdir().unwrap();
    Store::create(modern.path(), Generation::Modern, &[]).unwrap();
    let legacy = tempfile::tempdir().unwrap();
    Store::create(legacy.path(), Generation::Legacy, &[]).unwrap();

    assert_eq!(
        Store::open_path(modern.path()).unwrap().generation(),
        Generation::Modern
    );
    let legacy = Store::open_path(legacy.path()).unwrap();
    assert_eq!(legacy.generation(), Generation::Legacy);
    assert_eq!(legacy.indices(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_short_chain_is_truncated_archive() {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..1500u32).map(|i| (i * 7) as u8).collect();
    {
        let store = Store::create(dir.path(), Generation::Modern, &[CONFIG]).unwrap();
        store.write_archive(CONFIG, 0, &payload).unwrap();
        store.close().unwrap();
    }
    // Keep the third sector's header and 92 bytes of its payload
    set_len(
        &dir.path().join("main_file_cache.dat2"),
        3 * SECTOR_SIZE as u64 + 100,
    );

    let strict = Store::open_path(dir.path()).unwrap();
    match strict.read_archive(CONFIG, 0).unwrap_err() {
        StorageError::TruncatedArchive {
            index,
            archive,
            expected,
            actual,
        } => {
            assert_eq!((index, archive), (CONFIG, 0));
            assert_eq!(expected, 1500);
            assert_eq!(actual, 1116);
        }
        other => panic!("expected TruncatedArchive, got {other}"),
    }

    let lenient = Store::open(
        StoreConfig::new(dir.path()).with_length_policy(LengthPolicy::Truncate),
    )
    .unwrap();
    let partial = lenient.read_archive(CONFIG, 0).unwrap();
    assert_eq!(partial.len(), 1116);
    assert_eq!(partial.as_slice(), &payload[..1116]);
}

#[test]
fn test_chain_ending_early_is_truncated_under_both_policies() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Store::create(dir.path(), Generation::Modern, &[CONFIG]).unwrap();
        store.write_archive(CONFIG, 0, &[1u8; 600]).unwrap();
        store.write_archive(CONFIG, 1, &[2u8; 600]).unwrap();
        store.close().unwrap();
    }
    // Declare archive 0 as 1100 bytes; its chain stops after two sectors
    let idx = dir.path().join("main_file_cache.idx2");
    let mut entries = fs::read(&idx).unwrap();
    entries[..3].copy_from_slice(&[0x00, 0x04, 0x4C]);
    fs::write(&idx, entries).unwrap();

    for policy in [LengthPolicy::Strict, LengthPolicy::Truncate] {
        let store = Store::open(StoreConfig::new(dir.path()).with_length_policy(policy)).unwrap();
        assert!(matches!(
            store.read_archive(CONFIG, 0),
            Err(StorageError::TruncatedArchive {
                expected: 1100,
                actual: 1024,
                ..
            })
        ));
    }
}

#[test]
fn test_cross_linked_chain_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Store::create(dir.path(), Generation::Modern, &[CONFIG]).unwrap();
        store.write_archive(CONFIG, 0, &[1u8; 600]).unwrap();
        store.write_archive(CONFIG, 1, &[2u8; 600]).unwrap();
        store.close().unwrap();
    }
    // Point archive 1 at archive 0's first sector
    let idx = dir.path().join("main_file_cache.idx2");
    let mut entries = fs::read(&idx).unwrap();
    entries[9..12].copy_from_slice(&[0, 0, 1]);
    fs::write(&idx, entries).unwrap();

    let store = Store::open_path(dir.path()).unwrap();
    let err = store.read_archive(CONFIG, 1).unwrap_err();
    assert!(matches!(
        err,
        StorageError::CorruptArchive {
            index: CONFIG,
            archive: 1,
            source: Corruption::Chain(_),
        }
    ));
    assert!(err.is_per_archive());
    assert_eq!(store.read_archive(CONFIG, 0).unwrap(), vec![1u8; 600]);
}

#[test]
fn test_partial_index_entry_depends_on_policy() {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = modern_fixture();
    let idx = dir.path().join("main_file_cache.idx2");
    let mut entries = fs::read(&idx).unwrap();
    entries.extend_from_slice(&[0, 0]);
    fs::write(&idx, entries).unwrap();

    assert!(matches!(
        Store::open_path(dir.path()),
        Err(StorageError::InvalidStore { .. })
    ));

    let store = Store::open(
        StoreConfig::new(dir.path()).with_length_policy(LengthPolicy::Truncate),
    )
    .unwrap();
    let npc = store.definition::<NpcDefinition>(0).unwrap().unwrap();
    assert_eq!(npc.name, "Tool Leprechaun");
}

#[test]
fn test_memo_is_store_scoped_and_evicted_on_write() {
    let dir = modern_fixture();
    let store = Store::open(StoreConfig::new(dir.path()).writable()).unwrap();
    assert_eq!(store.memo_len(), 0);

    let first = store.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE).unwrap();
    let second = store.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.memo_len(), 1);

    let mut replacement = Archive::new();
    replacement.insert(0, b"\x02Hans\0\0".to_vec());
    store
        .store_archive(
            CONFIG,
            NPC_ARCHIVE,
            &replacement,
            CompressionType::PerEntry,
            Algorithm::Bzip2,
            XteaKey::NONE,
        )
        .unwrap();
    assert_eq!(store.memo_len(), 0);

    let npc = store.definition::<NpcDefinition>(0).unwrap().unwrap();
    assert_eq!(npc.name, "Hans");
    assert_eq!(store.memo_len(), 1);

    store.clear_memo();
    assert_eq!(store.memo_len(), 0);
    store.close().unwrap();

    let reopened = Store::open_path(dir.path()).unwrap();
    assert_eq!(reopened.memo_len(), 0);
    assert_eq!(*reopened.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE).unwrap(), replacement);
}

#[test]
fn test_memo_can_be_disabled() {
    let dir = modern_fixture();
    let store = Store::open(StoreConfig::new(dir.path()).with_memoize(false)).unwrap();
    let first = store.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE).unwrap();
    let second = store.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
    assert_eq!(store.memo_len(), 0);
}

#[test]
fn test_reference_table_detects_tampering() {
    let dir = modern_fixture();
    {
        let store = Store::open(StoreConfig::new(dir.path()).writable()).unwrap();
        let mut other = Archive::new();
        other.insert(0, b"\x02Imposter\0\0".to_vec());
        let raw = other
            .encode(CompressionType::Uncompressed, Algorithm::None)
            .unwrap();
        // Raw writes bypass the reference table
        store.write_archive(CONFIG, NPC_ARCHIVE, &raw).unwrap();
        store.close().unwrap();
    }

    let store = Store::open_path(dir.path()).unwrap();
    assert!(matches!(
        store.load(CONFIG, NPC_ARCHIVE, XteaKey::NONE),
        Err(StorageError::CorruptArchive {
            source: Corruption::Reference(_),
            ..
        })
    ));

    let unchecked =
        Store::open(StoreConfig::new(dir.path()).with_verify_checksums(false)).unwrap();
    let npc = unchecked.definition::<NpcDefinition>(0).unwrap().unwrap();
    assert_eq!(npc.name, "Imposter");
}

#[test]
fn test_encrypted_map_locations() {
    let dir = tempfile::tempdir().unwrap();
    let key = XteaKey::new([0x1234_5678, 0x9ABC_DEF0, 42, 7]);
    let mut locations = Archive::new();
    locations.insert(0, b"location records spanning several cipher blocks".to_vec());
    let mut terrain = Archive::new();
    terrain.insert(0, vec![0u8; 300]);
    {
        let store = Store::create(dir.path(), Generation::Modern, &[MAPS]).unwrap();
        let terrain_id = store
            .store_named(MAPS, "m50_50", &terrain, CompressionType::Whole, Algorithm::Gzip, XteaKey::NONE)
            .unwrap();
        let locations_id = store
            .store_named(MAPS, "l50_50", &locations, CompressionType::Whole, Algorithm::Gzip, key)
            .unwrap();
        assert_eq!((terrain_id, locations_id), (0, 1));
        store.close().unwrap();
    }

    let store = Store::open_path(dir.path()).unwrap();
    assert!(store.contains(MAPS, "l50_50").unwrap());
    assert!(!store.contains(MAPS, "l51_50").unwrap());
    assert!(store.requires_key(MAPS, 1).unwrap());
    assert!(!store.requires_key(MAPS, 0).unwrap());

    assert_eq!(*store.map_terrain(50, 50).unwrap().unwrap(), terrain);
    assert!(store.map_terrain(10, 10).unwrap().is_none());

    assert!(matches!(
        store.map_locations(50, 50, XteaKey::NONE),
        Err(StorageError::MissingKey {
            index: MAPS,
            archive: 1
        })
    ));
    assert_eq!(*store.map_locations(50, 50, key).unwrap().unwrap(), locations);

    let mut keys = XteaKeyStore::new();
    keys.insert(RegionId::from_coords(50, 50), key);
    assert_eq!(
        *store.map_locations_with(&keys, 50, 50).unwrap().unwrap(),
        locations
    );
}

#[test]
fn test_wrong_key_fails_the_archive_only() {
    let dir = tempfile::tempdir().unwrap();
    let key = XteaKey::new([1, 2, 3, 4]);
    let mut locations = Archive::new();
    locations.insert(0, vec![7u8; 64]);
    {
        let store = Store::create(dir.path(), Generation::Modern, &[MAPS]).unwrap();
        store
            .store_named(MAPS, "l12_34", &locations, CompressionType::Whole, Algorithm::Gzip, key)
            .unwrap();
        store.close().unwrap();
    }

    let store = Store::open_path(dir.path()).unwrap();
    let err = store
        .map_locations(12, 34, XteaKey::new([4, 3, 2, 1]))
        .unwrap_err();
    assert!(err.is_per_archive(), "unexpected error: {err}");
    assert_eq!(store.memo_len(), 0);
}

/// A legacy store with a config archive and two model archives
fn legacy_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(dir.path(), Generation::Legacy, &[]).unwrap();

    let mut dat = vec![0, 2];
    dat.extend_from_slice(b"\x02Hans\0\0");
    dat.extend_from_slice(b"\x02Man\0\x0C\x02\0");
    let mut config = Archive::new();
    config.insert_named("npc.dat", dat);
    config.insert_named("npc.idx", vec![0, 2, 0, 7, 0, 8]);
    let id = store
        .store_named(0, "config", &config, CompressionType::Whole, Algorithm::Bzip2, XteaKey::NONE)
        .unwrap();
    assert_eq!(id, 2);

    for model in 0..2u32 {
        let mut archive = Archive::new();
        archive.insert(0, vec![model as u8; 100]);
        store
            .store_archive(1, model, &archive, CompressionType::Whole, Algorithm::Gzip, XteaKey::NONE)
            .unwrap();
    }
    store
        .rebuild_crc_lists(CompressionType::Whole, Algorithm::Gzip)
        .unwrap();
    store.close().unwrap();
    dir
}

#[test]
fn test_legacy_definitions() {
    let dir = legacy_fixture();
    let store = Store::open_path(dir.path()).unwrap();
    assert!(store.contains(0, "config").unwrap());

    let all = store.definitions::<NpcDefinition>().unwrap();
    let names: Vec<&str> = all.iter().map(|npc| npc.name.as_str()).collect();
    assert_eq!(names, vec!["Hans", "Man"]);
    assert_eq!(all[1].size, 2);

    assert_eq!(
        store.definition::<NpcDefinition>(1).unwrap().unwrap().name,
        "Man"
    );
    assert!(store.definition::<NpcDefinition>(2).unwrap().is_none());
}

#[test]
fn test_legacy_crc_lists_match_archives() {
    let dir = legacy_fixture();
    let store = Store::open_path(dir.path()).unwrap();

    let lists = store.stored_crc_lists().unwrap();
    assert_eq!(lists.len(), IndexType::ALL.len());
    let models = &lists[0];
    assert_eq!(models.index_type, IndexType::Model);
    assert_eq!(models.crcs, store.crc_list(1).unwrap());
    assert_eq!(
        models.get(1),
        Some(crc32(&store.read_archive(1, 1).unwrap()))
    );
    assert!(lists[1].crcs.is_empty());

    // Verified loads pass
    store.load(1, 0, XteaKey::NONE).unwrap();
}

#[test]
fn test_legacy_crc_mismatch_is_corrupt() {
    let dir = legacy_fixture();
    let store = Store::open(StoreConfig::new(dir.path()).writable()).unwrap();
    let mut changed = Archive::new();
    changed.insert(0, vec![9u8; 100]);
    let raw = changed
        .encode(CompressionType::Whole, Algorithm::Gzip)
        .unwrap();
    store.write_archive(1, 0, &raw).unwrap();

    assert!(matches!(
        store.load(1, 0, XteaKey::NONE),
        Err(StorageError::CorruptArchive {
            index: 1,
            archive: 0,
            source: Corruption::Crc { .. },
        })
    ));
}

#[test]
fn test_read_only_store_refuses_writes() {
    let dir = modern_fixture();
    let store = Store::open_path(dir.path()).unwrap();
    assert!(matches!(
        store.write_archive(CONFIG, 0, b"data"),
        Err(StorageError::ReadOnly)
    ));
    assert!(matches!(
        store.store_archive(
            CONFIG,
            0,
            &Archive::new(),
            CompressionType::Uncompressed,
            Algorithm::None,
            XteaKey::NONE
        ),
        Err(StorageError::ReadOnly)
    ));
}

#[test]
fn test_missing_archive_is_not_found() {
    let dir = modern_fixture();
    let store = Store::open_path(dir.path()).unwrap();
    assert!(matches!(
        store.load(CONFIG, 40, XteaKey::NONE),
        Err(StorageError::NotFound {
            index: CONFIG,
            archive: 40
        })
    ));
    assert!(matches!(
        store.load(77, 0, XteaKey::NONE),
        Err(StorageError::NotFound { index: 77, .. })
    ));
    assert!(matches!(
        store.load_named(MAPS, "m1_1", XteaKey::NONE),
        Err(StorageError::NameNotFound { .. })
    ));
}

#[test]
fn test_concurrent_reads_across_indices() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(dir.path(), Generation::Modern, &[0, 1, 2, 3]).unwrap();
    for index in 0..4u8 {
        for archive in 0..8u32 {
            let payload = vec![index ^ archive as u8; 700 + archive as usize * 37];
            store.write_archive(index, archive, &payload).unwrap();
        }
    }

    std::thread::scope(|scope| {
        for index in 0..4u8 {
            let store = &store;
            scope.spawn(move || {
                for archive in 0..8u32 {
                    let data = store.read_archive(index, archive).unwrap();
                    assert_eq!(data.len(), 700 + archive as usize * 37);
                    assert!(data.iter().all(|&b| b == index ^ archive as u8));
                }
            });
        }
    });
}

fn versioned_archive(version: u8) -> Archive {
    let mut archive = Archive::new();
    archive.insert(0, vec![version; 900 + usize::from(version % 7) * 260]);
    archive
}

#[test]
fn test_loads_during_rewrites_of_the_same_archive() {
    let dir = tempfile::tempdir().unwrap();
    Store::create(dir.path(), Generation::Modern, &[CONFIG])
        .unwrap()
        .close()
        .unwrap();
    let store = Store::open(
        StoreConfig::new(dir.path())
            .writable()
            .with_memoize(false),
    )
    .unwrap();
    let store_version = |version: u8| {
        store
            .store_archive(
                CONFIG,
                0,
                &versioned_archive(version),
                CompressionType::Whole,
                Algorithm::Gzip,
                XteaKey::NONE,
            )
            .unwrap();
    };
    store_version(0);

    let done = std::sync::atomic::AtomicBool::new(false);
    let loads = std::thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let (store, done) = (&store, &done);
                scope.spawn(move || {
                    let mut loads = 0usize;
                    while !done.load(std::sync::atomic::Ordering::Relaxed) {
                        let archive = store.load(CONFIG, 0, XteaKey::NONE).unwrap();
                        let payload = archive.get(0).unwrap();
                        let version = payload[0];
                        assert_eq!(payload, versioned_archive(version).get(0).unwrap());
                        loads += 1;
                    }
                    loads
                })
            })
            .collect();
        for version in 1..=200u8 {
            store_version(version);
        }
        done.store(true, std::sync::atomic::Ordering::Relaxed);
        readers
            .into_iter()
            .map(|reader| reader.join().unwrap())
            .sum::<usize>()
    });

    assert!(loads > 0);
    let last = store.load(CONFIG, 0, XteaKey::NONE).unwrap();
    assert_eq!(last.get(0).unwrap()[0], 200);
    let table = store.reference_table(CONFIG).unwrap().unwrap();
    assert_eq!(table.get(0).unwrap().version, 201);
}

#[test]
fn test_named_stores_never_share_an_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(dir.path(), Generation::Modern, &[MAPS]).unwrap();

    std::thread::scope(|scope| {
        for x in 0..4u8 {
            let store = &store;
            scope.spawn(move || {
                for y in 0..6u8 {
                    store
                        .store_named(
                            MAPS,
                            &RegionId::from_coords(x, y).terrain_name(),
                            &versioned_archive(x * 10 + y),
                            CompressionType::Uncompressed,
                            Algorithm::None,
                            XteaKey::NONE,
                        )
                        .unwrap();
                }
            });
        }
    });

    let mut ids = Vec::new();
    for x in 0..4u8 {
        for y in 0..6u8 {
            let terrain = store.map_terrain(x, y).unwrap().unwrap();
            assert_eq!(terrain.get(0).unwrap()[0], x * 10 + y);
            ids.push(store.resolve(MAPS, &RegionId::from_coords(x, y).terrain_name()).unwrap());
        }
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 24);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_write_read_round_trip(
        writes in proptest::collection::vec(
            (0u32..6, proptest::collection::vec(any::<u8>(), 1..2000)),
            1..8,
        )
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), Generation::Modern, &[CONFIG]).unwrap();
        let mut expected = std::collections::BTreeMap::new();
        for (archive, payload) in writes {
            store.write_archive(CONFIG, archive, &payload).unwrap();
            expected.insert(archive, payload);
        }
        for (archive, payload) in &expected {
            prop_assert_eq!(&store.read_archive(CONFIG, *archive).unwrap(), payload);
        }
    }
}
