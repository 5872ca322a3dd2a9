#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Round-trip properties of the archive and CRC list codecs

use jagstore_formats::archive::{Archive, ArchiveEntry, CompressionType};
use jagstore_formats::compression::Algorithm;
use jagstore_formats::crc_list::{self, CrcList, IndexType};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn layouts() -> impl Strategy<Value = (CompressionType, Algorithm)> {
    prop_oneof![
        Just((CompressionType::Uncompressed, Algorithm::None)),
        Just((CompressionType::Whole, Algorithm::Bzip2)),
        Just((CompressionType::Whole, Algorithm::Gzip)),
        Just((CompressionType::Whole, Algorithm::Lzma)),
        Just((CompressionType::PerEntry, Algorithm::Bzip2)),
        Just((CompressionType::PerEntry, Algorithm::Gzip)),
        Just((CompressionType::PerEntry, Algorithm::Lzma)),
    ]
}

fn archives() -> impl Strategy<Value = Archive> {
    proptest::collection::btree_map(
        any::<i32>(),
        proptest::collection::vec(any::<u8>(), 0..300),
        0..12,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, data)| ArchiveEntry::new(id, data))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn archive_round_trip(archive in archives(), (layout, algorithm) in layouts()) {
        let bytes = archive.encode(layout, algorithm).unwrap();
        let decoded = Archive::decode(&bytes).unwrap();
        prop_assert_eq!(&decoded, &archive);
        prop_assert_eq!(decoded.encode(layout, algorithm).unwrap(), bytes);
    }

    #[test]
    fn archive_truncation_never_decodes(archive in archives(), (layout, algorithm) in layouts(), cut in 1usize..64) {
        let bytes = archive.encode(layout, algorithm).unwrap();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(Archive::decode(&bytes[..keep]).is_err());
    }
}

#[test]
fn versionlist_archive_round_trip() {
    let lists = vec![
        CrcList::new(IndexType::Model, vec![1, 2, 3]),
        CrcList::new(IndexType::Anim, vec![]),
        CrcList::new(IndexType::Midi, vec![0xFFFF_FFFF]),
        CrcList::new(IndexType::Map, vec![0xDEAD_BEEF, 0]),
    ];

    let archive: Archive = crc_list::encode(&lists).into_iter().collect();
    let bytes = archive.encode(CompressionType::Whole, Algorithm::Bzip2).unwrap();
    let decoded = Archive::decode(&bytes).unwrap();

    assert_eq!(crc_list::decode(&decoded, &IndexType::ALL).unwrap(), lists);
    assert_eq!(decoded.get_named("midi_crc"), Some(&[0xFF, 0xFF, 0xFF, 0xFF][..]));
}
