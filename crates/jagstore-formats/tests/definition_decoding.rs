#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Terminator and unknown-opcode properties of the definition engine

use std::io::Cursor;

use jagstore_formats::definition::{
    DecodeError, DecoderOptions, DefinitionKind, NpcDefinition, ObjectDefinition,
    VarbitDefinition, decode,
};
use jagstore_formats::ioutils::WriteInt;
use proptest::prelude::*;

/// Encode an NPC record from a few fields
fn npc_record(name: &str, size: u8, combat: Option<u16>, actions: &[(u8, String)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u8(2).unwrap();
    out.write_cstring(name).unwrap();
    out.write_u8(12).unwrap();
    out.write_u8(size).unwrap();
    if let Some(level) = combat {
        out.write_u8(95).unwrap();
        out.write_u16be(level).unwrap();
    }
    for (slot, action) in actions {
        out.write_u8(30 + slot).unwrap();
        out.write_cstring(action).unwrap();
    }
    out.write_u8(0).unwrap();
    out
}

proptest! {
    #[test]
    fn npc_decode_stops_after_terminator(
        name in "[A-Za-z ]{0,20}",
        size in 1u8..5,
        combat in proptest::option::of(any::<u16>()),
        actions in proptest::collection::vec((0u8..5, "[A-Za-z-]{1,10}"), 0..5),
        trailer in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let record = npc_record(&name, size, combat, &actions);
        let mut stream = record.clone();
        stream.extend_from_slice(&trailer);

        let mut cursor = Cursor::new(&stream[..]);
        let npc: NpcDefinition = decode(7, &mut cursor, &DecoderOptions::default()).unwrap();
        prop_assert_eq!(cursor.position() as usize, record.len());
        prop_assert_eq!(npc.name, name);
        prop_assert_eq!(npc.size, size);
        prop_assert_eq!(npc.combat_level, combat);
    }

    #[test]
    fn varbit_rejects_every_unknown_opcode(opcode in 2u8..=255) {
        let stream = [opcode, 0, 0, 0, 0, 0];
        let err = decode::<VarbitDefinition>(1, &mut Cursor::new(&stream[..]), &DecoderOptions::default())
            .unwrap_err();
        let is_unknown = matches!(
            err,
            DecodeError::UnknownOpcode { kind: DefinitionKind::Varbit, opcode: o, .. } if o == opcode
        );
        prop_assert!(is_unknown);
    }
}

#[test]
fn unknown_opcode_after_valid_fields_is_not_partial_success() {
    let mut stream = Vec::new();
    stream.write_u8(2).unwrap();
    stream.write_cstring("Bronze dagger").unwrap();
    stream.write_u8(200).unwrap();
    stream.write_u8(0).unwrap();

    let result = decode::<ObjectDefinition>(1205, &mut Cursor::new(&stream[..]), &DecoderOptions::default());
    match result {
        Err(DecodeError::UnknownOpcode {
            opcode,
            kind,
            id,
            offset,
        }) => {
            assert_eq!(opcode, 200);
            assert_eq!(kind, DefinitionKind::Object);
            assert_eq!(id, 1205);
            assert_eq!(offset, 15);
        }
        other => panic!("expected unknown opcode, got {other:?}"),
    }
}

#[test]
fn records_decode_back_to_back() {
    let mut stream = npc_record("Guard", 1, Some(21), &[(1, "Attack".into())]);
    stream.extend(npc_record("Banker", 1, None, &[(0, "Talk-to".into()), (2, "Bank".into())]));

    let mut cursor = Cursor::new(&stream[..]);
    let options = DecoderOptions::default();
    let guard: NpcDefinition = decode(0, &mut cursor, &options).unwrap();
    let banker: NpcDefinition = decode(1, &mut cursor, &options).unwrap();

    assert_eq!(guard.combat_level, Some(21));
    assert_eq!(guard.actions[1].as_deref(), Some("Attack"));
    assert_eq!(banker.actions[2].as_deref(), Some("Bank"));
    assert_eq!(cursor.position() as usize, stream.len());
}
