//! Opcode-tagged definition records
//!
//! Every entity family is stored the same way: a sequence of
//! `(u8 opcode, payload)` pairs terminated by opcode `0`. One generic
//! engine, [`decode`], owns that loop. Entity types implement
//! [`Definition`] by providing a static opcode table mapping opcodes (or
//! opcode ranges) to a closed `Field` enum, and a `match` over that enum
//! that reads the payload.
//!
//! Ranges are used for array-valued fields written one element per
//! opcode, e.g. identikit opcodes 40-49 set `original_colours[op - 40]`.
//! The engine passes `op - first` to the entity as the slot.

mod error;
mod floor;
mod identikit;
mod legacy;
mod location;
mod npc;
mod object;
mod params;
mod sequence;
mod spot_animation;
mod varbit;

pub use error::{DecodeError, DecodeResult};
pub use floor::FloorDefinition;
pub use identikit::IdentikitDefinition;
pub use legacy::LegacyDefinitionIndex;
pub use location::{AmbientSound, LocationDefinition, RandomAmbientSounds};
pub use npc::NpcDefinition;
pub use object::{ObjectDefinition, StackVariant};
pub use params::{ParamValue, Params, Transforms};
pub use sequence::SequenceDefinition;
pub use spot_animation::SpotAnimationDefinition;
pub use varbit::VarbitDefinition;

use std::fmt;
use std::io::{self, Cursor};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ioutils::ReadInt;

/// Archive ids of definition families within the modern CONFIG index
pub mod config_archive {
    /// Terrain underlays
    pub const UNDERLAY: u32 = 1;
    /// Identikit (player appearance) kits
    pub const IDENTIKIT: u32 = 3;
    /// Terrain overlays (floors)
    pub const OVERLAY: u32 = 4;
    /// Locations (scenery objects)
    pub const LOCATION: u32 = 6;
    /// NPCs
    pub const NPC: u32 = 9;
    /// Items
    pub const OBJECT: u32 = 10;
    /// Animation sequences
    pub const SEQUENCE: u32 = 12;
    /// Spot animations (graphics)
    pub const SPOT_ANIMATION: u32 = 13;
    /// Bit-packed variables
    pub const VARBIT: u32 = 14;
}

/// Definition families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Terrain floor
    Floor,
    /// Identikit
    Identikit,
    /// Animation sequence
    Sequence,
    /// Spot animation
    SpotAnimation,
    /// Bit variable
    Varbit,
    /// NPC
    Npc,
    /// Item
    Object,
    /// Location
    Location,
}

impl DefinitionKind {
    /// Every family
    pub const ALL: [Self; 8] = [
        Self::Floor,
        Self::Identikit,
        Self::Sequence,
        Self::SpotAnimation,
        Self::Varbit,
        Self::Npc,
        Self::Object,
        Self::Location,
    ];

    /// Archive id in the modern CONFIG index
    pub const fn config_archive(self) -> u32 {
        match self {
            Self::Floor => config_archive::OVERLAY,
            Self::Identikit => config_archive::IDENTIKIT,
            Self::Sequence => config_archive::SEQUENCE,
            Self::SpotAnimation => config_archive::SPOT_ANIMATION,
            Self::Varbit => config_archive::VARBIT,
            Self::Npc => config_archive::NPC,
            Self::Object => config_archive::OBJECT,
            Self::Location => config_archive::LOCATION,
        }
    }

    /// Entry name stem in the legacy `config` archive
    pub const fn legacy_name(self) -> &'static str {
        match self {
            Self::Floor => "flo",
            Self::Identikit => "idk",
            Self::Sequence => "seq",
            Self::SpotAnimation => "spotanim",
            Self::Varbit => "varbit",
            Self::Npc => "npc",
            Self::Object => "obj",
            Self::Location => "loc",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Floor => "floor",
            Self::Identikit => "identikit",
            Self::Sequence => "sequence",
            Self::SpotAnimation => "spot animation",
            Self::Varbit => "varbit",
            Self::Npc => "npc",
            Self::Object => "object",
            Self::Location => "location",
        })
    }
}

/// Maps an opcode range to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode<F> {
    /// First opcode, inclusive
    pub first: u8,
    /// Last opcode, inclusive
    pub last: u8,
    /// Field the opcodes populate
    pub field: F,
}

impl<F> Opcode<F> {
    /// A single opcode
    pub const fn single(opcode: u8, field: F) -> Self {
        Self {
            first: opcode,
            last: opcode,
            field,
        }
    }

    /// An inclusive opcode range, one array slot per opcode
    pub const fn range(first: u8, last: u8, field: F) -> Self {
        Self { first, last, field }
    }

    /// Whether `opcode` falls in this entry
    pub const fn matches(&self, opcode: u8) -> bool {
        opcode >= self.first && opcode <= self.last
    }
}

/// Find the field and slot for an opcode
pub fn lookup<F: Copy>(table: &[Opcode<F>], opcode: u8) -> Option<(F, usize)> {
    table
        .iter()
        .find(|entry| entry.matches(opcode))
        .map(|entry| (entry.field, usize::from(opcode - entry.first)))
}

/// A record type decoded by the opcode engine
pub trait Definition: Sized {
    /// Closed set of fields the opcode table can address
    type Field: Copy + fmt::Debug + 'static;

    /// Family this type decodes
    const KIND: DefinitionKind;

    /// Opcode table; opcode 0 must not appear
    const OPCODES: &'static [Opcode<Self::Field>];

    /// Default-valued record for `id`
    fn with_id(id: u32) -> Self;

    /// Record id
    fn id(&self) -> u32;

    /// Read the payload of `field` and store it
    ///
    /// `slot` is the offset of the opcode within its table range.
    fn read_field(
        &mut self,
        field: Self::Field,
        slot: usize,
        buf: &mut Cursor<&[u8]>,
    ) -> io::Result<()>;
}

/// What to do with an opcode missing from the entity's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOpcodePolicy {
    /// Fail with [`DecodeError::UnknownOpcode`]
    #[default]
    Fail,
    /// Log and treat the next byte as an opcode
    Skip,
}

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecoderOptions {
    /// Policy for unknown opcodes
    pub unknown_opcodes: UnknownOpcodePolicy,
}

impl DecoderOptions {
    /// Options that skip unknown opcodes
    pub fn lenient() -> Self {
        Self {
            unknown_opcodes: UnknownOpcodePolicy::Skip,
        }
    }

    /// Set the unknown-opcode policy
    pub fn with_unknown_opcodes(mut self, policy: UnknownOpcodePolicy) -> Self {
        self.unknown_opcodes = policy;
        self
    }
}

/// Decode one record, leaving `buf` just past its terminating opcode
pub fn decode<D: Definition>(
    id: u32,
    buf: &mut Cursor<&[u8]>,
    options: &DecoderOptions,
) -> DecodeResult<D> {
    let mut definition = D::with_id(id);
    loop {
        let offset = buf.position();
        let opcode = buf.read_u8().map_err(|_| DecodeError::MissingTerminator {
            kind: D::KIND,
            id,
            offset,
        })?;
        if opcode == 0 {
            return Ok(definition);
        }

        match lookup(D::OPCODES, opcode) {
            Some((field, slot)) => {
                definition
                    .read_field(field, slot, buf)
                    .map_err(|source| DecodeError::TruncatedField {
                        opcode,
                        kind: D::KIND,
                        id,
                        offset,
                        source,
                    })?;
            }
            None if options.unknown_opcodes == UnknownOpcodePolicy::Skip => {
                warn!(
                    kind = %D::KIND,
                    id,
                    opcode,
                    offset,
                    "skipping unknown definition opcode"
                );
            }
            None => {
                return Err(DecodeError::UnknownOpcode {
                    opcode,
                    kind: D::KIND,
                    id,
                    offset,
                });
            }
        }
    }
}

/// Decode one record from a complete payload
pub fn decode_bytes<D: Definition>(
    id: u32,
    payload: &[u8],
    options: &DecoderOptions,
) -> DecodeResult<D> {
    decode(id, &mut Cursor::new(payload), options)
}

/// Colour or texture substitution pairs: `u8 n`, then `n x (u16 from, u16 to)`
pub(crate) fn read_substitutions(buf: &mut Cursor<&[u8]>) -> io::Result<Vec<(u16, u16)>> {
    let count = buf.read_u8()?;
    (0..count)
        .map(|_| Ok((buf.read_u16be()?, buf.read_u16be()?)))
        .collect()
}

/// Model list: `u8 n`, then `n x u16`
pub(crate) fn read_models(buf: &mut Cursor<&[u8]>) -> io::Result<Vec<u16>> {
    let count = buf.read_u8()?;
    (0..count).map(|_| buf.read_u16be()).collect()
}

/// Menu action string, where `hidden` means no action
pub(crate) fn read_action(buf: &mut Cursor<&[u8]>) -> io::Result<Option<String>> {
    let action = buf.read_cstring()?;
    Ok((!action.eq_ignore_ascii_case("hidden")).then_some(action))
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_slot() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum F {
            A,
            B,
        }
        let table = [Opcode::single(1, F::A), Opcode::range(40, 49, F::B)];
        assert_eq!(lookup(&table, 1), Some((F::A, 0)));
        assert_eq!(lookup(&table, 43), Some((F::B, 3)));
        assert_eq!(lookup(&table, 50), None);
    }

    #[test]
    fn test_terminator_position() {
        let payload = [2, b'H', b'i', 0, 0, 0xAA];
        let mut cursor = Cursor::new(&payload[..]);
        let npc: NpcDefinition = decode(1, &mut cursor, &DecoderOptions::default()).unwrap();
        assert_eq!(npc.name, "Hi");
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_unknown_opcode_fails() {
        let err = decode_bytes::<VarbitDefinition>(3, &[2, 0], &DecoderOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownOpcode {
                opcode: 2,
                kind: DefinitionKind::Varbit,
                id: 3,
                offset: 0,
            }
        ));
    }

    #[test]
    fn test_unknown_opcode_skipped_when_lenient() {
        let varbit: VarbitDefinition =
            decode_bytes(3, &[2, 1, 0, 5, 2, 9, 0], &DecoderOptions::lenient()).unwrap();
        assert_eq!(varbit.varp, 5);
        assert_eq!(varbit.low_bit, 2);
        assert_eq!(varbit.high_bit, 9);
    }

    #[test]
    fn test_missing_terminator() {
        let err = decode_bytes::<FloorDefinition>(0, &[1, 0, 0, 1], &DecoderOptions::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingTerminator { offset: 4, .. }));
    }

    #[test]
    fn test_truncated_field() {
        let err = decode_bytes::<NpcDefinition>(0, &[95, 1], &DecoderOptions::default())
            .unwrap_err();
        assert_eq!(err.opcode(), Some(95));
        assert!(matches!(err, DecodeError::TruncatedField { .. }));
    }

    fn static_table<D: Definition>() -> (DefinitionKind, &'static [Opcode<D::Field>]) {
        (D::KIND, D::OPCODES)
    }

    #[test]
    fn test_tables_are_static_for_every_family() {
        let tables = [
            static_table::<FloorDefinition>().0,
            static_table::<IdentikitDefinition>().0,
            static_table::<SequenceDefinition>().0,
            static_table::<SpotAnimationDefinition>().0,
            static_table::<VarbitDefinition>().0,
            static_table::<NpcDefinition>().0,
            static_table::<ObjectDefinition>().0,
            static_table::<LocationDefinition>().0,
        ];
        assert_eq!(tables.to_vec(), DefinitionKind::ALL.to_vec());
        assert!(!static_table::<NpcDefinition>().1.is_empty());
        assert!(!static_table::<LocationDefinition>().1.is_empty());
    }

    #[test]
    fn test_hidden_action() {
        let payload = b"hidden\0Talk-to\0";
        let mut cursor = Cursor::new(&payload[..]);
        assert_eq!(read_action(&mut cursor).unwrap(), None);
        assert_eq!(read_action(&mut cursor).unwrap().as_deref(), Some("Talk-to"));
    }
}
