//! Identikit (player appearance kit) definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode, read_models};
use crate::ioutils::ReadInt;

/// Number of recolour slots
pub const COLOUR_SLOTS: usize = 10;

/// Number of chat head model slots
pub const HEAD_MODEL_SLOTS: usize = 10;

/// A player appearance kit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentikitDefinition {
    /// Kit id
    pub id: u32,
    /// Body part the kit dresses
    pub body_part: Option<u8>,
    /// Body models
    pub models: Vec<u16>,
    /// Whether the kit is offered in character design
    pub selectable: bool,
    /// Colours replaced on the models
    pub original_colours: [u16; COLOUR_SLOTS],
    /// Replacement colours
    pub replacement_colours: [u16; COLOUR_SLOTS],
    /// Chat head models
    pub head_models: [Option<u16>; HEAD_MODEL_SLOTS],
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    BodyPart,
    Models,
    NotSelectable,
    OriginalColour,
    ReplacementColour,
    HeadModel,
}

impl Definition for IdentikitDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Identikit;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::BodyPart),
        Opcode::single(2, Field::Models),
        Opcode::single(3, Field::NotSelectable),
        Opcode::range(40, 49, Field::OriginalColour),
        Opcode::range(50, 59, Field::ReplacementColour),
        Opcode::range(60, 69, Field::HeadModel),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            body_part: None,
            models: Vec::new(),
            selectable: true,
            original_colours: [0; COLOUR_SLOTS],
            replacement_colours: [0; COLOUR_SLOTS],
            head_models: [None; HEAD_MODEL_SLOTS],
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::BodyPart => self.body_part = Some(buf.read_u8()?),
            Field::Models => self.models = read_models(buf)?,
            Field::NotSelectable => self.selectable = false,
            Field::OriginalColour => self.original_colours[slot] = buf.read_u16be()?,
            Field::ReplacementColour => self.replacement_colours[slot] = buf.read_u16be()?,
            Field::HeadModel => self.head_models[slot] = Some(buf.read_u16be()?),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::{DecoderOptions, decode_bytes, test_support};

    #[test]
    fn test_table() {
        test_support::assert_well_formed::<IdentikitDefinition>();
    }

    #[test]
    fn test_indexed_opcodes() {
        let payload = [
            1, 3, // body part
            2, 2, 0, 10, 0, 11, // models
            42, 0x12, 0x34, // original colour slot 2
            52, 0x56, 0x78, // replacement colour slot 2
            69, 0, 99, // head model slot 9
            0,
        ];
        let kit: IdentikitDefinition = decode_bytes(0, &payload, &DecoderOptions::default()).unwrap();
        assert_eq!(kit.body_part, Some(3));
        assert_eq!(kit.models, vec![10, 11]);
        assert_eq!(kit.original_colours[2], 0x1234);
        assert_eq!(kit.replacement_colours[2], 0x5678);
        assert_eq!(kit.head_models[9], Some(99));
        assert_eq!(kit.head_models[0], None);
        assert!(kit.selectable);
    }
}
