//! Terrain floor definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode};
use crate::ioutils::ReadInt;

/// A terrain floor (underlay/overlay colour and texture)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorDefinition {
    /// Floor id
    pub id: u32,
    /// Base colour, 0xRRGGBB
    pub rgb: u32,
    /// Texture id
    pub texture: Option<u8>,
    /// Whether the floor hides what is beneath it
    pub occlude: bool,
    /// Name
    pub name: Option<String>,
    /// Colour used on the minimap
    pub secondary_rgb: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Rgb,
    Texture,
    Unused,
    NoOcclude,
    Name,
    SecondaryRgb,
}

impl Definition for FloorDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Floor;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::Rgb),
        Opcode::single(2, Field::Texture),
        Opcode::single(3, Field::Unused),
        Opcode::single(5, Field::NoOcclude),
        Opcode::single(6, Field::Name),
        Opcode::single(7, Field::SecondaryRgb),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            rgb: 0,
            texture: None,
            occlude: true,
            name: None,
            secondary_rgb: None,
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, _slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::Rgb => self.rgb = buf.read_u24be()?,
            Field::Texture => self.texture = Some(buf.read_u8()?),
            Field::Unused => {}
            Field::NoOcclude => self.occlude = false,
            Field::Name => self.name = Some(buf.read_cstring()?),
            Field::SecondaryRgb => self.secondary_rgb = Some(buf.read_u24be()?),
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
        test_support::assert_well_formed::<FloorDefinition>();
    }

    #[test]
    fn test_decode() {
        let payload = [1, 0x12, 0x34, 0x56, 2, 9, 3, 5, 6, b'g', b'r', b'a', b's', b's', 0, 0];
        let floor: FloorDefinition = decode_bytes(4, &payload, &DecoderOptions::default()).unwrap();
        assert_eq!(floor.rgb, 0x0012_3456);
        assert_eq!(floor.texture, Some(9));
        assert!(!floor.occlude);
        assert_eq!(floor.name.as_deref(), Some("grass"));
        assert_eq!(floor.secondary_rgb, None);
    }
}
