//! Spot animation (graphic effect) definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode, read_substitutions};
use crate::ioutils::ReadInt;

/// A spot animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotAnimationDefinition {
    /// Spot animation id
    pub id: u32,
    /// Model id
    pub model: u16,
    /// Sequence played on the model
    pub animation: Option<u16>,
    /// Horizontal scale, 128 is unscaled
    pub resize_x: u16,
    /// Vertical scale, 128 is unscaled
    pub resize_y: u16,
    /// Rotation in 2048ths of a turn
    pub rotation: u16,
    /// Lighting ambient term
    pub ambient: u8,
    /// Lighting contrast term
    pub contrast: u8,
    /// Colour substitutions `(from, to)`
    pub recolours: Vec<(u16, u16)>,
    /// Texture substitutions `(from, to)`
    pub retextures: Vec<(u16, u16)>,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Model,
    Animation,
    ResizeX,
    ResizeY,
    Rotation,
    Ambient,
    Contrast,
    Recolours,
    Retextures,
}

impl Definition for SpotAnimationDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::SpotAnimation;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::Model),
        Opcode::single(2, Field::Animation),
        Opcode::single(4, Field::ResizeX),
        Opcode::single(5, Field::ResizeY),
        Opcode::single(6, Field::Rotation),
        Opcode::single(7, Field::Ambient),
        Opcode::single(8, Field::Contrast),
        Opcode::single(40, Field::Recolours),
        Opcode::single(41, Field::Retextures),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            model: 0,
            animation: None,
            resize_x: 128,
            resize_y: 128,
            rotation: 0,
            ambient: 0,
            contrast: 0,
            recolours: Vec::new(),
            retextures: Vec::new(),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, _slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::Model => self.model = buf.read_u16be()?,
            Field::Animation => self.animation = buf.read_u16_opt()?,
            Field::ResizeX => self.resize_x = buf.read_u16be()?,
            Field::ResizeY => self.resize_y = buf.read_u16be()?,
            Field::Rotation => self.rotation = buf.read_u16be()?,
            Field::Ambient => self.ambient = buf.read_u8()?,
            Field::Contrast => self.contrast = buf.read_u8()?,
            Field::Recolours => self.recolours = read_substitutions(buf)?,
            Field::Retextures => self.retextures = read_substitutions(buf)?,
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
        test_support::assert_well_formed::<SpotAnimationDefinition>();
    }

    #[test]
    fn test_decode() {
        let payload = [1, 0x0B, 0xB8, 2, 0xFF, 0xFF, 4, 0, 64, 40, 1, 0, 1, 0, 2, 0];
        let spot: SpotAnimationDefinition =
            decode_bytes(1, &payload, &DecoderOptions::default()).unwrap();
        assert_eq!(spot.model, 3000);
        assert_eq!(spot.animation, None);
        assert_eq!(spot.resize_x, 64);
        assert_eq!(spot.resize_y, 128);
        assert_eq!(spot.recolours, vec![(1, 2)]);
    }
}
