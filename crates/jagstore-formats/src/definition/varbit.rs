//! Bit variable definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode};
use crate::ioutils::ReadInt;

/// A bit range within a player variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarbitDefinition {
    /// Varbit id
    pub id: u32,
    /// Backing varp
    pub varp: u16,
    /// Lowest bit, inclusive
    pub low_bit: u8,
    /// Highest bit, inclusive
    pub high_bit: u8,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Bits,
}

impl VarbitDefinition {
    /// Mask of the bits the varbit spans, unshifted
    pub fn mask(&self) -> u32 {
        let width = u32::from(self.high_bit.saturating_sub(self.low_bit)) + 1;
        if width >= 32 {
            u32::MAX
        } else {
            (1 << width) - 1
        }
    }

    /// Extract the varbit value from its varp's value
    pub fn extract(&self, varp_value: u32) -> u32 {
        varp_value.checked_shr(u32::from(self.low_bit)).unwrap_or(0) & self.mask()
    }
}

impl Definition for VarbitDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Varbit;

    const OPCODES: &'static [Opcode<Field>] = &[Opcode::single(1, Field::Bits)];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            varp: 0,
            low_bit: 0,
            high_bit: 0,
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, _slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::Bits => {
                self.varp = buf.read_u16be()?;
                self.low_bit = buf.read_u8()?;
                self.high_bit = buf.read_u8()?;
            }
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
        test_support::assert_well_formed::<VarbitDefinition>();
    }

    #[test]
    fn test_extract() {
        let varbit: VarbitDefinition =
            decode_bytes(0, &[1, 0x01, 0x2C, 4, 7, 0], &DecoderOptions::default()).unwrap();
        assert_eq!(varbit.varp, 300);
        assert_eq!(varbit.mask(), 0b1111);
        assert_eq!(varbit.extract(0b1010_0000), 0b1010);

        let full = VarbitDefinition {
            low_bit: 0,
            high_bit: 31,
            ..varbit
        };
        assert_eq!(full.extract(u32::MAX), u32::MAX);
    }
}
