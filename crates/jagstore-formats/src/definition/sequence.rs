//! Animation sequence definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode};
use crate::ioutils::ReadInt;

/// An animation sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDefinition {
    /// Sequence id
    pub id: u32,
    /// Duration of each frame in client ticks
    pub frame_lengths: Vec<u16>,
    /// Frame ids, `high << 16 | low`
    pub frame_ids: Vec<u32>,
    /// Frames to step back when looping
    pub frame_step: Option<u16>,
    /// Skeleton labels that animate in interleave mode
    pub interleave_order: Vec<u8>,
    /// Whether the animation stretches to fill its duration
    pub stretches: bool,
    /// Priority over other animations
    pub forced_priority: u8,
    /// Item shown in the left hand
    pub left_hand_item: Option<u16>,
    /// Item shown in the right hand
    pub right_hand_item: Option<u16>,
    /// Loop limit
    pub max_loops: u8,
    /// Behaviour while the entity moves
    pub precedence_animating: Option<u8>,
    /// Behaviour while another animation plays
    pub priority: Option<u8>,
    /// How a restart request is handled
    pub reply_mode: u8,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Frames,
    FrameStep,
    Interleave,
    Stretches,
    ForcedPriority,
    LeftHand,
    RightHand,
    MaxLoops,
    PrecedenceAnimating,
    Priority,
    ReplyMode,
}

impl SequenceDefinition {
    /// Total duration in client ticks
    pub fn duration(&self) -> u32 {
        self.frame_lengths.iter().map(|&l| u32::from(l)).sum()
    }
}

impl Definition for SequenceDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Sequence;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::Frames),
        Opcode::single(2, Field::FrameStep),
        Opcode::single(3, Field::Interleave),
        Opcode::single(4, Field::Stretches),
        Opcode::single(5, Field::ForcedPriority),
        Opcode::single(6, Field::LeftHand),
        Opcode::single(7, Field::RightHand),
        Opcode::single(8, Field::MaxLoops),
        Opcode::single(9, Field::PrecedenceAnimating),
        Opcode::single(10, Field::Priority),
        Opcode::single(11, Field::ReplyMode),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            frame_lengths: Vec::new(),
            frame_ids: Vec::new(),
            frame_step: None,
            interleave_order: Vec::new(),
            stretches: false,
            forced_priority: 5,
            left_hand_item: None,
            right_hand_item: None,
            max_loops: 99,
            precedence_animating: None,
            priority: None,
            reply_mode: 2,
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, _slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::Frames => {
                let count = buf.read_u16be()?;
                self.frame_lengths = (0..count)
                    .map(|_| buf.read_u16be())
                    .collect::<io::Result<_>>()?;
                let low = (0..count)
                    .map(|_| buf.read_u16be())
                    .collect::<io::Result<Vec<_>>>()?;
                self.frame_ids = Vec::with_capacity(low.len());
                for low in low {
                    let high = buf.read_u16be()?;
                    self.frame_ids.push((u32::from(high) << 16) | u32::from(low));
                }
            }
            Field::FrameStep => self.frame_step = Some(buf.read_u16be()?),
            Field::Interleave => {
                let count = buf.read_u8()?;
                self.interleave_order = (0..count)
                    .map(|_| buf.read_u8())
                    .collect::<io::Result<_>>()?;
            }
            Field::Stretches => self.stretches = true,
            Field::ForcedPriority => self.forced_priority = buf.read_u8()?,
            Field::LeftHand => self.left_hand_item = buf.read_u16_opt()?,
            Field::RightHand => self.right_hand_item = buf.read_u16_opt()?,
            Field::MaxLoops => self.max_loops = buf.read_u8()?,
            Field::PrecedenceAnimating => self.precedence_animating = Some(buf.read_u8()?),
            Field::Priority => self.priority = Some(buf.read_u8()?),
            Field::ReplyMode => self.reply_mode = buf.read_u8()?,
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
        test_support::assert_well_formed::<SequenceDefinition>();
    }

    #[test]
    fn test_frames() {
        let payload = [
            1, 0, 2, // two frames
            0, 4, 0, 6, // lengths
            0, 1, 0, 2, // low ids
            0, 0x10, 0, 0x10, // high ids
            6, 0xFF, 0xFF, // no left hand item
            7, 0x04, 0xD2, // right hand item 1234
            0,
        ];
        let seq: SequenceDefinition = decode_bytes(808, &payload, &DecoderOptions::default()).unwrap();
        assert_eq!(seq.frame_lengths, vec![4, 6]);
        assert_eq!(seq.frame_ids, vec![0x0010_0001, 0x0010_0002]);
        assert_eq!(seq.duration(), 10);
        assert_eq!(seq.left_hand_item, None);
        assert_eq!(seq.right_hand_item, Some(1234));
        assert_eq!(seq.max_loops, 99);
    }
}
