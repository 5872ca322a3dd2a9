//! NPC definitions

use std::io::{self, Cursor};

use super::{
    Definition, DefinitionKind, Opcode, Params, Transforms, read_action, read_models,
    read_substitutions,
};
use crate::ioutils::ReadInt;

/// Number of right-click action slots
pub const ACTION_SLOTS: usize = 5;

/// A non-player character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcDefinition {
    /// NPC id
    pub id: u32,
    /// Body models
    pub models: Vec<u16>,
    /// Display name
    pub name: String,
    /// Tiles occupied along each axis
    pub size: u8,
    /// Idle sequence
    pub standing_animation: Option<u16>,
    /// Walking sequence
    pub walk_animation: Option<u16>,
    /// Sequence when turning left on the spot
    pub rotate_left_animation: Option<u16>,
    /// Sequence when turning right on the spot
    pub rotate_right_animation: Option<u16>,
    /// Sequence when walking backwards
    pub rotate_180_animation: Option<u16>,
    /// Sequence when strafing left
    pub rotate_90_left_animation: Option<u16>,
    /// Sequence when strafing right
    pub rotate_90_right_animation: Option<u16>,
    /// Menu actions, `None` where hidden or absent
    pub actions: [Option<String>; ACTION_SLOTS],
    /// Colour substitutions `(from, to)`
    pub recolours: Vec<(u16, u16)>,
    /// Texture substitutions `(from, to)`
    pub retextures: Vec<(u16, u16)>,
    /// Chat head models
    pub chathead_models: Vec<u16>,
    /// Whether the NPC shows as a minimap dot
    pub minimap_visible: bool,
    /// Combat level
    pub combat_level: Option<u16>,
    /// Horizontal scale, 128 is unscaled
    pub width_scale: u16,
    /// Vertical scale, 128 is unscaled
    pub height_scale: u16,
    /// Drawn over other entities on the same tile
    pub render_priority: bool,
    /// Lighting ambient term
    pub ambient: i8,
    /// Lighting contrast term
    pub contrast: i8,
    /// Overhead icon
    pub head_icon: Option<u16>,
    /// Turning speed
    pub rotation_speed: u16,
    /// Variable-driven appearance switch
    pub transforms: Option<Transforms>,
    /// Whether the NPC can be clicked
    pub interactable: bool,
    /// Whether the NPC turns to face its target
    pub rotation_flag: bool,
    /// Whether the NPC is a follower
    pub pet: bool,
    /// Script parameters
    pub params: Params,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Models,
    Name,
    Size,
    StandingAnimation,
    WalkAnimation,
    RotateLeftAnimation,
    RotateRightAnimation,
    WalkAnimations,
    Action,
    Recolours,
    Retextures,
    ChatheadModels,
    HiddenOnMinimap,
    CombatLevel,
    WidthScale,
    HeightScale,
    RenderPriority,
    Ambient,
    Contrast,
    HeadIcon,
    RotationSpeed,
    Transforms,
    NotInteractable,
    NoRotation,
    Pet,
    TransformsWithDefault,
    Params,
}

impl NpcDefinition {
    /// Whether the NPC has a menu action with this text
    pub fn has_action(&self, action: &str) -> bool {
        self.actions
            .iter()
            .flatten()
            .any(|a| a.eq_ignore_ascii_case(action))
    }
}

impl Definition for NpcDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Npc;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::Models),
        Opcode::single(2, Field::Name),
        Opcode::single(12, Field::Size),
        Opcode::single(13, Field::StandingAnimation),
        Opcode::single(14, Field::WalkAnimation),
        Opcode::single(15, Field::RotateLeftAnimation),
        Opcode::single(16, Field::RotateRightAnimation),
        Opcode::single(17, Field::WalkAnimations),
        Opcode::range(30, 34, Field::Action),
        Opcode::single(40, Field::Recolours),
        Opcode::single(41, Field::Retextures),
        Opcode::single(60, Field::ChatheadModels),
        Opcode::single(93, Field::HiddenOnMinimap),
        Opcode::single(95, Field::CombatLevel),
        Opcode::single(97, Field::WidthScale),
        Opcode::single(98, Field::HeightScale),
        Opcode::single(99, Field::RenderPriority),
        Opcode::single(100, Field::Ambient),
        Opcode::single(101, Field::Contrast),
        Opcode::single(102, Field::HeadIcon),
        Opcode::single(103, Field::RotationSpeed),
        Opcode::single(106, Field::Transforms),
        Opcode::single(107, Field::NotInteractable),
        Opcode::single(109, Field::NoRotation),
        Opcode::single(111, Field::Pet),
        Opcode::single(118, Field::TransformsWithDefault),
        Opcode::single(249, Field::Params),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            models: Vec::new(),
            name: String::from("null"),
            size: 1,
            standing_animation: None,
            walk_animation: None,
            rotate_left_animation: None,
            rotate_right_animation: None,
            rotate_180_animation: None,
            rotate_90_left_animation: None,
            rotate_90_right_animation: None,
            actions: Default::default(),
            recolours: Vec::new(),
            retextures: Vec::new(),
            chathead_models: Vec::new(),
            minimap_visible: true,
            combat_level: None,
            width_scale: 128,
            height_scale: 128,
            render_priority: false,
            ambient: 0,
            contrast: 0,
            head_icon: None,
            rotation_speed: 32,
            transforms: None,
            interactable: true,
            rotation_flag: true,
            pet: false,
            params: Params::default(),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::Models => self.models = read_models(buf)?,
            Field::Name => self.name = buf.read_cstring()?,
            Field::Size => self.size = buf.read_u8()?,
            Field::StandingAnimation => self.standing_animation = buf.read_u16_opt()?,
            Field::WalkAnimation => self.walk_animation = buf.read_u16_opt()?,
            Field::RotateLeftAnimation => self.rotate_left_animation = buf.read_u16_opt()?,
            Field::RotateRightAnimation => self.rotate_right_animation = buf.read_u16_opt()?,
            Field::WalkAnimations => {
                self.walk_animation = buf.read_u16_opt()?;
                self.rotate_180_animation = buf.read_u16_opt()?;
                self.rotate_90_right_animation = buf.read_u16_opt()?;
                self.rotate_90_left_animation = buf.read_u16_opt()?;
            }
            Field::Action => self.actions[slot] = read_action(buf)?,
            Field::Recolours => self.recolours = read_substitutions(buf)?,
            Field::Retextures => self.retextures = read_substitutions(buf)?,
            Field::ChatheadModels => self.chathead_models = read_models(buf)?,
            Field::HiddenOnMinimap => self.minimap_visible = false,
            Field::CombatLevel => self.combat_level = Some(buf.read_u16be()?),
            Field::WidthScale => self.width_scale = buf.read_u16be()?,
            Field::HeightScale => self.height_scale = buf.read_u16be()?,
            Field::RenderPriority => self.render_priority = true,
            Field::Ambient => self.ambient = buf.read_i8()?,
            Field::Contrast => self.contrast = buf.read_i8()?,
            Field::HeadIcon => self.head_icon = buf.read_u16_opt()?,
            Field::RotationSpeed => self.rotation_speed = buf.read_u16be()?,
            Field::Transforms => self.transforms = Some(Transforms::read(buf)?),
            Field::NotInteractable => self.interactable = false,
            Field::NoRotation => self.rotation_flag = false,
            Field::Pet => self.pet = true,
            Field::TransformsWithDefault => {
                self.transforms = Some(Transforms::read_with_default(buf)?);
            }
            Field::Params => self.params.read_into(buf)?,
        }
        Ok(())
    }
}
