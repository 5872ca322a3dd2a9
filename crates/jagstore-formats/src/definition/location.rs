//! Location (scenery object) definitions

use std::io::{self, Cursor};

use super::{
    Definition, DefinitionKind, Opcode, Params, Transforms, read_action, read_models,
    read_substitutions,
};
use crate::ioutils::ReadInt;

/// Number of right-click action slots
pub const ACTION_SLOTS: usize = 5;

/// Looping sound played near a location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientSound {
    /// Sound effect id
    pub sound: u16,
    /// Audible distance in tiles
    pub distance: u8,
}

/// Sounds picked at random intervals near a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomAmbientSounds {
    /// Minimum delay between sounds
    pub min_delay: u16,
    /// Maximum delay between sounds
    pub max_delay: u16,
    /// Audible distance in tiles
    pub distance: u8,
    /// Sound effect ids
    pub sounds: Vec<u16>,
}

/// A location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDefinition {
    /// Location id
    pub id: u32,
    /// Models
    pub models: Vec<u16>,
    /// Shape type of each model, when the models are typed
    pub model_types: Option<Vec<u8>>,
    /// Display name
    pub name: String,
    /// Tiles occupied along x
    pub size_x: u8,
    /// Tiles occupied along y
    pub size_y: u8,
    /// Whether the location blocks movement
    pub solid: bool,
    /// Whether the location blocks projectiles
    pub blocks_projectiles: bool,
    /// Wall or door interaction flag
    pub wall_or_door: Option<u8>,
    /// Ground contouring mode
    pub contoured_ground: Option<u16>,
    /// Whether adjacent normals are merged
    pub merge_normals: bool,
    /// Whether the location occludes
    pub occludes: bool,
    /// Idle sequence
    pub animation: Option<u16>,
    /// How the location is interacted with
    pub interact_type: Option<u8>,
    /// Wall decoration displacement
    pub decor_displacement: u8,
    /// Lighting ambient term
    pub ambient: i8,
    /// Menu actions, `None` where hidden or absent
    pub actions: [Option<String>; ACTION_SLOTS],
    /// Lighting contrast term
    pub contrast: i8,
    /// Colour substitutions `(from, to)`
    pub recolours: Vec<(u16, u16)>,
    /// Texture substitutions `(from, to)`
    pub retextures: Vec<(u16, u16)>,
    /// Location category
    pub category: Option<u16>,
    /// Whether the model is mirrored
    pub rotated: bool,
    /// Whether the location casts a shadow
    pub casts_shadow: bool,
    /// Model scale along x, 128 is unscaled
    pub model_size_x: u16,
    /// Model scale along the vertical
    pub model_height: u16,
    /// Model scale along y
    pub model_size_y: u16,
    /// Map scene sprite
    pub map_scene: Option<u16>,
    /// Sides from which the location can be approached
    pub blocking_mask: u8,
    /// Model offset along x
    pub offset_x: i16,
    /// Model offset along the vertical
    pub offset_height: i16,
    /// Model offset along y
    pub offset_y: i16,
    /// Whether ground decoration beneath is hidden
    pub obstructs_ground: bool,
    /// Whether the location is hollow
    pub hollow: bool,
    /// Whether items can be placed on top
    pub supports_items: Option<u8>,
    /// Variable-driven appearance switch
    pub transforms: Option<Transforms>,
    /// Looping ambient sound
    pub ambient_sound: Option<AmbientSound>,
    /// Random ambient sounds
    pub random_ambient_sounds: Option<RandomAmbientSounds>,
    /// World map area icon
    pub map_area: Option<u16>,
    /// Script parameters
    pub params: Params,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    TypedModels,
    Name,
    Models,
    SizeX,
    SizeY,
    NotSolid,
    NoProjectileBlock,
    WallOrDoor,
    ContouredGround,
    MergeNormals,
    Occludes,
    Animation,
    InteractType,
    DecorDisplacement,
    Ambient,
    Action,
    Contrast,
    Recolours,
    Retextures,
    Category,
    Rotated,
    NoShadow,
    ModelSizeX,
    ModelHeight,
    ModelSizeY,
    MapScene,
    BlockingMask,
    OffsetX,
    OffsetHeight,
    OffsetY,
    ObstructsGround,
    Hollow,
    SupportsItems,
    Transforms,
    AmbientSound,
    RandomAmbientSounds,
    ContouredGroundLevel,
    MapArea,
    TransformsWithDefault,
    Params,
}

impl Definition for LocationDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Location;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::TypedModels),
        Opcode::single(2, Field::Name),
        Opcode::single(5, Field::Models),
        Opcode::single(14, Field::SizeX),
        Opcode::single(15, Field::SizeY),
        Opcode::single(17, Field::NotSolid),
        Opcode::single(18, Field::NoProjectileBlock),
        Opcode::single(19, Field::WallOrDoor),
        Opcode::single(21, Field::ContouredGround),
        Opcode::single(22, Field::MergeNormals),
        Opcode::single(23, Field::Occludes),
        Opcode::single(24, Field::Animation),
        Opcode::single(27, Field::InteractType),
        Opcode::single(28, Field::DecorDisplacement),
        Opcode::single(29, Field::Ambient),
        Opcode::range(30, 34, Field::Action),
        Opcode::single(39, Field::Contrast),
        Opcode::single(40, Field::Recolours),
        Opcode::single(41, Field::Retextures),
        Opcode::single(61, Field::Category),
        Opcode::single(62, Field::Rotated),
        Opcode::single(64, Field::NoShadow),
        Opcode::single(65, Field::ModelSizeX),
        Opcode::single(66, Field::ModelHeight),
        Opcode::single(67, Field::ModelSizeY),
        Opcode::single(68, Field::MapScene),
        Opcode::single(69, Field::BlockingMask),
        Opcode::single(70, Field::OffsetX),
        Opcode::single(71, Field::OffsetHeight),
        Opcode::single(72, Field::OffsetY),
        Opcode::single(73, Field::ObstructsGround),
        Opcode::single(74, Field::Hollow),
        Opcode::single(75, Field::SupportsItems),
        Opcode::single(77, Field::Transforms),
        Opcode::single(78, Field::AmbientSound),
        Opcode::single(79, Field::RandomAmbientSounds),
        Opcode::single(81, Field::ContouredGroundLevel),
        Opcode::single(82, Field::MapArea),
        Opcode::single(92, Field::TransformsWithDefault),
        Opcode::single(249, Field::Params),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            models: Vec::new(),
            model_types: None,
            name: String::from("null"),
            size_x: 1,
            size_y: 1,
            solid: true,
            blocks_projectiles: true,
            wall_or_door: None,
            contoured_ground: None,
            merge_normals: false,
            occludes: false,
            animation: None,
            interact_type: None,
            decor_displacement: 16,
            ambient: 0,
            actions: Default::default(),
            contrast: 0,
            recolours: Vec::new(),
            retextures: Vec::new(),
            category: None,
            rotated: false,
            casts_shadow: true,
            model_size_x: 128,
            model_height: 128,
            model_size_y: 128,
            map_scene: None,
            blocking_mask: 0,
            offset_x: 0,
            offset_height: 0,
            offset_y: 0,
            obstructs_ground: false,
            hollow: false,
            supports_items: None,
            transforms: None,
            ambient_sound: None,
            random_ambient_sounds: None,
            map_area: None,
            params: Params::default(),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::TypedModels => {
                let count = buf.read_u8()?;
                let mut models = Vec::with_capacity(usize::from(count));
                let mut types = Vec::with_capacity(usize::from(count));
                for _ in 0..count {
                    models.push(buf.read_u16be()?);
                    types.push(buf.read_u8()?);
                }
                self.models = models;
                self.model_types = Some(types);
            }
            Field::Name => self.name = buf.read_cstring()?,
            Field::Models => {
                self.models = read_models(buf)?;
                self.model_types = None;
            }
            Field::SizeX => self.size_x = buf.read_u8()?,
            Field::SizeY => self.size_y = buf.read_u8()?,
            Field::NotSolid => {
                self.solid = false;
                self.blocks_projectiles = false;
                self.interact_type = Some(0);
            }
            Field::NoProjectileBlock => self.blocks_projectiles = false,
            Field::WallOrDoor => self.wall_or_door = Some(buf.read_u8()?),
            Field::ContouredGround => self.contoured_ground = Some(0),
            Field::MergeNormals => self.merge_normals = true,
            Field::Occludes => self.occludes = true,
            Field::Animation => self.animation = buf.read_u16_opt()?,
            Field::InteractType => self.interact_type = Some(1),
            Field::DecorDisplacement => self.decor_displacement = buf.read_u8()?,
            Field::Ambient => self.ambient = buf.read_i8()?,
            Field::Action => self.actions[slot] = read_action(buf)?,
            Field::Contrast => self.contrast = buf.read_i8()?,
            Field::Recolours => self.recolours = read_substitutions(buf)?,
            Field::Retextures => self.retextures = read_substitutions(buf)?,
            Field::Category => self.category = Some(buf.read_u16be()?),
            Field::Rotated => self.rotated = true,
            Field::NoShadow => self.casts_shadow = false,
            Field::ModelSizeX => self.model_size_x = buf.read_u16be()?,
            Field::ModelHeight => self.model_height = buf.read_u16be()?,
            Field::ModelSizeY => self.model_size_y = buf.read_u16be()?,
            Field::MapScene => self.map_scene = Some(buf.read_u16be()?),
            Field::BlockingMask => self.blocking_mask = buf.read_u8()?,
            Field::OffsetX => self.offset_x = buf.read_i16be()?,
            Field::OffsetHeight => self.offset_height = buf.read_i16be()?,
            Field::OffsetY => self.offset_y = buf.read_i16be()?,
            Field::ObstructsGround => self.obstructs_ground = true,
            Field::Hollow => self.hollow = true,
            Field::SupportsItems => self.supports_items = Some(buf.read_u8()?),
            Field::Transforms => self.transforms = Some(Transforms::read(buf)?),
            Field::AmbientSound => {
                self.ambient_sound = Some(AmbientSound {
                    sound: buf.read_u16be()?,
                    distance: buf.read_u8()?,
                });
            }
            Field::RandomAmbientSounds => {
                let min_delay = buf.read_u16be()?;
                let max_delay = buf.read_u16be()?;
                let distance = buf.read_u8()?;
                let sounds = read_models(buf)?;
                self.random_ambient_sounds = Some(RandomAmbientSounds {
                    min_delay,
                    max_delay,
                    distance,
                    sounds,
                });
            }
            Field::ContouredGroundLevel => {
                self.contoured_ground = Some(u16::from(buf.read_u8()?) * 256);
            }
            Field::MapArea => self.map_area = Some(buf.read_u16be()?),
            Field::TransformsWithDefault => {
                self.transforms = Some(Transforms::read_with_default(buf)?);
            }
            Field::Params => self.params.read_into(buf)?,
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
        test_support::assert_well_formed::<LocationDefinition>();
    }

    #[test]
    fn test_door() {
        let mut payload = vec![1, 2, 0x05, 0xDC, 0, 0x05, 0xDD, 9, 2];
        payload.extend_from_slice(b"Door\0");
        payload.extend_from_slice(&[17, 19, 1, 30]);
        payload.extend_from_slice(b"Open\0");
        payload.extend_from_slice(&[78, 0, 50, 5, 81, 2, 0]);

        let door: LocationDefinition =
            decode_bytes(1530, &payload, &DecoderOptions::default()).unwrap();
        assert_eq!(door.name, "Door");
        assert_eq!(door.models, vec![1500, 1501]);
        assert_eq!(door.model_types, Some(vec![0, 9]));
        assert!(!door.solid);
        assert!(!door.blocks_projectiles);
        assert_eq!(door.interact_type, Some(0));
        assert_eq!(door.wall_or_door, Some(1));
        assert_eq!(door.actions[0].as_deref(), Some("Open"));
        assert_eq!(
            door.ambient_sound,
            Some(AmbientSound {
                sound: 50,
                distance: 5
            })
        );
        assert_eq!(door.contoured_ground, Some(512));
    }

    #[test]
    fn test_random_sounds() {
        let payload = [79, 0, 10, 0, 20, 3, 2, 0, 7, 0, 8, 0];
        let loc: LocationDefinition = decode_bytes(0, &payload, &DecoderOptions::default()).unwrap();
        let sounds = loc.random_ambient_sounds.unwrap();
        assert_eq!((sounds.min_delay, sounds.max_delay, sounds.distance), (10, 20, 3));
        assert_eq!(sounds.sounds, vec![7, 8]);
    }
}
