//! Item definitions

use std::io::{self, Cursor};

use super::{Definition, DefinitionKind, Opcode, Params, read_action, read_substitutions};
use crate::ioutils::ReadInt;

/// Number of action slots in each menu
pub const ACTION_SLOTS: usize = 5;

/// Number of stack-size model variants
pub const STACK_VARIANTS: usize = 10;

/// Model swapped in once a stack reaches a size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackVariant {
    /// Item whose model is shown
    pub object: u16,
    /// Stack size at which it applies
    pub count: u16,
}

/// An item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// Item id
    pub id: u32,
    /// Inventory icon model
    pub inventory_model: u16,
    /// Display name
    pub name: String,
    /// Icon zoom
    pub zoom2d: u16,
    /// Icon pitch
    pub xan2d: u16,
    /// Icon yaw
    pub yan2d: u16,
    /// Icon roll
    pub zan2d: u16,
    /// Icon horizontal offset
    pub x_offset2d: i16,
    /// Icon vertical offset
    pub y_offset2d: i16,
    /// Whether the item stacks in one slot
    pub stackable: bool,
    /// Base value in coins
    pub cost: i32,
    /// Members-only item
    pub members: bool,
    /// Worn models for male characters
    pub male_models: [Option<u16>; 3],
    /// Vertical offset applied to the first male model
    pub male_offset: u8,
    /// Worn models for female characters
    pub female_models: [Option<u16>; 3],
    /// Vertical offset applied to the first female model
    pub female_offset: u8,
    /// Actions offered on the ground
    pub ground_actions: [Option<String>; ACTION_SLOTS],
    /// Actions offered in the inventory
    pub inventory_actions: [Option<String>; ACTION_SLOTS],
    /// Colour substitutions `(from, to)`
    pub recolours: Vec<(u16, u16)>,
    /// Texture substitutions `(from, to)`
    pub retextures: Vec<(u16, u16)>,
    /// Inventory action used on shift-click
    pub shift_click_index: i8,
    /// Whether the item can be traded
    pub tradeable: bool,
    /// Chat head models for male characters
    pub male_head_models: [Option<u16>; 2],
    /// Chat head models for female characters
    pub female_head_models: [Option<u16>; 2],
    /// Item category
    pub category: Option<u16>,
    /// Linked noted/unnoted item
    pub noted_id: Option<u16>,
    /// Template the noted form is drawn from
    pub noted_template: Option<u16>,
    /// Models by stack size
    pub stack_variants: [Option<StackVariant>; STACK_VARIANTS],
    /// Model scale along x, 128 is unscaled
    pub resize_x: u16,
    /// Model scale along y
    pub resize_y: u16,
    /// Model scale along z
    pub resize_z: u16,
    /// Lighting ambient term
    pub ambient: i8,
    /// Lighting contrast term
    pub contrast: i8,
    /// Team cape number
    pub team: u8,
    /// Linked bought/unbought item
    pub bought_id: Option<u16>,
    /// Template for the bought form
    pub bought_template: Option<u16>,
    /// Linked bank placeholder item
    pub placeholder_id: Option<u16>,
    /// Template for the placeholder form
    pub placeholder_template: Option<u16>,
    /// Script parameters
    pub params: Params,
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    InventoryModel,
    Name,
    Zoom2d,
    Xan2d,
    Yan2d,
    XOffset2d,
    YOffset2d,
    Stackable,
    Cost,
    Members,
    MaleModel0,
    MaleModel1,
    FemaleModel0,
    FemaleModel1,
    GroundAction,
    InventoryAction,
    Recolours,
    Retextures,
    ShiftClickIndex,
    Tradeable,
    MaleModel2,
    FemaleModel2,
    HeadModel,
    Category,
    Zan2d,
    NotedId,
    NotedTemplate,
    StackVariant,
    ResizeX,
    ResizeY,
    ResizeZ,
    Ambient,
    Contrast,
    Team,
    BoughtId,
    BoughtTemplate,
    PlaceholderId,
    PlaceholderTemplate,
    Params,
}

impl ObjectDefinition {
    /// Whether this item is the noted form of another
    pub fn is_noted(&self) -> bool {
        self.noted_template.is_some()
    }

    /// Model to show for a stack of `amount`
    pub fn model_for_stack(&self, amount: u16) -> Option<u16> {
        self.stack_variants
            .iter()
            .flatten()
            .filter(|v| v.count != 0 && amount >= v.count)
            .last()
            .map(|v| v.object)
    }
}

impl Definition for ObjectDefinition {
    type Field = Field;

    const KIND: DefinitionKind = DefinitionKind::Object;

    const OPCODES: &'static [Opcode<Field>] = &[
        Opcode::single(1, Field::InventoryModel),
        Opcode::single(2, Field::Name),
        Opcode::single(4, Field::Zoom2d),
        Opcode::single(5, Field::Xan2d),
        Opcode::single(6, Field::Yan2d),
        Opcode::single(7, Field::XOffset2d),
        Opcode::single(8, Field::YOffset2d),
        Opcode::single(11, Field::Stackable),
        Opcode::single(12, Field::Cost),
        Opcode::single(16, Field::Members),
        Opcode::single(23, Field::MaleModel0),
        Opcode::single(24, Field::MaleModel1),
        Opcode::single(25, Field::FemaleModel0),
        Opcode::single(26, Field::FemaleModel1),
        Opcode::range(30, 34, Field::GroundAction),
        Opcode::range(35, 39, Field::InventoryAction),
        Opcode::single(40, Field::Recolours),
        Opcode::single(41, Field::Retextures),
        Opcode::single(42, Field::ShiftClickIndex),
        Opcode::single(65, Field::Tradeable),
        Opcode::single(78, Field::MaleModel2),
        Opcode::single(79, Field::FemaleModel2),
        Opcode::range(90, 93, Field::HeadModel),
        Opcode::single(94, Field::Category),
        Opcode::single(95, Field::Zan2d),
        Opcode::single(97, Field::NotedId),
        Opcode::single(98, Field::NotedTemplate),
        Opcode::range(100, 109, Field::StackVariant),
        Opcode::single(110, Field::ResizeX),
        Opcode::single(111, Field::ResizeY),
        Opcode::single(112, Field::ResizeZ),
        Opcode::single(113, Field::Ambient),
        Opcode::single(114, Field::Contrast),
        Opcode::single(115, Field::Team),
        Opcode::single(139, Field::BoughtId),
        Opcode::single(140, Field::BoughtTemplate),
        Opcode::single(148, Field::PlaceholderId),
        Opcode::single(149, Field::PlaceholderTemplate),
        Opcode::single(249, Field::Params),
    ];

    fn with_id(id: u32) -> Self {
        Self {
            id,
            inventory_model: 0,
            name: String::from("null"),
            zoom2d: 2000,
            xan2d: 0,
            yan2d: 0,
            zan2d: 0,
            x_offset2d: 0,
            y_offset2d: 0,
            stackable: false,
            cost: 1,
            members: false,
            male_models: [None; 3],
            male_offset: 0,
            female_models: [None; 3],
            female_offset: 0,
            ground_actions: [None, None, Some(String::from("Take")), None, None],
            inventory_actions: [None, None, None, None, Some(String::from("Drop"))],
            recolours: Vec::new(),
            retextures: Vec::new(),
            shift_click_index: -2,
            tradeable: false,
            male_head_models: [None; 2],
            female_head_models: [None; 2],
            category: None,
            noted_id: None,
            noted_template: None,
            stack_variants: [None; STACK_VARIANTS],
            resize_x: 128,
            resize_y: 128,
            resize_z: 128,
            ambient: 0,
            contrast: 0,
            team: 0,
            bought_id: None,
            bought_template: None,
            placeholder_id: None,
            placeholder_template: None,
            params: Params::default(),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn read_field(&mut self, field: Field, slot: usize, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        match field {
            Field::InventoryModel => self.inventory_model = buf.read_u16be()?,
            Field::Name => self.name = buf.read_cstring()?,
            Field::Zoom2d => self.zoom2d = buf.read_u16be()?,
            Field::Xan2d => self.xan2d = buf.read_u16be()?,
            Field::Yan2d => self.yan2d = buf.read_u16be()?,
            Field::XOffset2d => self.x_offset2d = buf.read_i16be()?,
            Field::YOffset2d => self.y_offset2d = buf.read_i16be()?,
            Field::Stackable => self.stackable = true,
            Field::Cost => self.cost = buf.read_i32be()?,
            Field::Members => self.members = true,
            Field::MaleModel0 => {
                self.male_models[0] = Some(buf.read_u16be()?);
                self.male_offset = buf.read_u8()?;
            }
            Field::MaleModel1 => self.male_models[1] = Some(buf.read_u16be()?),
            Field::FemaleModel0 => {
                self.female_models[0] = Some(buf.read_u16be()?);
                self.female_offset = buf.read_u8()?;
            }
            Field::FemaleModel1 => self.female_models[1] = Some(buf.read_u16be()?),
            Field::GroundAction => self.ground_actions[slot] = read_action(buf)?,
            Field::InventoryAction => self.inventory_actions[slot] = read_action(buf)?,
            Field::Recolours => self.recolours = read_substitutions(buf)?,
            Field::Retextures => self.retextures = read_substitutions(buf)?,
            Field::ShiftClickIndex => self.shift_click_index = buf.read_i8()?,
            Field::Tradeable => self.tradeable = true,
            Field::MaleModel2 => self.male_models[2] = Some(buf.read_u16be()?),
            Field::FemaleModel2 => self.female_models[2] = Some(buf.read_u16be()?),
            // 90 male 0, 91 female 0, 92 male 1, 93 female 1
            Field::HeadModel => {
                let model = Some(buf.read_u16be()?);
                if slot % 2 == 0 {
                    self.male_head_models[slot / 2] = model;
                } else {
                    self.female_head_models[slot / 2] = model;
                }
            }
            Field::Category => self.category = Some(buf.read_u16be()?),
            Field::Zan2d => self.zan2d = buf.read_u16be()?,
            Field::NotedId => self.noted_id = Some(buf.read_u16be()?),
            Field::NotedTemplate => self.noted_template = Some(buf.read_u16be()?),
            Field::StackVariant => {
                self.stack_variants[slot] = Some(StackVariant {
                    object: buf.read_u16be()?,
                    count: buf.read_u16be()?,
                });
            }
            Field::ResizeX => self.resize_x = buf.read_u16be()?,
            Field::ResizeY => self.resize_y = buf.read_u16be()?,
            Field::ResizeZ => self.resize_z = buf.read_u16be()?,
            Field::Ambient => self.ambient = buf.read_i8()?,
            Field::Contrast => self.contrast = buf.read_i8()?,
            Field::Team => self.team = buf.read_u8()?,
            Field::BoughtId => self.bought_id = Some(buf.read_u16be()?),
            Field::BoughtTemplate => self.bought_template = Some(buf.read_u16be()?),
            Field::PlaceholderId => self.placeholder_id = Some(buf.read_u16be()?),
            Field::PlaceholderTemplate => self.placeholder_template = Some(buf.read_u16be()?),
            Field::Params => self.params.read_into(buf)?,
        }
        Ok(())
    }
}
