//! Resolved layout model handed to the renderers.

use crate::err::{LayoutError, Result};
use indexmap::IndexMap;

/// Storage width of a parameter value, in the raw image and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    /// Fits into one 7 bit unit.
    Seven,
    /// One byte, sent as two nibbles.
    Byte,
    /// Two bytes, sent as four nibbles.
    Word,
}

impl ValueWidth {
    /// An explicit `type` tag wins, otherwise the magnitude of `max - min` decides.
    pub fn for_param(type_tag: Option<&str>, data_range: (i64, i64)) -> Self {
        match type_tag {
            Some(tag) if !tag.is_empty() => ValueWidth::from_type_tag(tag),
            _ => ValueWidth::from_range(data_range.1 - data_range.0),
        }
    }

    pub fn from_type_tag(tag: &str) -> Self {
        if tag.contains("16") {
            ValueWidth::Word
        } else {
            ValueWidth::Byte
        }
    }

    pub fn from_range(range: i64) -> Self {
        match range {
            r if r <= 127 => ValueWidth::Seven,
            128..=255 => ValueWidth::Byte,
            _ => ValueWidth::Word,
        }
    }

    pub fn byte_length(self) -> u32 {
        match self {
            ValueWidth::Seven | ValueWidth::Byte => 1,
            ValueWidth::Word => 2,
        }
    }

    pub fn wire_length(self) -> u32 {
        match self {
            ValueWidth::Seven => 1,
            ValueWidth::Byte => 2,
            ValueWidth::Word => 4,
        }
    }
}

/// Wire placement of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamWire {
    pub offset: u32,
    pub length: u32,
    /// Bias applied to the raw value on the wire (`sysex_ofst`).
    pub value_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub id: String,
    pub description: String,
    pub byte_offset: u32,
    pub byte_length: u32,
    /// Absent when the run does not include SysEx fields.
    pub wire: Option<ParamWire>,
    pub data_range: (i64, i64),
    pub init_value: Option<i64>,
    pub labels: Option<Vec<String>>,
    pub display_range: Option<(f64, f64)>,
    pub display_measurement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingEntry {
    pub id: String,
    pub byte_offset: u32,
    pub byte_length: u32,
}

/// Wire placement of a subblock array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubblockWire {
    pub offset: u32,
    /// Element wire length times count.
    pub length: u32,
}

/// An embedded array of a separately registered block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubblockReference {
    pub id: String,
    pub description: String,
    /// Address of element 0.
    pub byte_offset: u32,
    /// `count * block_byte_length`.
    pub byte_length: u32,
    pub wire: Option<SubblockWire>,
    pub block_name: String,
    pub count: u32,
    pub block_byte_length: u32,
}

impl SubblockReference {
    pub fn element_byte_offset(&self, index: u32) -> u32 {
        self.byte_offset + index * self.block_byte_length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockEntry {
    Parameter(ParameterEntry),
    Padding(PaddingEntry),
    Subblock(SubblockReference),
}

impl BlockEntry {
    pub fn id(&self) -> &str {
        match self {
            BlockEntry::Parameter(p) => &p.id,
            BlockEntry::Padding(p) => &p.id,
            BlockEntry::Subblock(s) => &s.id,
        }
    }

    pub fn byte_offset(&self) -> u32 {
        match self {
            BlockEntry::Parameter(p) => p.byte_offset,
            BlockEntry::Padding(p) => p.byte_offset,
            BlockEntry::Subblock(s) => s.byte_offset,
        }
    }

    pub fn byte_length(&self) -> u32 {
        match self {
            BlockEntry::Parameter(p) => p.byte_length,
            BlockEntry::Padding(p) => p.byte_length,
            BlockEntry::Subblock(s) => s.byte_length,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterEntry> {
        match self {
            BlockEntry::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_subblock(&self) -> Option<&SubblockReference> {
        match self {
            BlockEntry::Subblock(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    pub name: String,
    pub description: String,
    pub byte_length: u32,
    pub wire_length: Option<u32>,
    /// `None` for a block without any entries of its own.
    pub entries: Option<IndexMap<String, BlockEntry>>,
}

impl BlockDefinition {
    pub fn entry(&self, id: &str) -> Option<&BlockEntry> {
        self.entries.as_ref().and_then(|entries| entries.get(id))
    }

    pub fn entries(&self) -> impl Iterator<Item = &BlockEntry> {
        self.entries.iter().flat_map(|entries| entries.values())
    }
}

/// A block laid out inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlockPlacement {
    pub block_name: String,
    pub count: u32,
    pub byte_offset: u32,
    pub block_byte_length: u32,
    pub total_byte_length: u32,
    pub wire_offset: u32,
    /// Wire space reserved per element, may exceed the block's own wire length.
    pub wire_item_size: u32,
}

impl GroupBlockPlacement {
    pub fn element_byte_offset(&self, index: u32) -> u32 {
        self.byte_offset + index * self.block_byte_length
    }

    pub fn element_wire_offset(&self, index: u32) -> u32 {
        self.wire_offset + index * self.wire_item_size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDefinition {
    pub name: String,
    /// Keyed by block name.
    pub placements: IndexMap<String, GroupBlockPlacement>,
    pub total_byte_length: u32,
}

/// Resolved blocks, including promoted subblocks, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockRegistry {
    blocks: IndexMap<String, BlockDefinition>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        BlockRegistry::default()
    }

    /// Registers `block` under its name. Block names are global, so a second block of the
    /// same name is rejected and the registry is left unchanged.
    pub fn register(&mut self, block: BlockDefinition) -> Result<()> {
        if self.blocks.contains_key(&block.name) {
            return Err(LayoutError::DuplicateBlock { name: block.name });
        }
        self.blocks.insert(block.name.clone(), block);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRegistry {
    groups: IndexMap<String, GroupDefinition>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        GroupRegistry::default()
    }

    pub fn register(&mut self, group: GroupDefinition) -> Result<()> {
        if self.groups.contains_key(&group.name) {
            return Err(LayoutError::DuplicateGroup { name: group.name });
        }
        self.groups.insert(group.name.clone(), group);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupDefinition> {
        self.groups.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

/// Blocks and groups of a completed run, sharing a single namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    blocks: BlockRegistry,
    groups: GroupRegistry,
}

impl Layout {
    /// Fails with [`LayoutError::NameCollision`] if a name is both a block and a group.
    pub fn new(blocks: BlockRegistry, groups: GroupRegistry) -> Result<Self> {
        let names: Vec<String> = blocks
            .names()
            .filter(|name| groups.groups.contains_key(*name))
            .map(ToOwned::to_owned)
            .collect();

        if !names.is_empty() {
            return Err(LayoutError::NameCollision { names });
        }

        Ok(Layout { blocks, groups })
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }
}
