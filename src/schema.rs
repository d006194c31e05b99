//! Typed view of a parameter schema document.
//!
//! The grammar inside block and group declarations is closed: every element the resolvers accept
//! has its own variant, and the reader rejects anything else with
//! [`LayoutError::UnknownElement`](crate::LayoutError::UnknownElement).
//! Attribute values are kept verbatim so that numeric/constant resolution can name the attribute
//! it failed on.

use crate::err::{LayoutError, Result};

/// `<param>`: a single value, or an array of values when `array` is greater than one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamDecl {
    pub id: Option<String>,
    pub desc: Option<String>,
    /// Free-text "allowed values" annotation.
    pub desc_val: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub init: Option<String>,
    pub array: Option<String>,
    pub type_tag: Option<String>,
    pub sysex_ofst: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubblockDecl {
    pub id: Option<String>,
    pub desc: Option<String>,
    pub array: Option<String>,
    pub items: Vec<BlockItem>,
}

/// An element allowed inside a block (or subblock) declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Param(ParamDecl),
    Padding { bytesize: Option<String> },
    Subblock(SubblockDecl),
    /// `<common>`, laid out as if its children were inlined.
    Common(Vec<BlockItem>),
    /// `<share>`, laid out as if its children were inlined.
    Share(Vec<BlockItem>),
    Alternate,
    Comment(String),
}

/// An element allowed inside a group declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupItem {
    Block {
        baseblock: Option<String>,
        size: Option<String>,
        array: Option<String>,
    },
    /// Resets the group's wire offset to `adrs`.
    Offset { adrs: Option<String> },
    Comment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    BaseBlock,
    Block,
    UnionBaseBlock,
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "baseblock" => Some(BlockKind::BaseBlock),
            "block" => Some(BlockKind::Block),
            "unionbaseblock" => Some(BlockKind::UnionBaseBlock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDecl {
    pub kind: BlockKind,
    pub name: String,
    /// `desc` attribute, or the text of a leading comment.
    pub description: String,
    pub items: Vec<BlockItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDecl {
    pub name: String,
    pub items: Vec<GroupItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumDef {
    pub name: String,
    pub num: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    NumDef(NumDef),
    Block(BlockDecl),
    Group(GroupDecl),
}

/// All top-level declarations of one schema document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDocument {
    pub declarations: Vec<Declaration>,
}

impl SchemaDocument {
    pub fn numdefs(&self) -> impl Iterator<Item = &NumDef> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::NumDef(numdef) => Some(numdef),
            _ => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockDecl> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Block(block) => Some(block),
            _ => None,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupDecl> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Group(group) => Some(group),
            _ => None,
        })
    }

    /// First block declaration named `name`.
    pub fn block(&self, name: &str) -> Result<&BlockDecl> {
        self.blocks()
            .find(|block| block.name == name)
            .ok_or_else(|| LayoutError::BlockNotFound {
                name: name.to_owned(),
            })
    }

    /// First group declaration named `name`.
    pub fn group(&self, name: &str) -> Result<&GroupDecl> {
        self.groups()
            .find(|group| group.name == name)
            .ok_or_else(|| LayoutError::GroupNotFound {
                name: name.to_owned(),
            })
    }
}
