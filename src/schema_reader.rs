use crate::err::{LayoutError, Result};
use crate::schema::*;

use log::{debug, trace};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Order preserving element tree, as read from the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawNode {
    Element(RawElement),
    Comment(String),
}

impl RawElement {
    fn from_start(start: &BytesStart, position: u64) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| LayoutError::xml(position, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| LayoutError::xml(position, e))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(RawElement {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Attribute value, empty values count as absent.
    fn attr(&self, key: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    }

    fn required_attr(&self, key: &'static str, element: &'static str, entity: &str) -> Result<String> {
        self.attr(key).ok_or_else(|| LayoutError::MissingAttribute {
            entity: entity.to_owned(),
            element,
            attribute: key,
        })
    }
}

fn read_root(xml: &str) -> Result<RawElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| LayoutError::xml(position, e))?;

        match event {
            Event::Start(start) => stack.push(RawElement::from_start(&start, position)?),
            Event::Empty(empty) => {
                let element = RawElement::from_start(&empty, position)?;
                attach(&mut stack, &mut root, RawNode::Element(element));
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| LayoutError::xml(position, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, RawNode::Element(element));
            }
            Event::Comment(comment) => {
                // Comments outside of the root element carry nothing we need.
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&comment).into_owned();
                    parent.children.push(RawNode::Comment(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(LayoutError::xml(
            xml.len() as u64,
            format!("element <{}> is never closed", unclosed.name),
        ));
    }

    root.ok_or(LayoutError::MissingRoot)
}

fn attach(stack: &mut [RawElement], root: &mut Option<RawElement>, node: RawNode) {
    match (stack.last_mut(), node) {
        (Some(parent), node) => parent.children.push(node),
        (None, RawNode::Element(element)) => {
            // Only the first top level element is the document root.
            if root.is_none() {
                *root = Some(element);
            }
        }
        (None, RawNode::Comment(_)) => {}
    }
}

impl SchemaDocument {
    /// Reads a schema document from its markup.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = read_root(xml)?;
        debug!(
            "schema root <{}> with {} children",
            root.name,
            root.children.len()
        );

        let mut declarations = Vec::new();

        for node in &root.children {
            let RawNode::Element(element) = node else {
                continue;
            };

            if let Some(kind) = BlockKind::from_tag(&element.name) {
                declarations.push(Declaration::Block(block_decl(kind, element)?));
                continue;
            }

            match element.name.as_str() {
                "numdef" => {
                    let name = element.required_attr("name", "numdef", "numdef")?;
                    let num = element.required_attr("num", "numdef", &name)?;
                    declarations.push(Declaration::NumDef(NumDef { name, num }));
                }
                "group" => {
                    let name = element.required_attr("name", "group", "group")?;
                    let items = group_items(&element.children, &name)?;
                    declarations.push(Declaration::Group(GroupDecl { name, items }));
                }
                other => trace!("skipping top level element <{}>", other),
            }
        }

        Ok(SchemaDocument { declarations })
    }
}

fn block_decl(kind: BlockKind, element: &RawElement) -> Result<BlockDecl> {
    let name = element.required_attr("name", "block", "block")?;

    let description = element
        .attr("desc")
        .or_else(|| match element.children.first() {
            Some(RawNode::Comment(text)) => Some(text.trim().to_owned()),
            _ => None,
        })
        .unwrap_or_default();

    let items = block_items(&element.children, &format!("block `{}`", name))?;

    Ok(BlockDecl {
        kind,
        name,
        description,
        items,
    })
}

fn block_items(children: &[RawNode], context: &str) -> Result<Vec<BlockItem>> {
    let mut items = Vec::with_capacity(children.len());

    for node in children {
        let element = match node {
            RawNode::Comment(text) => {
                items.push(BlockItem::Comment(text.trim().to_owned()));
                continue;
            }
            RawNode::Element(element) => element,
        };

        let item = match element.name.as_str() {
            "param" => BlockItem::Param(ParamDecl {
                id: element.attr("id"),
                desc: element.attr("desc"),
                desc_val: element.attr("desc_val"),
                min: element.attr("min"),
                max: element.attr("max"),
                init: element.attr("init"),
                array: element.attr("array"),
                type_tag: element.attr("type"),
                sysex_ofst: element.attr("sysex_ofst"),
            }),
            "padding" => BlockItem::Padding {
                bytesize: element.attr("bytesize"),
            },
            "subblock" => {
                let id = element.attr("id");
                let desc = element.attr("desc");
                let label = id.as_deref().or(desc.as_deref()).unwrap_or("<anonymous>");
                let nested = format!("subblock `{}` of {}", label, context);

                BlockItem::Subblock(SubblockDecl {
                    items: block_items(&element.children, &nested)?,
                    id,
                    desc,
                    array: element.attr("array"),
                })
            }
            "common" => BlockItem::Common(block_items(&element.children, context)?),
            "share" => BlockItem::Share(block_items(&element.children, context)?),
            "alternate" => BlockItem::Alternate,
            other => {
                return Err(LayoutError::UnknownElement {
                    tag: other.to_owned(),
                    context: context.to_owned(),
                });
            }
        };

        items.push(item);
    }

    Ok(items)
}

fn group_items(children: &[RawNode], group: &str) -> Result<Vec<GroupItem>> {
    let mut items = Vec::with_capacity(children.len());

    for node in children {
        let element = match node {
            RawNode::Comment(text) => {
                items.push(GroupItem::Comment(text.trim().to_owned()));
                continue;
            }
            RawNode::Element(element) => element,
        };

        let item = match element.name.as_str() {
            "block" => GroupItem::Block {
                baseblock: element.attr("baseblock"),
                size: element.attr("size"),
                array: element.attr("array"),
            },
            "offset" => GroupItem::Offset {
                adrs: element.attr("adrs"),
            },
            other => {
                return Err(LayoutError::UnknownElement {
                    tag: other.to_owned(),
                    context: format!("group `{}`", group),
                });
            }
        };

        items.push(item);
    }

    Ok(items)
}
