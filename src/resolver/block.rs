use super::{ResolveContext, to_u32};
use crate::annotation::parse_value_annotation;
use crate::err::{LayoutError, Result};
use crate::model::*;
use crate::schema::{BlockItem, ParamDecl, SubblockDecl};

use indexmap::IndexMap;
use log::{debug, info, trace};

/// Identity used for a subblock that has neither an `id` nor a `desc`.
const ANONYMOUS_SUBBLOCK_ID: &str = "SUB";

/// Lays out the `items` of block `block_name`.
///
/// Nested subblocks are resolved first, registered in `registry` as `{block_name}_{id}` and
/// referenced from the returned block. The returned block itself is not registered.
pub fn resolve_block(
    items: &[BlockItem],
    block_name: &str,
    description: &str,
    registry: &mut BlockRegistry,
    ctx: &ResolveContext,
) -> Result<BlockDefinition> {
    let mut resolver = BlockResolver::new(block_name, ctx);
    resolver.process_items(items, registry)?;

    let block = resolver.finish(description);
    info!(
        "resolved block `{}` ({} bytes, {} entries)",
        block.name,
        block.byte_length,
        block.entries.as_ref().map_or(0, IndexMap::len)
    );

    Ok(block)
}

struct BlockResolver<'a> {
    block_name: &'a str,
    ctx: &'a ResolveContext<'a>,
    byte_offset: u32,
    wire_offset: u32,
    padding_num: u32,
    entries: IndexMap<String, BlockEntry>,
}

impl<'a> BlockResolver<'a> {
    fn new(block_name: &'a str, ctx: &'a ResolveContext<'a>) -> Self {
        BlockResolver {
            block_name,
            ctx,
            byte_offset: 0,
            wire_offset: 0,
            padding_num: 1,
            entries: IndexMap::new(),
        }
    }

    fn process_items(&mut self, items: &[BlockItem], registry: &mut BlockRegistry) -> Result<()> {
        for item in items {
            match item {
                BlockItem::Param(param) => self.process_param(param)?,
                BlockItem::Padding { bytesize } => self.process_padding(bytesize.as_deref())?,
                BlockItem::Subblock(subblock) => self.process_subblock(subblock, registry)?,
                BlockItem::Common(children) | BlockItem::Share(children) => {
                    self.process_items(children, registry)?
                }
                BlockItem::Alternate | BlockItem::Comment(_) => {}
            }
        }

        Ok(())
    }

    fn process_param(&mut self, param: &ParamDecl) -> Result<()> {
        let id = param
            .id
            .as_deref()
            .ok_or_else(|| LayoutError::MissingAttribute {
                entity: self.block_name.to_owned(),
                element: "param",
                attribute: "id",
            })?;
        let entity = format!("{}.{}", self.block_name, id);

        let required = |value: &Option<String>, attribute: &'static str| -> Result<i64> {
            let token = value.as_deref().ok_or_else(|| LayoutError::MissingAttribute {
                entity: entity.clone(),
                element: "param",
                attribute,
            })?;
            self.ctx
                .constants
                .resolve_number_or_constant(token, &entity, attribute)
        };

        let data_range = (required(&param.min, "min")?, required(&param.max, "max")?);
        let width = ValueWidth::for_param(param.type_tag.as_deref(), data_range);

        let count = self
            .ctx
            .number(param.array.as_deref(), &entity, "array")?
            .unwrap_or(1);
        let is_array = count > 1;
        let count = to_u32(count.max(1), &entity, "array")?;
        self.check_room(
            count.checked_mul(width.byte_length()),
            count.checked_mul(width.wire_length()),
            &entity,
            "array",
        )?;

        let init_value = self.ctx.number(param.init.as_deref(), &entity, "init")?;
        let value_offset = match param.sysex_ofst.as_deref() {
            Some(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| LayoutError::InvalidNumber {
                    entity: entity.clone(),
                    attribute: "sysex_ofst",
                    value: text.to_owned(),
                })?,
            None => 0,
        };

        let annotation =
            parse_value_annotation(param.desc_val.as_deref().unwrap_or_default(), data_range);
        let desc = param.desc.as_deref().unwrap_or_default();
        let settings = self.ctx.settings;

        for i in 1..=count {
            let (item_id, description) = if is_array {
                let description = if desc.contains('$') {
                    desc.replacen('$', &i.to_string(), 1)
                } else {
                    format!("{} {}", desc, i)
                };
                (format!("{}_{}", id, i), description)
            } else {
                (id.to_owned(), desc.to_owned())
            };

            // Hidden array items still take up their space.
            if settings.should_truncate_name() && i > 1 {
                let hidden = count - 1;
                trace!("truncated {} items of {} at {}", hidden, id, self.byte_offset);
                self.advance(hidden * width.byte_length(), hidden * width.wire_length());
                break;
            }

            let entry = ParameterEntry {
                id: item_id,
                description,
                byte_offset: self.byte_offset,
                byte_length: width.byte_length(),
                wire: settings.should_include_sysex().then_some(ParamWire {
                    offset: self.wire_offset,
                    length: width.wire_length(),
                    value_offset,
                }),
                data_range,
                init_value,
                labels: annotation.labels.clone(),
                display_range: annotation.display_range,
                display_measurement: annotation.display_measurement.clone(),
            };

            trace!("{} at {}", entry.id, entry.byte_offset);
            self.insert_entry(entry.id.clone(), BlockEntry::Parameter(entry))?;
            self.advance(width.byte_length(), width.wire_length());
        }

        Ok(())
    }

    /// Padding only occupies the byte image, it has no wire representation.
    fn process_padding(&mut self, bytesize: Option<&str>) -> Result<()> {
        let entity = format!("{}.PADDING", self.block_name);
        let byte_length = match self.ctx.number(bytesize, &entity, "bytesize")? {
            Some(size) => to_u32(size, &entity, "bytesize")?,
            None => 0,
        };
        self.check_room(Some(byte_length), Some(0), &entity, "bytesize")?;

        if self.ctx.settings.should_include_padding() {
            let id = format!("PADDING{}", self.padding_num);
            self.padding_num += 1;

            self.insert_entry(
                id.clone(),
                BlockEntry::Padding(PaddingEntry {
                    id,
                    byte_offset: self.byte_offset,
                    byte_length,
                }),
            )?;
        }

        self.advance(byte_length, 0);
        Ok(())
    }

    fn process_subblock(
        &mut self,
        subblock: &SubblockDecl,
        registry: &mut BlockRegistry,
    ) -> Result<()> {
        let id = subblock
            .id
            .as_deref()
            .or(subblock.desc.as_deref())
            .unwrap_or(ANONYMOUS_SUBBLOCK_ID)
            .to_owned();
        let name = format!("{}_{}", self.block_name, id);

        match self.entries.get(&id) {
            Some(BlockEntry::Subblock(_)) => {
                return Err(LayoutError::DuplicateSubblock {
                    block: self.block_name.to_owned(),
                    subblock: name,
                });
            }
            Some(_) => {
                return Err(LayoutError::DuplicateEntry {
                    block: self.block_name.to_owned(),
                    id,
                });
            }
            None => {}
        }
        if registry.contains(&name) {
            return Err(LayoutError::DuplicateBlock { name });
        }

        let count = self
            .ctx
            .number(subblock.array.as_deref(), &name, "array")?
            .unwrap_or(1);
        let count = to_u32(count.max(1), &name, "array")?;
        let description = subblock.desc.clone().unwrap_or_else(|| id.clone());

        let resolved = resolve_block(&subblock.items, &name, &description, registry, self.ctx)?;
        let block_byte_length = resolved.byte_length;
        let (total_byte_length, total_wire_length) = self.check_room(
            block_byte_length.checked_mul(count),
            resolved.wire_length.unwrap_or(0).checked_mul(count),
            &name,
            "array",
        )?;
        registry.register(resolved)?;

        let reference = SubblockReference {
            id: id.clone(),
            description,
            byte_offset: self.byte_offset,
            byte_length: total_byte_length,
            wire: self
                .ctx
                .settings
                .should_include_sysex()
                .then_some(SubblockWire {
                    offset: self.wire_offset,
                    length: total_wire_length,
                }),
            block_name: name,
            count,
            block_byte_length,
        };

        debug!("    - subblock {} x{}", reference.block_name, count);
        self.insert_entry(id, BlockEntry::Subblock(reference))?;
        self.advance(total_byte_length, total_wire_length);

        Ok(())
    }

    fn insert_entry(&mut self, id: String, entry: BlockEntry) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(LayoutError::DuplicateEntry {
                block: self.block_name.to_owned(),
                id,
            });
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Returns the byte and wire lengths if both counters can grow by them.
    ///
    /// `None` stands for a length that already overflowed. Every later `advance` stays within
    /// the room checked here.
    fn check_room(
        &self,
        bytes: Option<u32>,
        wire: Option<u32>,
        entity: &str,
        attribute: &'static str,
    ) -> Result<(u32, u32)> {
        let bytes = bytes.filter(|&bytes| self.byte_offset.checked_add(bytes).is_some());
        let wire = wire.filter(|&wire| self.wire_offset.checked_add(wire).is_some());

        match (bytes, wire) {
            (Some(bytes), Some(wire)) => Ok((bytes, wire)),
            _ => Err(LayoutError::Overflow {
                entity: entity.to_owned(),
                attribute,
            }),
        }
    }

    fn advance(&mut self, bytes: u32, wire: u32) {
        self.byte_offset += bytes;
        self.wire_offset += wire;
    }

    fn finish(self, description: &str) -> BlockDefinition {
        BlockDefinition {
            name: self.block_name.to_owned(),
            description: description.to_owned(),
            byte_length: self.byte_offset,
            wire_length: self
                .ctx
                .settings
                .should_include_sysex()
                .then_some(self.wire_offset),
            entries: (!self.entries.is_empty()).then_some(self.entries),
        }
    }
}
