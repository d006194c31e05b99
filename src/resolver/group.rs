use super::{ResolveContext, to_u32};
use crate::err::{LayoutError, Result};
use crate::model::{BlockRegistry, GroupBlockPlacement, GroupDefinition};
use crate::schema::GroupItem;
use crate::wire::from_wire_digits;

use indexmap::IndexMap;
use log::{debug, info, warn};

/// Wire space reserved per block element when a group does not declare a `size`.
pub const DEFAULT_WIRE_ITEM_SIZE: u32 = 128;

/// Lays out the block placements of group `group_name`.
///
/// Byte and wire offsets advance independently: `<offset adrs=".."/>` only moves the wire offset,
/// and a placement reserves `size` wire units per element regardless of the block's wire length.
pub fn resolve_group(
    items: &[GroupItem],
    group_name: &str,
    registry: &BlockRegistry,
    ctx: &ResolveContext,
) -> Result<GroupDefinition> {
    let mut byte_offset: u32 = 0;
    let mut wire_offset: u32 = 0;
    let mut placements = IndexMap::new();

    for item in items {
        match item {
            GroupItem::Block {
                baseblock,
                size,
                array,
            } => {
                let block_name = baseblock.as_deref().unwrap_or_default();
                let block = registry
                    .get(block_name)
                    .ok_or_else(|| LayoutError::UnknownBlock {
                        group: group_name.to_owned(),
                        block: block_name.to_owned(),
                    })?;

                let wire_item_size = match size.as_deref() {
                    Some(text) => from_wire_digits(text)?,
                    None => DEFAULT_WIRE_ITEM_SIZE,
                };

                let entity = format!("{}.{}", group_name, block_name);
                let count = match ctx.number(array.as_deref(), &entity, "array")? {
                    Some(count) => to_u32(count, &entity, "array")?,
                    None => 1,
                };

                let overflow = |attribute| LayoutError::Overflow {
                    entity: entity.clone(),
                    attribute,
                };
                let total_byte_length = count
                    .checked_mul(block.byte_length)
                    .ok_or_else(|| overflow("array"))?;
                let next_byte_offset = byte_offset
                    .checked_add(total_byte_length)
                    .ok_or_else(|| overflow("array"))?;
                let next_wire_offset = count
                    .checked_mul(wire_item_size)
                    .and_then(|reserved| wire_offset.checked_add(reserved))
                    .ok_or_else(|| overflow("size"))?;

                let placement = GroupBlockPlacement {
                    block_name: block_name.to_owned(),
                    count,
                    byte_offset,
                    block_byte_length: block.byte_length,
                    total_byte_length,
                    wire_offset,
                    wire_item_size,
                };

                byte_offset = next_byte_offset;
                wire_offset = next_wire_offset;

                // TODO: confirm whether re-placing a block within one group is meant to replace
                // the earlier placement or should become a separate entry.
                if placements
                    .insert(block_name.to_owned(), placement)
                    .is_some()
                {
                    warn!(
                        "group `{}` places block `{}` more than once, keeping the last placement",
                        group_name, block_name
                    );
                }
            }
            GroupItem::Offset { adrs } => {
                let adrs = adrs.as_deref().ok_or_else(|| LayoutError::MissingAttribute {
                    entity: group_name.to_owned(),
                    element: "offset",
                    attribute: "adrs",
                })?;
                wire_offset = from_wire_digits(adrs)?;
                debug!("group `{}` wire offset reset to {}", group_name, adrs);
            }
            GroupItem::Comment(_) => {}
        }
    }

    info!(
        "resolved group `{}` ({} bytes, {} blocks)",
        group_name,
        byte_offset,
        placements.len()
    );

    Ok(GroupDefinition {
        name: group_name.to_owned(),
        placements,
        total_byte_length: byte_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ConstantTable;
    use crate::model::BlockDefinition;
    use crate::schema::SchemaDocument;
    use crate::settings::ResolveSettings;
    use pretty_assertions::assert_eq;

    fn registry_with(blocks: &[(&str, u32)]) -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        for &(name, byte_length) in blocks {
            registry.register(BlockDefinition {
                name: name.to_string(),
                description: String::new(),
                byte_length,
                wire_length: Some(byte_length),
                entries: None,
            })
            .unwrap();
        }
        registry
    }

    fn resolve_with(
        xml: &str,
        registry: &BlockRegistry,
        constants: &ConstantTable,
    ) -> Result<GroupDefinition> {
        let doc = SchemaDocument::parse(xml)?;
        let decl = doc.group("G")?;
        let ctx = ResolveContext::new(constants, ResolveSettings::new());
        resolve_group(&decl.items, &decl.name, registry, &ctx)
    }

    #[test]
    fn test_array_placement_with_default_reservation() {
        let registry = registry_with(&[("HDR", 7)]);
        let group = resolve_with(
            r#"<zen><group name="G"><block baseblock="HDR" array="3"/></group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap();

        assert_eq!(
            group.placements.get("HDR"),
            Some(&GroupBlockPlacement {
                block_name: "HDR".to_string(),
                count: 3,
                byte_offset: 0,
                block_byte_length: 7,
                total_byte_length: 21,
                wire_offset: 0,
                wire_item_size: 128,
            })
        );
        assert_eq!(group.total_byte_length, 21);
        assert_eq!(group.placements.get("HDR").unwrap().element_wire_offset(2), 256);
    }

    #[test]
    fn test_sequential_placements() {
        let registry = registry_with(&[("SYS", 10), ("TONE", 20)]);
        let mut constants = ConstantTable::new();
        constants.set("TONE_NUM", 4).unwrap();

        let group = resolve_with(
            r#"<zen><group name="G">
                 <block baseblock="SYS" size="00 20"/>
                 <block baseblock="TONE" array="TONE_NUM" size="00 01 00"/>
               </group></zen>"#,
            &registry,
            &constants,
        )
        .unwrap();

        let sys = group.placements.get("SYS").unwrap();
        assert_eq!((sys.byte_offset, sys.wire_offset, sys.wire_item_size), (0, 0, 0x20));

        let tone = group.placements.get("TONE").unwrap();
        assert_eq!(tone.byte_offset, 10);
        assert_eq!(tone.wire_offset, 0x20);
        assert_eq!(tone.wire_item_size, 128);
        assert_eq!(tone.total_byte_length, 80);
        assert_eq!(group.total_byte_length, 90);
    }

    #[test]
    fn test_offset_resets_only_wire_address() {
        let registry = registry_with(&[("A", 5), ("B", 3)]);
        let group = resolve_with(
            r#"<zen><group name="G">
                 <block baseblock="A"/>
                 <offset adrs="01 00 00"/>
                 <block baseblock="B"/>
               </group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap();

        let b = group.placements.get("B").unwrap();
        assert_eq!(b.byte_offset, 5);
        assert_eq!(b.wire_offset, 0x4000);
        assert_eq!(group.total_byte_length, 8);
    }

    #[test]
    fn test_repeated_block_overwrites_placement() {
        let registry = registry_with(&[("A", 5), ("B", 3)]);
        let group = resolve_with(
            r#"<zen><group name="G">
                 <block baseblock="A"/>
                 <block baseblock="B"/>
                 <block baseblock="A" array="2"/>
               </group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap();

        assert_eq!(group.placements.keys().map(String::as_str).collect::<Vec<_>>(), vec!["A", "B"]);
        let a = group.placements.get("A").unwrap();
        assert_eq!((a.byte_offset, a.count, a.wire_offset), (8, 2, 256));
        assert_eq!(group.total_byte_length, 18);
    }

    #[test]
    fn test_unknown_block() {
        let err = resolve_with(
            r#"<zen><group name="G"><block baseblock="NOPE"/></group></zen>"#,
            &BlockRegistry::new(),
            &ConstantTable::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LayoutError::UnknownBlock { ref group, ref block } if group == "G" && block == "NOPE"
        ));
    }

    #[test]
    fn test_offset_requires_address() {
        let err = resolve_with(
            r#"<zen><group name="G"><offset/></group></zen>"#,
            &BlockRegistry::new(),
            &ConstantTable::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LayoutError::MissingAttribute { element: "offset", attribute: "adrs", .. }
        ));
    }

    #[test]
    fn test_malformed_size() {
        let registry = registry_with(&[("A", 5)]);
        let err = resolve_with(
            r#"<zen><group name="G"><block baseblock="A" size="xx"/></group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap_err();

        assert!(matches!(err, LayoutError::MalformedAddress { .. }));
    }

    #[test]
    fn test_wire_reservation_past_the_address_space_is_an_overflow() {
        let registry = registry_with(&[("A", 5)]);
        let err = resolve_with(
            r#"<zen><group name="G"><block baseblock="A" array="5000" size="7f 7f 7f"/></group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LayoutError::Overflow { ref entity, attribute: "size" } if entity == "G.A"
        ));
    }

    #[test]
    fn test_byte_length_past_the_address_space_is_an_overflow() {
        let registry = registry_with(&[("A", 0x8000_0000)]);
        let err = resolve_with(
            r#"<zen><group name="G"><block baseblock="A" size="00"/><block baseblock="A" size="00"/></group></zen>"#,
            &registry,
            &ConstantTable::new(),
        )
        .unwrap_err();

        assert!(matches!(err, LayoutError::Overflow { attribute: "array", .. }));
    }
}
