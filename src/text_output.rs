//! Plain text report of a resolved [`Layout`]: one table per group, then one per block.

use crate::model::*;
use crate::settings::ResolveSettings;
use crate::utils::TextTable;
use crate::wire::{ADDRESS_DIGITS, to_wire_digits};

/// Labels shown in the values column before the list is cut short.
const MAX_LISTED_LABELS: usize = 10;

pub fn render_text(layout: &Layout, settings: ResolveSettings) -> String {
    let mut out = String::new();

    for group in layout.groups().iter() {
        out.push_str(&group_table(group, layout.blocks(), settings).render());
        out.push_str("\r\n");
    }

    for block in layout.blocks().iter() {
        if block.entries.is_none() {
            continue;
        }
        out.push_str(&block_table(block, layout.blocks(), settings).render());
        out.push_str("\r\n");
    }

    out
}

fn byte_offset_cell(offset: u32) -> String {
    format!("0x{:04x} {:04}", offset, offset)
}

fn index_cell(index: u32, count: u32) -> String {
    if count > 1 {
        format!("[{:>2}]", index + 1)
    } else {
        String::new()
    }
}

fn address_cell(offset: u32) -> String {
    to_wire_digits(offset, ADDRESS_DIGITS).to_string()
}

pub fn group_table(
    group: &GroupDefinition,
    blocks: &BlockRegistry,
    settings: ResolveSettings,
) -> TextTable {
    let sysex = settings.should_include_sysex();
    let mut table = TextTable::new().title(format!("Group: {}", group.name));

    if sysex {
        table.push_row([
            "Block",
            "Description",
            "Index",
            "Sysex Start",
            "Byte offset",
            "Block Byte Length",
            "Total Byte Length",
        ]);
    } else {
        table.push_row([
            "Block",
            "Description",
            "Index",
            "Byte offset",
            "Block Byte Length",
            "Total Byte Length",
        ]);
    }

    for placement in group.placements.values() {
        let description = blocks
            .get(&placement.block_name)
            .map(|b| b.description.as_str())
            .unwrap_or_default();

        for i in 0..placement.count {
            let mut row = if i == 0 {
                vec![placement.block_name.clone(), description.to_owned()]
            } else {
                vec![String::new(), String::new()]
            };

            row.push(index_cell(i, placement.count));
            if sysex {
                row.push(address_cell(placement.element_wire_offset(i)));
            }
            row.push(byte_offset_cell(placement.element_byte_offset(i)));

            if i == 0 {
                row.push(placement.block_byte_length.to_string());
                row.push(placement.total_byte_length.to_string());
            }

            table.push_row(row);
        }
    }

    table.set_footer(format!(
        "Group: {} : Total Length Bytes: 0x{:04x} {}",
        group.name, group.total_byte_length, group.total_byte_length
    ));

    table
}

pub fn block_table(
    block: &BlockDefinition,
    blocks: &BlockRegistry,
    settings: ResolveSettings,
) -> TextTable {
    let sysex = settings.should_include_sysex();
    let mut table = TextTable::new().title(format!("Block: {}", block.name));

    if sysex {
        table.push_row([
            "ID",
            "Description",
            "SXOff - len",
            "Byte offset - len",
            "Min",
            "Max",
            "Offset",
            "Init",
            "Values",
        ]);
    } else {
        table.push_row([
            "ID",
            "Description",
            "Byte offset - len",
            "Min",
            "Max",
            "Init",
            "Values",
        ]);
    }

    for entry in block.entries() {
        match entry {
            BlockEntry::Parameter(param) => {
                let wire = param.wire.unwrap_or(ParamWire {
                    offset: 0,
                    length: 0,
                    value_offset: 0,
                });
                table.push_row(value_row(
                    &param.id,
                    &param.description,
                    &wire,
                    param.byte_offset,
                    param.byte_length,
                    param.data_range,
                    param.init_value.unwrap_or(0),
                    labels_cell(param.labels.as_deref()),
                    sysex,
                ));
            }
            BlockEntry::Padding(padding) => {
                let wire = ParamWire {
                    offset: 0,
                    length: 0,
                    value_offset: 0,
                };
                table.push_row(value_row(
                    &padding.id,
                    "__padding",
                    &wire,
                    padding.byte_offset,
                    padding.byte_length,
                    (0, 0),
                    0,
                    String::new(),
                    sysex,
                ));
            }
            BlockEntry::Subblock(subblock) => {
                push_subblock_rows(&mut table, subblock, blocks, sysex);
            }
        }
    }

    match block.wire_length {
        Some(wire_length) if sysex && wire_length > 0 => table.set_footer(format!(
            "Block: {} : Total Length Sysex: {} Bytes: 0x{:04x} {}",
            block.name,
            to_wire_digits(wire_length, 2),
            block.byte_length,
            block.byte_length
        )),
        _ => table.set_footer(format!(
            "Block: {} : Total Length Bytes: 0x{:04x} {}",
            block.name, block.byte_length, block.byte_length
        )),
    }

    table
}

#[allow(clippy::too_many_arguments)]
fn value_row(
    id: &str,
    description: &str,
    wire: &ParamWire,
    byte_offset: u32,
    byte_length: u32,
    data_range: (i64, i64),
    init: i64,
    labels: String,
    sysex: bool,
) -> Vec<String> {
    let mut row = vec![id.to_owned(), description.to_owned()];

    if sysex {
        row.push(format!(
            " {} - {:02x}",
            to_wire_digits(wire.offset, 2),
            wire.length
        ));
    }

    row.push(format!(
        "{} - {:02}",
        byte_offset_cell(byte_offset),
        byte_length
    ));
    row.push(data_range.0.to_string());
    row.push(data_range.1.to_string());

    if sysex {
        row.push(wire.value_offset.to_string());
    }

    row.push(init.to_string());
    row.push(labels);
    row
}

fn push_subblock_rows(
    table: &mut TextTable,
    subblock: &SubblockReference,
    blocks: &BlockRegistry,
    sysex: bool,
) {
    let referenced = blocks.get(&subblock.block_name);
    let wire_item_size = referenced
        .and_then(|b| b.wire_length)
        .filter(|&len| len > 0)
        .unwrap_or(subblock.block_byte_length);
    let name = referenced
        .map(|b| b.name.as_str())
        .unwrap_or(subblock.block_name.as_str());

    for i in 0..subblock.count {
        let mut row = if i == 0 {
            vec![subblock.id.clone(), name.to_owned()]
        } else {
            vec![String::new(), String::new()]
        };

        if sysex {
            let base = subblock.wire.map(|w| w.offset).unwrap_or(0);
            row.push(address_cell(base + i * wire_item_size));
        }

        row.push(format!(
            "{} {} - {:02}",
            index_cell(i, subblock.count),
            byte_offset_cell(subblock.element_byte_offset(i)),
            subblock.block_byte_length
        ));

        let placeholders = if sysex { 4 } else { 3 };
        row.extend(std::iter::repeat_n("-".to_owned(), placeholders));
        row.push(String::new());

        table.push_row(row);
    }
}

fn labels_cell(labels: Option<&[String]>) -> String {
    match labels {
        Some(labels) => {
            let mut cell = labels
                .iter()
                .take(MAX_LISTED_LABELS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if labels.len() > MAX_LISTED_LABELS {
                cell.push_str(" ...");
            }
            cell
        }
        None => String::new(),
    }
}
