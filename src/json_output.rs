//! JSON rendering of a resolved [`Layout`].
//!
//! Blocks and groups share one top level object keyed by name, blocks first. Subblock and group
//! wire offsets are written as 3-digit wire address text (`"00 01 00"`), parameter wire offsets as
//! plain numbers.

use crate::model::*;
use crate::settings::ResolveSettings;
use crate::wire::{ADDRESS_DIGITS, to_wire_digits};

use serde_json::{Map, Value, json};

pub fn render_json(
    layout: &Layout,
    settings: ResolveSettings,
    pretty: bool,
) -> serde_json::Result<String> {
    let value = layout_to_value(layout, settings);

    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

pub fn layout_to_value(layout: &Layout, settings: ResolveSettings) -> Value {
    let mut root = Map::new();

    for block in layout.blocks().iter() {
        root.insert(block.name.clone(), block_to_value(block, settings));
    }
    for group in layout.groups().iter() {
        root.insert(group.name.clone(), group_to_value(group, settings));
    }

    Value::Object(root)
}

pub fn block_to_value(block: &BlockDefinition, settings: ResolveSettings) -> Value {
    let mut object = Map::new();
    object.insert("name".into(), json!(block.name));
    object.insert("description".into(), json!(block.description));
    object.insert("byteLength".into(), json!(block.byte_length));

    if let Some(wire_length) = block.wire_length {
        object.insert("sysexLength".into(), json!(wire_length));
    }

    if let Some(entries) = &block.entries {
        let parameters: Map<String, Value> = entries
            .iter()
            .map(|(id, entry)| (id.to_owned(), entry_to_value(entry, settings)))
            .collect();
        object.insert("parameters".into(), Value::Object(parameters));
    }

    Value::Object(object)
}

fn entry_to_value(entry: &BlockEntry, settings: ResolveSettings) -> Value {
    match entry {
        BlockEntry::Parameter(param) => parameter_to_value(param, settings),
        BlockEntry::Padding(padding) => padding_to_value(padding, settings),
        BlockEntry::Subblock(subblock) => subblock_to_value(subblock),
    }
}

fn parameter_to_value(param: &ParameterEntry, settings: ResolveSettings) -> Value {
    let mut object = Map::new();
    object.insert("id".into(), json!(param.id));
    object.insert("byteOffset".into(), json!(param.byte_offset));
    object.insert("lengthBytes".into(), json!(param.byte_length));
    object.insert("description".into(), json!(param.description));
    object.insert(
        "dataRange".into(),
        json!([param.data_range.0, param.data_range.1]),
    );
    object.insert("initValue".into(), json!(param.init_value.unwrap_or(0)));

    if settings.should_include_padding() {
        object.insert("isPadding".into(), json!(false));
    }

    if let Some(wire) = &param.wire {
        object.insert("sysexOffset".into(), json!(wire.offset));
        object.insert("lengthSysex".into(), json!(wire.length));
        object.insert("sysexValueOffset".into(), json!(wire.value_offset));
    }

    if let Some(measurement) = &param.display_measurement {
        object.insert("displayMeasurement".into(), json!(measurement));
    }

    if let Some((min, max)) = param.display_range {
        object.insert("displayRange".into(), json!([number(min), number(max)]));
    }

    if let Some(labels) = &param.labels {
        let values: Map<String, Value> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (i.to_string(), json!(label)))
            .collect();
        object.insert("values".into(), Value::Object(values));
    }

    Value::Object(object)
}

fn padding_to_value(padding: &PaddingEntry, settings: ResolveSettings) -> Value {
    let mut object = Map::new();
    object.insert("id".into(), json!(padding.id));
    object.insert("byteOffset".into(), json!(padding.byte_offset));
    object.insert("lengthBytes".into(), json!(padding.byte_length));
    object.insert("description".into(), json!("__padding"));
    object.insert("dataRange".into(), json!([0, 0]));
    object.insert("initValue".into(), Value::Null);
    object.insert("isPadding".into(), json!(true));

    if settings.should_include_sysex() {
        object.insert("sysexOffset".into(), json!(0));
        object.insert("lengthSysex".into(), json!(0));
        object.insert("sysexValueOffset".into(), Value::Null);
    }

    Value::Object(object)
}

fn subblock_to_value(subblock: &SubblockReference) -> Value {
    let mut object = Map::new();
    object.insert("id".into(), json!(subblock.id));
    object.insert("byteOffset".into(), json!(subblock.byte_offset));
    object.insert("lengthBytes".into(), json!(subblock.byte_length));
    object.insert("description".into(), json!(subblock.description));
    object.insert("blockName".into(), json!(subblock.block_name));
    object.insert("count".into(), json!(subblock.count));
    object.insert("blockByteLength".into(), json!(subblock.block_byte_length));

    if let Some(wire) = &subblock.wire {
        object.insert("sysexOffset".into(), json!(address_text(wire.offset)));
        object.insert("lengthSysex".into(), json!(wire.length));
    }

    Value::Object(object)
}

pub fn group_to_value(group: &GroupDefinition, settings: ResolveSettings) -> Value {
    let parameters: Map<String, Value> = group
        .placements
        .iter()
        .map(|(name, placement)| (name.to_owned(), placement_to_value(placement, settings)))
        .collect();

    json!({
        "name": group.name,
        "parameters": parameters,
        "totalByteLength": group.total_byte_length,
    })
}

fn placement_to_value(placement: &GroupBlockPlacement, settings: ResolveSettings) -> Value {
    let mut object = Map::new();
    object.insert("blockName".into(), json!(placement.block_name));
    object.insert("count".into(), json!(placement.count));
    object.insert("byteOffset".into(), json!(placement.byte_offset));
    object.insert("blockByteLength".into(), json!(placement.block_byte_length));
    object.insert("totalByteLength".into(), json!(placement.total_byte_length));

    if settings.should_include_sysex() {
        object.insert(
            "sysexOffset".into(),
            json!(address_text(placement.wire_offset)),
        );
        object.insert("sysexItemSize".into(), json!(placement.wire_item_size));
    }

    Value::Object(object)
}

fn address_text(offset: u32) -> String {
    to_wire_digits(offset, ADDRESS_DIGITS).to_string()
}

/// Whole numbers are written without a fractional part.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutBuilder;
    use crate::schema::SchemaDocument;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
        <zen>
          <baseblock name="FX" desc="Effect">
            <param id="TYPE" desc="Type" min="0" max="2" desc_val="OFF, CHORUS, DELAY"/>
            <padding bytesize="1"/>
            <subblock id="PRM" desc="Parameter" array="2">
              <param id="VAL" desc="Value" min="0" max="1000" sysex_ofst="-500" desc_val="-50.5 - +50.5 [dB]"/>
            </subblock>
          </baseblock>
          <group name="ALL">
            <offset adrs="10 00 00"/>
            <block baseblock="FX" array="2" size="00 20"/>
          </group>
        </zen>
    "#;

    fn layout(settings: ResolveSettings) -> Layout {
        LayoutBuilder::new(settings)
            .import_all(SchemaDocument::parse(SCHEMA).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_layout_to_value() {
        let settings = ResolveSettings::new().include_padding(true);
        let value = layout_to_value(&layout(settings), settings);

        assert_eq!(
            value,
            json!({
                "FX_PRM": {
                    "name": "FX_PRM",
                    "description": "Parameter",
                    "byteLength": 2,
                    "sysexLength": 4,
                    "parameters": {
                        "VAL": {
                            "id": "VAL",
                            "byteOffset": 0,
                            "lengthBytes": 2,
                            "description": "Value",
                            "dataRange": [0, 1000],
                            "initValue": 0,
                            "isPadding": false,
                            "sysexOffset": 0,
                            "lengthSysex": 4,
                            "sysexValueOffset": -500,
                            "displayMeasurement": "dB",
                            "displayRange": [-50.5, 50.5]
                        }
                    }
                },
                "FX": {
                    "name": "FX",
                    "description": "Effect",
                    "byteLength": 6,
                    "sysexLength": 9,
                    "parameters": {
                        "TYPE": {
                            "id": "TYPE",
                            "byteOffset": 0,
                            "lengthBytes": 1,
                            "description": "Type",
                            "dataRange": [0, 2],
                            "initValue": 0,
                            "isPadding": false,
                            "sysexOffset": 0,
                            "lengthSysex": 1,
                            "sysexValueOffset": 0,
                            "values": { "0": "OFF", "1": "CHORUS", "2": "DELAY" }
                        },
                        "PADDING1": {
                            "id": "PADDING1",
                            "byteOffset": 1,
                            "lengthBytes": 1,
                            "description": "__padding",
                            "dataRange": [0, 0],
                            "initValue": null,
                            "isPadding": true,
                            "sysexOffset": 0,
                            "lengthSysex": 0,
                            "sysexValueOffset": null
                        },
                        "PRM": {
                            "id": "PRM",
                            "byteOffset": 2,
                            "lengthBytes": 4,
                            "description": "Parameter",
                            "blockName": "FX_PRM",
                            "count": 2,
                            "blockByteLength": 2,
                            "sysexOffset": "00 00 01",
                            "lengthSysex": 8
                        }
                    }
                },
                "ALL": {
                    "name": "ALL",
                    "parameters": {
                        "FX": {
                            "blockName": "FX",
                            "count": 2,
                            "byteOffset": 0,
                            "blockByteLength": 6,
                            "totalByteLength": 12,
                            "sysexOffset": "10 00 00",
                            "sysexItemSize": 32
                        }
                    },
                    "totalByteLength": 12
                }
            })
        );
    }

    #[test]
    fn test_without_sysex_fields() {
        let settings = ResolveSettings::new().include_sysex(false);
        let value = layout_to_value(&layout(settings), settings);

        assert_eq!(value["FX"].get("sysexLength"), None);
        assert_eq!(value["FX"]["parameters"]["TYPE"].get("sysexOffset"), None);
        assert_eq!(value["FX"]["parameters"]["TYPE"].get("isPadding"), None);
        assert_eq!(value["FX"]["parameters"]["PRM"].get("sysexOffset"), None);
        assert_eq!(value["ALL"]["parameters"]["FX"].get("sysexItemSize"), None);
        assert_eq!(value["FX"]["parameters"].get("PADDING1"), None);
    }

    #[test]
    fn test_render_keeps_declaration_order() {
        let settings = ResolveSettings::new();
        let text = render_json(&layout(settings), settings, false).unwrap();

        let fx_prm = text.find("\"FX_PRM\":").unwrap();
        let fx = text.find("\"FX\":").unwrap();
        let all = text.find("\"ALL\":").unwrap();
        assert!(fx_prm < fx && fx < all);
        assert!(!text.contains('\n'));

        let pretty = render_json(&layout(settings), settings, true).unwrap();
        assert!(pretty.contains("\n  \"FX\": {"));
    }
}
