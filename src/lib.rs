#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

pub use annotation::{BIPOLAR_SENTINEL, ValueAnnotation, parse_value_annotation};
pub use config::{ImportXml, RunConfig, RunSettings};
pub use constants::ConstantTable;
pub use err::{ConstantError, LayoutError, Result};
pub use json_output::{layout_to_value, render_json};
pub use layout::LayoutBuilder;
pub use model::{
    BlockDefinition, BlockEntry, BlockRegistry, GroupBlockPlacement, GroupDefinition,
    GroupRegistry, Layout, PaddingEntry, ParamWire, ParameterEntry,
    SubblockReference, SubblockWire, ValueWidth,
};
pub use resolver::{DEFAULT_WIRE_ITEM_SIZE, ResolveContext, resolve_block, resolve_group};
pub use schema::{
    BlockDecl, BlockItem, BlockKind, Declaration, GroupDecl, GroupItem, NumDef, ParamDecl,
    SchemaDocument, SubblockDecl,
};
pub use settings::ResolveSettings;
pub use text_output::render_text;
pub use wire::{ADDRESS_DIGITS, WireDigits, from_wire_digits, to_wire_digits};

mod annotation;
mod config;
mod constants;
pub mod err;
mod json_output;
mod layout;
pub mod model;
mod resolver;
pub mod schema;
mod schema_reader;
mod settings;
mod text_output;
pub mod utils;
mod wire;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
