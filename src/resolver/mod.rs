//! Layout resolution: turns block and group declarations into placed entries.
//!
//! Resolution is strictly serial. A subblock is fully resolved and registered before its parent
//! continues with the next sibling, and groups only ever read blocks that are already
//! registered, so nothing partially sized is ever observed.

mod block;
mod group;

pub use self::block::resolve_block;
pub use self::group::{DEFAULT_WIRE_ITEM_SIZE, resolve_group};

use crate::constants::ConstantTable;
use crate::err::{LayoutError, Result};
use crate::settings::ResolveSettings;

/// Everything a single run shares between block and group resolutions.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub constants: &'a ConstantTable,
    pub settings: ResolveSettings,
}

impl<'a> ResolveContext<'a> {
    pub fn new(constants: &'a ConstantTable, settings: ResolveSettings) -> Self {
        ResolveContext {
            constants,
            settings,
        }
    }

    /// Resolves an optional numeric attribute, `None` when the attribute is absent.
    pub(crate) fn number(
        &self,
        value: Option<&str>,
        entity: &str,
        attribute: &'static str,
    ) -> Result<Option<i64>> {
        value
            .map(|token| {
                self.constants
                    .resolve_number_or_constant(token, entity, attribute)
            })
            .transpose()
    }
}

pub(crate) fn to_u32(value: i64, entity: &str, attribute: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| LayoutError::InvalidNumber {
        entity: entity.to_owned(),
        attribute,
        value: value.to_string(),
    })
}
