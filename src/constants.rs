use crate::err::{ConstantError, LayoutError, Result};
use hashbrown::HashMap;
use log::trace;

/// Named integer constants declared by `<numdef name=".." num=".."/>`.
///
/// A table is scoped to a single resolution run. Constants are write-once: redefining a name with
/// the same value is accepted, any other value is a [`ConstantError::Conflict`].
#[derive(Debug, Default, Clone)]
pub struct ConstantTable {
    table: HashMap<String, i64>,
}

impl ConstantTable {
    pub fn new() -> Self {
        ConstantTable::default()
    }

    pub fn set(&mut self, name: &str, value: i64) -> std::result::Result<(), ConstantError> {
        match self.table.get(name) {
            Some(&old) if old != value => Err(ConstantError::Conflict {
                name: name.to_owned(),
                old,
                new: value,
            }),
            Some(_) => Ok(()),
            None => {
                trace!("numdef {} = {}", name, value);
                self.table.insert(name.to_owned(), value);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> std::result::Result<i64, ConstantError> {
        self.table
            .get(name)
            .copied()
            .ok_or_else(|| ConstantError::Undefined {
                name: name.to_owned(),
            })
    }

    /// Resolves a size/range/count attribute value: an integer literal is returned as is,
    /// anything else is looked up as a constant name.
    ///
    /// `entity` and `attribute` only serve to locate the offending declaration in errors.
    pub fn resolve_number_or_constant(
        &self,
        token: &str,
        entity: &str,
        attribute: &'static str,
    ) -> Result<i64> {
        let token = token.trim();

        if let Ok(value) = token.parse::<i64>() {
            return Ok(value);
        }

        self.get(token).map_err(|_| LayoutError::UndefinedConstant {
            entity: entity.to_owned(),
            attribute,
            name: token.to_owned(),
        })
    }
}
