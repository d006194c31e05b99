use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised by the [`ConstantTable`](crate::ConstantTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantError {
    #[error("numdef `{name}` is being set to a different value, was {old} now {new}")]
    Conflict { name: String, old: i64, new: i64 },

    #[error("missing numdef `{name}`")]
    Undefined { name: String },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    /// A `numdef` redefined a constant with a different value.
    #[error(transparent)]
    Constant(#[from] ConstantError),

    #[error("`{entity}`: attribute `{attribute}` references missing numdef `{name}`")]
    UndefinedConstant {
        entity: String,
        attribute: &'static str,
        name: String,
    },

    #[error("`{entity}`: attribute `{attribute}` expected an integer, found `{value}`")]
    InvalidNumber {
        entity: String,
        attribute: &'static str,
        value: String,
    },

    #[error("group `{group}` references unknown block `{block}`")]
    UnknownBlock { group: String, block: String },

    #[error("unknown element <{tag}> in {context}")]
    UnknownElement { tag: String, context: String },

    #[error("`{entity}`: cannot find attribute `{attribute}` in <{element}>")]
    MissingAttribute {
        entity: String,
        element: &'static str,
        attribute: &'static str,
    },

    #[error(
        "name conflict detected, the following names are used as both blocks and groups: {}",
        names.join(", ")
    )]
    NameCollision { names: Vec<String> },

    #[error("malformed wire address `{text}`: {reason}")]
    MalformedAddress { text: String, reason: &'static str },

    #[error("block `{block}` declares subblock `{subblock}` whose name is already registered")]
    DuplicateSubblock { block: String, subblock: String },

    #[error("block `{block}` declares entry `{id}` more than once")]
    DuplicateEntry { block: String, id: String },

    #[error("block `{name}` is defined more than once")]
    DuplicateBlock { name: String },

    #[error("group `{name}` is defined more than once")]
    DuplicateGroup { name: String },

    #[error("`{entity}`: attribute `{attribute}` overflows the address space")]
    Overflow {
        entity: String,
        attribute: &'static str,
    },

    #[error("cannot find block `{name}`")]
    BlockNotFound { name: String },

    #[error("cannot find group `{name}`")]
    GroupNotFound { name: String },

    #[error("document has no root element")]
    MissingRoot,

    // `quick-xml` tracks element nesting for us, so structural errors land here too.
    #[error("reading schema XML failed at position {position}: {message}")]
    Xml { position: u64, message: String },
}

impl LayoutError {
    pub(crate) fn xml(position: u64, err: impl std::fmt::Display) -> Self {
        LayoutError::Xml {
            position,
            message: err.to_string(),
        }
    }
}
