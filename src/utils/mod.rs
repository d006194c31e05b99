mod text_table;

pub use self::text_table::TextTable;
