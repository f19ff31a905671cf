//! Schema descriptors for mirrored entity kinds

use rusqlite::types::Value;
use rusqlite::Row;

/// Name of the locally-assigned sequence column present on every mirror table.
pub const SEQUENCE_COLUMN: &str = "seq";

/// A single mirrored column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// `SQLite` column definition, e.g. `INTEGER NOT NULL`
    pub definition: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, definition: &'static str) -> Self {
        Self { name, definition }
    }
}

/// Describes how one entity kind is laid out in its mirror table.
///
/// `natural_key` names the columns that identify a row for upsert purposes;
/// every name must appear in `columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    pub table: &'static str,
    pub columns: &'static [Column],
    pub natural_key: &'static [&'static str],
}

impl EntitySchema {
    pub(crate) fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.definition))
            .collect::<Vec<_>>()
            .join(",\n            ");
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
            {SEQUENCE_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT,
            {columns},
            UNIQUE ({key})
        )",
            table = self.table,
            key = self.natural_key.join(", "),
        )
    }

    pub(crate) fn insert_sql(&self) -> String {
        let names = self.column_names().join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT OR IGNORE INTO {} ({names}) VALUES ({placeholders})",
            self.table
        )
    }

    pub(crate) fn select_sql(&self) -> String {
        format!(
            "SELECT {SEQUENCE_COLUMN}, {} FROM {}",
            self.column_names().join(", "),
            self.table
        )
    }

    pub(crate) fn key_predicate_sql(&self) -> String {
        self.natural_key
            .iter()
            .enumerate()
            .map(|(index, name)| format!("{name} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Positions of the natural key columns inside `columns`.
    pub(crate) fn key_positions(&self) -> Vec<usize> {
        self.natural_key
            .iter()
            .filter_map(|key| self.columns.iter().position(|column| column.name == *key))
            .collect()
    }

    fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }
}

/// An entity kind that can be mirrored by [`super::EntityStore`].
pub trait Entity: Sized {
    /// Table layout and natural key
    const SCHEMA: EntitySchema;

    /// Column values in `SCHEMA.columns` order
    fn to_values(&self) -> Vec<Value>;

    /// Rebuild an entity from a row selected with the schema's column list.
    ///
    /// Column 0 is the sequence number, entity columns start at index 1.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Natural key values, in `SCHEMA.natural_key` order
    fn natural_key(&self) -> Vec<Value> {
        let values = self.to_values();
        Self::SCHEMA
            .key_positions()
            .into_iter()
            .map(|position| values[position].clone())
            .collect()
    }
}
