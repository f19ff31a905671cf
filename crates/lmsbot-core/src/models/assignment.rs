//! Assignment model

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::optional_text;
use crate::db::{Column, Entity, EntitySchema};
use crate::util::parse_timestamp;

/// An assignment as first seen on the LMS.
///
/// Timestamps are kept exactly as received and parsed when used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub remote_id: i64,
    pub course_id: i64,
    pub course_name: String,
    pub name: String,
    pub unlock_at: Option<String>,
    pub due_at: Option<String>,
    /// Rich text (HTML)
    pub description: Option<String>,
}

impl Assignment {
    /// Parsed unlock instant, `None` when absent or malformed
    pub fn unlock_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.unlock_at.as_deref())
    }

    /// Parsed due instant, `None` when absent or malformed
    pub fn due_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.due_at.as_deref())
    }
}

impl Entity for Assignment {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "assignment",
        columns: &[
            Column::new("assignment_id", "INTEGER NOT NULL"),
            Column::new("course_id", "INTEGER NOT NULL"),
            Column::new("course_name", "TEXT NOT NULL"),
            Column::new("name", "TEXT NOT NULL"),
            Column::new("unlock_at", "TEXT"),
            Column::new("due_at", "TEXT"),
            Column::new("description", "TEXT"),
        ],
        natural_key: &["assignment_id"],
    };

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.remote_id),
            Value::Integer(self.course_id),
            Value::Text(self.course_name.clone()),
            Value::Text(self.name.clone()),
            optional_text(self.unlock_at.as_deref()),
            optional_text(self.due_at.as_deref()),
            optional_text(self.description.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            remote_id: row.get(1)?,
            course_id: row.get(2)?,
            course_name: row.get(3)?,
            name: row.get(4)?,
            unlock_at: row.get(5)?,
            due_at: row.get(6)?,
            description: row.get(7)?,
        })
    }
}
