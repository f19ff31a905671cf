//! Announcement model

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::optional_text;
use crate::db::{Column, Entity, EntitySchema};

/// A course announcement as first seen on the LMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub remote_id: i64,
    pub course_id: i64,
    pub course_name: String,
    pub title: String,
    /// Rich text (HTML)
    pub message: String,
    pub posted_at: Option<String>,
}

impl Entity for Announcement {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "announcement",
        columns: &[
            Column::new("announcement_id", "INTEGER NOT NULL"),
            Column::new("course_id", "INTEGER NOT NULL"),
            Column::new("course_name", "TEXT NOT NULL"),
            Column::new("title", "TEXT NOT NULL"),
            Column::new("message", "TEXT NOT NULL"),
            Column::new("posted_at", "TEXT"),
        ],
        natural_key: &["announcement_id"],
    };

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.remote_id),
            Value::Integer(self.course_id),
            Value::Text(self.course_name.clone()),
            Value::Text(self.title.clone()),
            Value::Text(self.message.clone()),
            optional_text(self.posted_at.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            remote_id: row.get(1)?,
            course_id: row.get(2)?,
            course_name: row.get(3)?,
            title: row.get(4)?,
            message: row.get(5)?,
            posted_at: row.get(6)?,
        })
    }
}
