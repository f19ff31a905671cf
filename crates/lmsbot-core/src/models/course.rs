//! Course model

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db::{Column, Entity, EntitySchema};

/// Delimiter separating the display name from section/term suffixes
const TITLE_DELIMITER: char = '-';

/// A course the account is enrolled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// LMS-assigned course id
    pub remote_id: i64,
    /// Display name, e.g. `Operating Systems`
    pub name: String,
    /// Course code without the term prefix, e.g. `CS301-01`
    pub code: String,
}

impl Course {
    /// Build a course from the raw LMS title and course code.
    ///
    /// The display name is the title up to the first `-`. The code drops the
    /// leading segment (usually the term) and keeps the rest; a code without
    /// any `-` has no such rest and becomes empty.
    pub fn from_remote(remote_id: i64, raw_name: &str, raw_code: &str) -> Self {
        let name = raw_name
            .split(TITLE_DELIMITER)
            .next()
            .unwrap_or(raw_name)
            .trim()
            .to_string();
        let code = raw_code
            .split_once(TITLE_DELIMITER)
            .map_or("", |(_, rest)| rest)
            .trim()
            .to_string();

        Self {
            remote_id,
            name,
            code,
        }
    }
}

impl Entity for Course {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "course",
        columns: &[
            Column::new("course_id", "INTEGER NOT NULL"),
            Column::new("course_name", "TEXT NOT NULL"),
            Column::new("course_code", "TEXT NOT NULL"),
        ],
        natural_key: &["course_id"],
    };

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.remote_id),
            Value::Text(self.name.clone()),
            Value::Text(self.code.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            remote_id: row.get(1)?,
            name: row.get(2)?,
            code: row.get(3)?,
        })
    }
}
