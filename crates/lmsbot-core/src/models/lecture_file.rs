//! Lecture file model

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db::{Column, Entity, EntitySchema};

/// A course file, identified by its course and display name.
///
/// The mirrored size is the size seen on first insert; later size changes
/// are handled by the file sync path, not by the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureFile {
    pub course_id: i64,
    pub course_name: String,
    pub file_name: String,
    /// Size in bytes, when the LMS reports one
    pub size: Option<i64>,
}

impl Entity for LectureFile {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "lecture_file",
        columns: &[
            Column::new("course_id", "INTEGER NOT NULL"),
            Column::new("course_name", "TEXT NOT NULL"),
            Column::new("file_name", "TEXT NOT NULL"),
            Column::new("file_size", "INTEGER"),
        ],
        natural_key: &["course_id", "file_name"],
    };

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.course_id),
            Value::Text(self.course_name.clone()),
            Value::Text(self.file_name.clone()),
            self.size.map_or(Value::Null, Value::Integer),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            course_id: row.get(1)?,
            course_name: row.get(2)?,
            file_name: row.get(3)?,
            size: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_natural_key_is_course_and_name() {
        let file = LectureFile {
            course_id: 3,
            course_name: "Networks".to_string(),
            file_name: "week1.pdf".to_string(),
            size: Some(10),
        };
        assert_eq!(
            file.natural_key(),
            vec![Value::Integer(3), Value::Text("week1.pdf".to_string())]
        );
    }
}
