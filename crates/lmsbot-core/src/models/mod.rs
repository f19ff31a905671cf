//! Mirrored entity kinds

mod announcement;
mod assignment;
mod course;
mod lecture_file;

pub use announcement::Announcement;
pub use assignment::Assignment;
pub use course::Course;
pub use lecture_file::LectureFile;

use rusqlite::types::Value;

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}
