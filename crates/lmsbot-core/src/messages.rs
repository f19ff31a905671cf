//! Plain-text message formatting for the notifier

use chrono::FixedOffset;

use crate::deadline::Threshold;
use crate::models::{Announcement, Assignment, LectureFile};
use crate::util::{format_timestamp, strip_html, truncate_chars};

const ANNOUNCEMENT_PREVIEW_CHARS: usize = 300;

pub fn new_assignment(assignment: &Assignment, zone: FixedOffset) -> String {
    format!(
        "[{}] New assignment: {}\nDue: {}",
        assignment.course_name,
        assignment.name,
        format_timestamp(assignment.due_at.as_deref(), zone)
    )
}

pub fn new_announcement(announcement: &Announcement, zone: FixedOffset) -> String {
    let mut text = format!(
        "[{}] New announcement: {}\nPosted: {}",
        announcement.course_name,
        announcement.title,
        format_timestamp(announcement.posted_at.as_deref(), zone)
    );
    let preview = strip_html(&announcement.message);
    if !preview.is_empty() {
        text.push_str("\n\n");
        text.push_str(&truncate_chars(&preview, ANNOUNCEMENT_PREVIEW_CHARS));
    }
    text
}

pub fn new_lecture_file(file: &LectureFile) -> String {
    format!("[{}] New lecture file: {}", file.course_name, file.file_name)
}

/// Reminder for an assignment inside a due-date window
pub fn due_reminder(assignment: &Assignment, threshold: Threshold, zone: FixedOffset) -> String {
    let when = match threshold {
        Threshold::DueToday => "today",
        Threshold::DueTomorrow => "tomorrow",
        Threshold::DueInThreeDays => "in 3 days",
    };
    format!(
        "[{}] {} {} is due {when}\nDue: {}",
        assignment.course_name,
        threshold.label(),
        assignment.name,
        format_timestamp(assignment.due_at.as_deref(), zone)
    )
}

pub fn size_mismatch(course_name: &str, file_name: &str, local_size: u64, remote_size: u64) -> String {
    format!(
        "[{course_name}] {file_name} changed size ({local_size} -> {remote_size} bytes), downloading again"
    )
}

pub fn cycle_failed(error: &str) -> String {
    format!("LMS bot cycle failed: {error}")
}
