//! LMS collaborator: what the sync engine needs from the remote platform

mod canvas;

pub use canvas::CanvasClient;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A course as listed by the LMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCourse {
    pub id: i64,
    /// Raw title, e.g. `Operating Systems-01`
    pub name: String,
    /// Raw course code, e.g. `2024-1-CS301-01`
    pub course_code: String,
}

/// An assignment together with the caller's submission state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAssignment {
    pub id: i64,
    pub name: String,
    pub unlock_at: Option<String>,
    pub due_at: Option<String>,
    pub description: Option<String>,
    pub has_submission: bool,
}

/// A course announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAnnouncement {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub posted_at: Option<String>,
}

/// A file attached to a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: i64,
    pub display_name: String,
    pub size: Option<u64>,
    pub locked: bool,
    /// Download URL; absent when the file cannot be downloaded
    pub url: Option<String>,
}

impl RemoteFile {
    /// Whether the account may download this file right now
    pub fn is_downloadable(&self) -> bool {
        !self.locked && self.url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Trait for LMS read operations (async)
#[allow(async_fn_in_trait)]
pub trait LmsClient {
    /// Courses the account is enrolled in
    async fn list_courses(&self) -> Result<Vec<RemoteCourse>>;

    /// Assignments of a course, including the account's submission state
    async fn list_assignments(&self, course_id: i64) -> Result<Vec<RemoteAssignment>>;

    /// Announcements of a course
    async fn list_announcements(&self, course_id: i64) -> Result<Vec<RemoteAnnouncement>>;

    /// Files of a course
    async fn list_files(&self, course_id: i64) -> Result<Vec<RemoteFile>>;

    /// Download `file` to `dest`, returning the number of bytes written
    async fn download_file(&self, file: &RemoteFile, dest: &Path) -> Result<u64>;
}
