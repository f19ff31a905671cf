//! Canvas REST API client.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::header::{ACCEPT, LINK};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{LmsClient, RemoteAnnouncement, RemoteAssignment, RemoteCourse, RemoteFile};
use crate::error::{Error, Result};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const PAGE_SIZE: &str = "100";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// What to do when a listing endpoint answers 401/403
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnForbidden {
    Fail,
    Empty,
}

#[derive(Clone)]
pub struct CanvasClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl fmt::Debug for CanvasClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CanvasClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CanvasClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = normalize_text_option(Some(base_url.into()))
            .filter(|url| is_http_url(url))
            .ok_or_else(|| {
                Error::InvalidInput("LMS base URL must include http:// or https://".to_string())
            })?;
        let api_key = normalize_text_option(Some(api_key.into()))
            .ok_or_else(|| Error::InvalidInput("LMS API key must not be empty".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Fetch every page of a JSON array endpoint under `/api/v1/`.
    async fn fetch_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        on_forbidden: OnForbidden,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut request = self
            .client
            .get(format!("{}/api/v1/{path}", self.base_url))
            .query(query)
            .query(&[("per_page", PAGE_SIZE)]);

        loop {
            let response = request
                .bearer_auth(&self.api_key)
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if on_forbidden == OnForbidden::Empty
                && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            {
                tracing::debug!(path, status = status.as_u16(), "Listing not accessible");
                return Ok(Vec::new());
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Lms(parse_api_error(status, &body)));
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_next_link);
            items.extend(response.json::<Vec<T>>().await?);

            match next {
                Some(url) => request = self.client.get(url),
                None => return Ok(items),
            }
        }
    }
}

impl LmsClient for CanvasClient {
    async fn list_courses(&self) -> Result<Vec<RemoteCourse>> {
        let courses: Vec<CanvasCourse> = self
            .fetch_pages("courses", &[("enrollment_state", "active")], OnForbidden::Fail)
            .await?;
        Ok(courses.into_iter().filter_map(CanvasCourse::into_remote).collect())
    }

    async fn list_assignments(&self, course_id: i64) -> Result<Vec<RemoteAssignment>> {
        let assignments: Vec<CanvasAssignment> = self
            .fetch_pages(
                &format!("courses/{course_id}/assignments"),
                &[("include[]", "submission")],
                OnForbidden::Fail,
            )
            .await?;
        Ok(assignments.into_iter().map(Into::into).collect())
    }

    async fn list_announcements(&self, course_id: i64) -> Result<Vec<RemoteAnnouncement>> {
        let context = format!("course_{course_id}");
        let topics: Vec<CanvasTopic> = self
            .fetch_pages(
                "announcements",
                &[("context_codes[]", context.as_str())],
                OnForbidden::Empty,
            )
            .await?;
        Ok(topics.into_iter().map(Into::into).collect())
    }

    async fn list_files(&self, course_id: i64) -> Result<Vec<RemoteFile>> {
        let files: Vec<CanvasFile> = self
            .fetch_pages(&format!("courses/{course_id}/files"), &[], OnForbidden::Empty)
            .await?;
        Ok(files.into_iter().map(Into::into).collect())
    }

    async fn download_file(&self, file: &RemoteFile, dest: &Path) -> Result<u64> {
        let url = file
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Lms(format!("{} has no download URL", file.display_name)))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Lms(parse_api_error(status, &body)));
        }

        let bytes = response.bytes().await?;
        crate::files::write_atomically(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[derive(Debug, Deserialize)]
struct CanvasCourse {
    id: i64,
    name: Option<String>,
    course_code: Option<String>,
}

impl CanvasCourse {
    /// Courses without a name are restricted enrollments and are skipped
    fn into_remote(self) -> Option<RemoteCourse> {
        let name = normalize_text_option(self.name)?;
        Some(RemoteCourse {
            id: self.id,
            course_code: self.course_code.unwrap_or_default(),
            name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CanvasAssignment {
    id: i64,
    name: String,
    unlock_at: Option<String>,
    due_at: Option<String>,
    description: Option<String>,
    submission: Option<CanvasSubmission>,
}

#[derive(Debug, Deserialize)]
struct CanvasSubmission {
    submitted_at: Option<String>,
    workflow_state: Option<String>,
}

impl CanvasSubmission {
    fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
            || matches!(
                self.workflow_state.as_deref(),
                Some("submitted" | "pending_review")
            )
    }
}

impl From<CanvasAssignment> for RemoteAssignment {
    fn from(value: CanvasAssignment) -> Self {
        Self {
            has_submission: value
                .submission
                .as_ref()
                .is_some_and(CanvasSubmission::is_submitted),
            id: value.id,
            name: value.name,
            unlock_at: value.unlock_at,
            due_at: value.due_at,
            description: value.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CanvasTopic {
    id: i64,
    title: Option<String>,
    message: Option<String>,
    posted_at: Option<String>,
}

impl From<CanvasTopic> for RemoteAnnouncement {
    fn from(value: CanvasTopic) -> Self {
        Self {
            id: value.id,
            title: value.title.unwrap_or_default(),
            message: value.message.unwrap_or_default(),
            posted_at: value.posted_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CanvasFile {
    id: i64,
    display_name: String,
    size: Option<u64>,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    locked_for_user: bool,
    url: Option<String>,
}

impl From<CanvasFile> for RemoteFile {
    fn from(value: CanvasFile) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            size: value.size,
            locked: value.locked || value.locked_for_user,
            url: value.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CanvasErrorBody {
    message: Option<String>,
    errors: Option<Vec<CanvasErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct CanvasErrorMessage {
    message: String,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<CanvasErrorBody>(body) {
        let message = payload.message.or_else(|| {
            payload
                .errors
                .and_then(|errors| errors.into_iter().next())
                .map(|error| error.message)
        });
        if let Some(message) = message {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|target| target.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_rejects_invalid_configuration() {
        assert!(CanvasClient::new("canvas.example.edu", "key").is_err());
        assert!(CanvasClient::new("https://canvas.example.edu", "  ").is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = CanvasClient::new("https://canvas.example.edu/", "secret-key").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("https://canvas.example.edu\""));
    }

    #[test]
    fn parse_next_link_finds_next_relation() {
        let header = "<https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"current\",\
                      <https://canvas.example.edu/api/v1/courses?page=2&per_page=100>; rel=\"next\",\
                      <https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"first\"";
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://canvas.example.edu/api/v1/courses?page=2&per_page=100")
        );
    }

    #[test]
    fn parse_next_link_absent_on_last_page() {
        let header = "<https://canvas.example.edu/api/v1/courses?page=3>; rel=\"current\",\
                      <https://canvas.example.edu/api/v1/courses?page=1>; rel=\"first\"";
        assert_eq!(parse_next_link(header), None);
    }

    #[test]
    fn assignment_submission_state_is_derived() {
        let payload = r#"[
            {"id": 1, "name": "HW1", "unlock_at": null, "due_at": "2024-05-10T14:59:59Z",
             "description": "<p>Read ch. 3</p>",
             "submission": {"submitted_at": "2024-05-09T01:00:00Z", "workflow_state": "submitted"}},
            {"id": 2, "name": "HW2", "unlock_at": null, "due_at": null, "description": null,
             "submission": {"submitted_at": null, "workflow_state": "unsubmitted"}},
            {"id": 3, "name": "HW3", "unlock_at": null, "due_at": null, "description": null}
        ]"#;
        let assignments: Vec<CanvasAssignment> = serde_json::from_str(payload).unwrap();
        let remote = assignments
            .into_iter()
            .map(RemoteAssignment::from)
            .map(|assignment| (assignment.id, assignment.has_submission))
            .collect::<Vec<_>>();
        assert_eq!(remote, vec![(1, true), (2, false), (3, false)]);
    }

    #[test]
    fn file_lock_flags_are_combined() {
        let payload = r#"{"id": 5, "display_name": "week1.pdf", "size": 1000,
                          "locked_for_user": true, "url": "https://canvas.example.edu/files/5/download"}"#;
        let file: RemoteFile = serde_json::from_str::<CanvasFile>(payload).unwrap().into();
        assert!(file.locked);
        assert!(!file.is_downloadable());
    }

    #[test]
    fn unnamed_courses_are_skipped() {
        let payload = r#"[{"id": 1, "name": "Compilers-01", "course_code": "2024-CS440"},
                          {"id": 2, "access_restricted_by_date": true}]"#;
        let courses: Vec<CanvasCourse> = serde_json::from_str(payload).unwrap();
        let remote = courses
            .into_iter()
            .filter_map(CanvasCourse::into_remote)
            .collect::<Vec<_>>();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].course_code, "2024-CS440");
    }

    #[test]
    fn parse_api_error_prefers_json_message() {
        let body = r#"{"errors":[{"message":"Invalid access token."}]}"#;
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, body),
            "Invalid access token. (401)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}
