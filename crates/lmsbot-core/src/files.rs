//! Local lecture-file layout and download decisions

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Lowercase markers that put a file among the lecture material
const LECTURE_MARKERS: [&str; 4] = ["pdf", "ppt", "doc", "hwp"];

/// Sub-directory a downloaded file is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    LectureNotes,
    Other,
}

impl FileCategory {
    /// Lecture notes are files whose lowercased name contains `pdf`, `ppt`,
    /// `doc` or `hwp` anywhere, not only in the extension.
    pub fn of(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        if LECTURE_MARKERS.iter().any(|marker| name.contains(marker)) {
            Self::LectureNotes
        } else {
            Self::Other
        }
    }

    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::LectureNotes => "lecture-notes",
            Self::Other => "other",
        }
    }
}

/// What to do with one remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadDecision {
    /// No local copy yet
    Download,
    /// Local copy differs in size from the remote file
    Redownload { local_size: u64, remote_size: u64 },
    /// Local copy is current, or cannot be compared
    Skip,
}

/// Compare the local copy (if any) against the remote size.
///
/// An existing copy whose remote size is unknown is skipped rather than
/// downloaded again, since there is nothing to compare it against.
pub const fn decide_download(local_size: Option<u64>, remote_size: Option<u64>) -> DownloadDecision {
    match (local_size, remote_size) {
        (None, _) => DownloadDecision::Download,
        (Some(local_size), Some(remote_size)) if local_size != remote_size => {
            DownloadDecision::Redownload {
                local_size,
                remote_size,
            }
        }
        (Some(_), _) => DownloadDecision::Skip,
    }
}

/// Replace characters that would escape or break a single path component
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '\0' => '_',
            ch => ch,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// `<root>/<course>/<category>/<file>`
pub fn lecture_path(root: &Path, course_name: &str, file_name: &str) -> PathBuf {
    root.join(sanitize_component(course_name))
        .join(FileCategory::of(file_name).dir_name())
        .join(sanitize_component(file_name))
}

/// Size of the file at `path`, `None` when it does not exist
pub async fn local_size(path: &Path) -> io::Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} exists but is not a file", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write `bytes` to a sibling temporary file, then rename it over `dest`
pub async fn write_atomically(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut partial_name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    partial_name.push(".part");
    let partial = dest.with_file_name(partial_name);

    tokio::fs::write(&partial, bytes).await?;
    if let Err(e) = tokio::fs::rename(&partial, dest).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_decide_download() {
        assert_eq!(decide_download(None, Some(1000)), DownloadDecision::Download);
        assert_eq!(decide_download(None, None), DownloadDecision::Download);
        assert_eq!(decide_download(Some(1000), Some(1000)), DownloadDecision::Skip);
        assert_eq!(
            decide_download(Some(1000), Some(1200)),
            DownloadDecision::Redownload {
                local_size: 1000,
                remote_size: 1200
            }
        );
        assert_eq!(decide_download(Some(1000), None), DownloadDecision::Skip);
    }

    #[test]
    fn test_category_by_name() {
        assert_eq!(FileCategory::of("week1.PDF"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("slides.pptx"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("report.docx"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("과제안내.hwpx"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("dataset.zip"), FileCategory::Other);
        assert_eq!(FileCategory::of("pdf-notes"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("Week3_PPT_handout.zip"), FileCategory::LectureNotes);
        assert_eq!(FileCategory::of("lab-data.csv"), FileCategory::Other);
    }

    #[test]
    fn test_lecture_path_layout() {
        let path = lecture_path(Path::new("/univ"), "Operating Systems", "week1.pdf");
        assert_eq!(
            path,
            PathBuf::from("/univ/Operating Systems/lecture-notes/week1.pdf")
        );
    }

    #[test]
    fn test_sanitize_component_blocks_traversal() {
        assert_eq!(sanitize_component("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("  "), "_");
        assert_eq!(sanitize_component("a\\b"), "a_b");
    }

    #[tokio::test]
    async fn test_local_size_missing_and_present() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("week1.pdf");
        assert_eq!(local_size(&path).await.unwrap(), None);

        std::fs::write(&path, vec![0_u8; 1000]).unwrap();
        assert_eq!(local_size(&path).await.unwrap(), Some(1000));
    }

    #[tokio::test]
    async fn test_local_size_rejects_directory() {
        let tmp = tempdir().unwrap();
        assert!(local_size(tmp.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_write_atomically_replaces_file() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("course").join("other").join("data.zip");

        write_atomically(&dest, b"first").await.unwrap();
        write_atomically(&dest, b"second version").await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"second version");
        assert!(!dest.with_file_name("data.zip.part").exists());
    }
}
