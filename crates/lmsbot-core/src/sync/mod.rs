//! One polling cycle: fetch, mirror, diff, remind.
//!
//! [`SyncEngine::run_cycle`] pulls everything from the LMS, downloads lecture
//! files whose local copy is missing or stale, appends unseen rows to the
//! mirror, announces rows the change watchers have not reported yet, and
//! sends due-date reminders that the ledger has no record of.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SyncSettings;
use crate::db::{Database, EntityStore, NotificationLedger};
use crate::deadline::evaluate;
use crate::error::{Error, Result};
use crate::files::{decide_download, lecture_path, local_size, DownloadDecision};
use crate::lms::{LmsClient, RemoteFile};
use crate::messages;
use crate::models::{Announcement, Assignment, Course, LectureFile};
use crate::notify::Notifier;
use crate::watcher::ChangeWatcher;

/// Counters for one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub courses: usize,
    pub new_courses: usize,
    pub new_assignments: usize,
    pub new_announcements: usize,
    pub new_lecture_files: usize,
    pub files_downloaded: usize,
    pub files_redownloaded: usize,
    pub files_skipped: usize,
    pub download_failures: usize,
    pub notifications_sent: usize,
    pub reminders_sent: usize,
    pub delivery_failures: usize,
}

/// An assignment as fetched this cycle, with its submission state
#[derive(Debug, Clone)]
struct FetchedAssignment {
    assignment: Assignment,
    has_submission: bool,
}

/// Everything fetched from the LMS in one cycle
#[derive(Debug, Default)]
struct Snapshot {
    courses: Vec<Course>,
    assignments: Vec<FetchedAssignment>,
    announcements: Vec<Announcement>,
    files: Vec<LectureFile>,
}

struct Watchers {
    assignments: ChangeWatcher<Assignment>,
    announcements: ChangeWatcher<Announcement>,
    lecture_files: ChangeWatcher<LectureFile>,
}

/// Drives polling cycles against one LMS account and one notifier
pub struct SyncEngine<L, N> {
    db: Database,
    lms: L,
    notifier: N,
    settings: SyncSettings,
    watchers: Watchers,
}

impl<L: LmsClient, N: Notifier> SyncEngine<L, N> {
    /// Create an engine; change watchers start at the mirror's current rows
    pub fn new(db: Database, lms: L, notifier: N, settings: SyncSettings) -> Result<Self> {
        let watchers = Watchers {
            assignments: ChangeWatcher::start(&EntityStore::new(&db))?,
            announcements: ChangeWatcher::start(&EntityStore::new(&db))?,
            lecture_files: ChangeWatcher::start(&EntityStore::new(&db))?,
        };

        Ok(Self {
            db,
            lms,
            notifier,
            settings,
            watchers,
        })
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Run one full cycle at `now`
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let snapshot = self.fetch(&mut report).await?;
        self.mirror(&snapshot, &mut report)?;
        self.announce_new_rows(&mut report).await;
        self.send_reminders(&snapshot, now, &mut report).await?;

        Ok(report)
    }

    /// Best-effort notice that a cycle failed
    pub async fn report_failure(&self, error: &Error) {
        if let Err(e) = self
            .notifier
            .send(&messages::cycle_failed(&error.to_string()))
            .await
        {
            tracing::warn!("Failed to deliver cycle failure notice: {e}");
        }
    }

    async fn fetch(&self, report: &mut CycleReport) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();

        for remote in self.lms.list_courses().await? {
            let course = Course::from_remote(remote.id, &remote.name, &remote.course_code);
            tracing::debug!(course_id = course.remote_id, name = %course.name, "Fetching course");

            for assignment in self.lms.list_assignments(course.remote_id).await? {
                snapshot.assignments.push(FetchedAssignment {
                    has_submission: assignment.has_submission,
                    assignment: Assignment {
                        remote_id: assignment.id,
                        course_id: course.remote_id,
                        course_name: course.name.clone(),
                        name: assignment.name,
                        unlock_at: assignment.unlock_at,
                        due_at: assignment.due_at,
                        description: assignment.description,
                    },
                });
            }

            for announcement in self.lms.list_announcements(course.remote_id).await? {
                snapshot.announcements.push(Announcement {
                    remote_id: announcement.id,
                    course_id: course.remote_id,
                    course_name: course.name.clone(),
                    title: announcement.title,
                    message: announcement.message,
                    posted_at: announcement.posted_at,
                });
            }

            for file in self.lms.list_files(course.remote_id).await? {
                if file.is_downloadable() {
                    self.sync_file(&course, &file, report).await;
                } else {
                    tracing::debug!(file = %file.display_name, "Skipping locked file");
                }
                snapshot.files.push(LectureFile {
                    course_id: course.remote_id,
                    course_name: course.name.clone(),
                    file_name: file.display_name,
                    size: file.size.and_then(|size| i64::try_from(size).ok()),
                });
            }

            snapshot.courses.push(course);
        }

        report.courses = snapshot.courses.len();
        Ok(snapshot)
    }

    /// Bring the local copy of one file up to date.
    ///
    /// Failures are logged and counted; they never abort the cycle.
    async fn sync_file(&self, course: &Course, file: &RemoteFile, report: &mut CycleReport) {
        let path = lecture_path(&self.settings.download_root, &course.name, &file.display_name);

        let local = match local_size(&path).await {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot inspect local file: {e}");
                report.download_failures += 1;
                return;
            }
        };

        let decision = decide_download(local, file.size);
        match decision {
            DownloadDecision::Skip => {
                tracing::debug!(file = %file.display_name, "Local copy is current");
                report.files_skipped += 1;
                return;
            }
            DownloadDecision::Download => {
                tracing::info!(file = %file.display_name, "Downloading new file");
            }
            DownloadDecision::Redownload {
                local_size,
                remote_size,
            } => {
                tracing::info!(
                    file = %file.display_name,
                    local_size,
                    remote_size,
                    "File size changed, downloading again"
                );
                let notice = messages::size_mismatch(
                    &course.name,
                    &file.display_name,
                    local_size,
                    remote_size,
                );
                self.deliver(&notice, report).await;
            }
        }

        match self.lms.download_file(file, &path).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes, "Download complete");
                if matches!(decision, DownloadDecision::Download) {
                    report.files_downloaded += 1;
                } else {
                    report.files_redownloaded += 1;
                }
            }
            Err(e) => {
                tracing::warn!(file = %file.display_name, "Download failed: {e}");
                report.download_failures += 1;
            }
        }
    }

    fn mirror(&self, snapshot: &Snapshot, report: &mut CycleReport) -> Result<()> {
        report.new_courses = EntityStore::new(&self.db).upsert_many(&snapshot.courses)?;
        report.new_assignments = EntityStore::new(&self.db)
            .upsert_many(snapshot.assignments.iter().map(|fetched| &fetched.assignment))?;
        report.new_announcements =
            EntityStore::new(&self.db).upsert_many(&snapshot.announcements)?;
        report.new_lecture_files = EntityStore::new(&self.db).upsert_many(&snapshot.files)?;
        Ok(())
    }

    async fn announce_new_rows(&mut self, report: &mut CycleReport) {
        let zone = self.settings.reference_zone;

        let assignments = self.watchers.assignments.poll(&EntityStore::new(&self.db));
        let announcements = self.watchers.announcements.poll(&EntityStore::new(&self.db));
        let lecture_files = self.watchers.lecture_files.poll(&EntityStore::new(&self.db));

        if !assignments.is_empty() {
            tracing::info!(count = assignments.len(), "New assignments detected");
        }
        for row in assignments {
            self.deliver(&messages::new_assignment(&row.entity, zone), report)
                .await;
        }

        if !announcements.is_empty() {
            tracing::info!(count = announcements.len(), "New announcements detected");
        }
        for row in announcements {
            self.deliver(&messages::new_announcement(&row.entity, zone), report)
                .await;
        }

        if !lecture_files.is_empty() {
            tracing::info!(count = lecture_files.len(), "New lecture files detected");
        }
        for row in lecture_files {
            self.deliver(&messages::new_lecture_file(&row.entity), report)
                .await;
        }
    }

    async fn send_reminders(
        &self,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<()> {
        let ledger = NotificationLedger::new(&self.db);
        let zone = self.settings.reference_zone;

        for fetched in &snapshot.assignments {
            let assignment = &fetched.assignment;
            let Some(threshold) = evaluate(
                now,
                assignment.unlock_time(),
                assignment.due_time(),
                fetched.has_submission,
                zone,
            ) else {
                continue;
            };

            if ledger.was_notified(assignment.remote_id, threshold)? {
                continue;
            }

            let text = messages::due_reminder(assignment, threshold, zone);
            match self.notifier.send(&text).await {
                Ok(()) => {
                    ledger.record(assignment.remote_id, threshold, now)?;
                    report.reminders_sent += 1;
                    tracing::info!(
                        assignment_id = assignment.remote_id,
                        %threshold,
                        "Sent due-date reminder"
                    );
                }
                Err(e) => {
                    report.delivery_failures += 1;
                    tracing::warn!(
                        assignment_id = assignment.remote_id,
                        %threshold,
                        "Reminder not delivered, will retry next cycle: {e}"
                    );
                }
            }
        }

        Ok(())
    }

    async fn deliver(&self, text: &str, report: &mut CycleReport) {
        match self.notifier.send(text).await {
            Ok(()) => report.notifications_sent += 1,
            Err(e) => {
                report.delivery_failures += 1;
                tracing::warn!("Notification not delivered: {e}");
            }
        }
    }
}
