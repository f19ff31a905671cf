use lmsbot_core::db::Database;
use lmsbot_core::lms::CanvasClient;
use lmsbot_core::notify::TelegramNotifier;
use lmsbot_core::{CycleReport, SyncEngine};

use crate::config::AppConfig;
use crate::error::CliError;

pub type Engine = SyncEngine<CanvasClient, TelegramNotifier>;

/// Open the mirror and wire the Canvas and Telegram collaborators
pub fn build_engine(config: &AppConfig) -> Result<Engine, CliError> {
    let db = Database::open(&config.db_path)?;
    let lms = CanvasClient::new(config.lms_api_url.as_str(), config.lms_api_key.as_str())?;
    let mut notifier = TelegramNotifier::new(config.telegram_token.as_str(), config.chat_id.as_str())?;
    if let Some(api_url) = config.telegram_api_url.as_deref() {
        notifier = notifier.with_api_url(api_url);
    }

    Ok(SyncEngine::new(db, lms, notifier, config.sync_settings())?)
}

/// One-line summary of a finished cycle
pub fn summarize_report(report: &CycleReport) -> String {
    format!(
        "{} courses; new: {} assignments, {} announcements, {} files; \
         downloads: {} new, {} updated, {} current, {} failed; \
         messages: {} notices, {} reminders, {} undelivered",
        report.courses,
        report.new_assignments,
        report.new_announcements,
        report.new_lecture_files,
        report.files_downloaded,
        report.files_redownloaded,
        report.files_skipped,
        report.download_failures,
        report.notifications_sent,
        report.reminders_sent,
        report.delivery_failures,
    )
}
