use std::path::Path;

use lmsbot_core::db::{Database, Entity, EntityStore, LedgerEntry, NotificationLedger};
use lmsbot_core::models::{Announcement, Assignment, Course, LectureFile};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub db_path: String,
    pub tables: Vec<TableStatus>,
    pub reminders: Vec<LedgerEntry>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: &'static str,
    pub rows: usize,
    pub latest_seq: Option<i64>,
}

pub fn run_status(db_path: &Path, as_json: bool) -> Result<(), CliError> {
    let db = Database::open(db_path)?;
    let report = collect_status(&db, db_path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_status_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn collect_status(db: &Database, db_path: &Path) -> Result<StatusReport, CliError> {
    Ok(StatusReport {
        db_path: db_path.display().to_string(),
        tables: vec![
            table_status::<Course>(db)?,
            table_status::<Assignment>(db)?,
            table_status::<Announcement>(db)?,
            table_status::<LectureFile>(db)?,
        ],
        reminders: NotificationLedger::new(db).entries()?,
    })
}

fn table_status<E: Entity>(db: &Database) -> Result<TableStatus, CliError> {
    let store = EntityStore::<E>::new(db);
    Ok(TableStatus {
        table: store.table(),
        rows: store.count()?,
        latest_seq: store.latest_sequence()?,
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![format!("Database: {}", report.db_path)];
    for table in &report.tables {
        let latest = table
            .latest_seq
            .map_or_else(|| "-".to_string(), |seq| seq.to_string());
        lines.push(format!(
            "{:<14} {:>6} rows  latest seq {latest}",
            table.table, table.rows
        ));
    }

    if report.reminders.is_empty() {
        lines.push("No reminders sent yet.".to_string());
    } else {
        lines.push(format!("Reminders sent: {}", report.reminders.len()));
        for entry in &report.reminders {
            lines.push(format!(
                "  {}  assignment {}  {}",
                entry.sent_at, entry.assignment_id, entry.threshold
            ));
        }
    }
    lines
}
