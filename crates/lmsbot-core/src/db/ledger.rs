//! Notification ledger: at most one reminder per (assignment, threshold)

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::deadline::Threshold;
use crate::error::Result;

const LEDGER_TABLE: &str = "notification_ledger";

/// A reminder that has already been delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub assignment_id: i64,
    pub threshold: Threshold,
    /// RFC 3339 timestamp of the successful hand-off to the notifier
    pub sent_at: String,
}

/// Append-only record of delivered due-date reminders.
///
/// Callers check [`NotificationLedger::was_notified`] before sending and call
/// [`NotificationLedger::record`] only once the notifier accepted the message,
/// so a failed delivery is retried on the next cycle.
#[derive(Debug, Clone, Copy)]
pub struct NotificationLedger<'a> {
    db: &'a Database,
}

impl<'a> NotificationLedger<'a> {
    /// Create a ledger backed by the given database
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn ensure_table(&self) -> Result<()> {
        self.db.connection().execute_batch(
            "CREATE TABLE IF NOT EXISTS notification_ledger (
                assignment_id INTEGER NOT NULL,
                threshold INTEGER NOT NULL,
                sent_at TEXT NOT NULL,
                PRIMARY KEY (assignment_id, threshold)
            )",
        )?;
        Ok(())
    }

    /// Whether a reminder for this pair has already been delivered
    pub fn was_notified(&self, assignment_id: i64, threshold: Threshold) -> Result<bool> {
        if !self.db.table_exists(LEDGER_TABLE)? {
            return Ok(false);
        }

        let exists: i32 = self.db.connection().query_row(
            "SELECT EXISTS(
                SELECT 1 FROM notification_ledger WHERE assignment_id = ?1 AND threshold = ?2
            )",
            params![assignment_id, threshold.days()],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Record a delivered reminder.
    ///
    /// Recording the same pair again is a no-op. Returns `true` when a new
    /// entry was written.
    pub fn record(
        &self,
        assignment_id: i64,
        threshold: Threshold,
        sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.ensure_table()?;

        let inserted = self.db.connection().execute(
            "INSERT OR IGNORE INTO notification_ledger (assignment_id, threshold, sent_at)
             VALUES (?1, ?2, ?3)",
            params![
                assignment_id,
                threshold.days(),
                sent_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ],
        )?;
        Ok(inserted > 0)
    }

    /// All ledger entries, oldest first
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.db.table_exists(LEDGER_TABLE)? {
            return Ok(Vec::new());
        }

        let mut stmt = self.db.connection().prepare(
            "SELECT assignment_id, threshold, sent_at
             FROM notification_ledger
             ORDER BY sent_at ASC, assignment_id ASC, threshold DESC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                let days: i64 = row.get(1)?;
                let threshold = Threshold::from_days(days)
                    .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, days))?;
                Ok(LedgerEntry {
                    assignment_id: row.get(0)?,
                    threshold,
                    sent_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
