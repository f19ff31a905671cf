//! Change detection over a mirror table

use std::marker::PhantomData;

use crate::db::{Entity, EntityStore, Stored};
use crate::error::Result;

/// Reports rows inserted into one mirror table since the last poll.
///
/// The cursor starts at the table's latest sequence number when the watcher
/// is created, so rows that were already mirrored are never reported. A
/// cycle that mirrors rows and fails before polling leaves those rows behind
/// the cursor of a restarted process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeWatcher<E> {
    cursor: i64,
    kind: PhantomData<fn() -> E>,
}

impl<E: Entity> ChangeWatcher<E> {
    /// Start watching `store` from its current latest row
    pub fn start(store: &EntityStore<'_, E>) -> Result<Self> {
        let cursor = store.latest_sequence()?.unwrap_or(0);
        tracing::debug!(table = store.table(), cursor, "Started change watcher");
        Ok(Self::from_cursor(cursor))
    }

    /// Resume from an explicit cursor
    pub const fn from_cursor(cursor: i64) -> Self {
        Self {
            cursor,
            kind: PhantomData,
        }
    }

    /// Highest sequence number already reported
    pub const fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Return rows inserted since the previous poll and advance the cursor.
    ///
    /// A read failure is logged and reported as "nothing new"; the cursor is
    /// left untouched so the rows are picked up by a later poll.
    pub fn poll(&mut self, store: &EntityStore<'_, E>) -> Vec<Stored<E>> {
        let rows = match store.since(self.cursor) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(table = store.table(), "Change watcher read failed: {e}");
                return Vec::new();
            }
        };

        if let Some(latest) = rows.iter().map(|row| row.seq).max() {
            self.cursor = latest;
        }
        rows
    }
}
