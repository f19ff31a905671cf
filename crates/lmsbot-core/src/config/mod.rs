//! Runtime settings consumed by the sync engine and the run loop.
//!
//! These are plain values resolved once at startup; the binary builds them
//! from the environment and passes them down.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

use crate::error::Error;

/// Default reference zone for calendar-day arithmetic (+09:00).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Settings for one sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Root directory lecture files are downloaded into
    pub download_root: PathBuf,
    /// Zone used for due-date windows and message timestamps
    pub reference_zone: FixedOffset,
}

impl SyncSettings {
    pub fn new(download_root: impl Into<PathBuf>) -> Self {
        Self {
            download_root: download_root.into(),
            reference_zone: default_zone(),
        }
    }

    #[must_use]
    pub const fn with_reference_zone(mut self, zone: FixedOffset) -> Self {
        self.reference_zone = zone;
        self
    }
}

fn default_zone() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse a `±HH:MM` UTC offset.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, Error> {
    let raw = raw.trim();
    let invalid = || Error::InvalidInput(format!("UTC offset must look like +09:00, got '{raw}'"));

    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// A daily block of hours during which no cycle runs.
///
/// `start` is inclusive and `end` exclusive; a window with `start > end`
/// wraps past midnight (e.g. `22-6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: u32,
    end: u32,
}

impl QuietHours {
    pub fn new(start: u32, end: u32) -> Result<Self, Error> {
        if start > 23 || end > 23 {
            return Err(Error::InvalidInput(format!(
                "quiet hours must be within 0-23, got {start}-{end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether `hour` (0-23) falls inside the window
    pub const fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }

    /// Whether `now`, seen in `zone`, is inside the window
    pub fn is_quiet_at(&self, now: DateTime<Utc>, zone: FixedOffset) -> bool {
        self.contains(now.with_timezone(&zone).hour())
    }
}

impl FromStr for QuietHours {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("quiet hours must look like 2-6, got '{raw}'"));
        let (start, end) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        Self::new(start, end)
    }
}

impl fmt::Display for QuietHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}
