//! Due-date reminder eligibility
//!
//! [`evaluate`] decides whether an assignment is inside one of the fixed
//! reminder windows. Dates are compared as calendar days in a fixed reference
//! zone, so an assignment due at 23:59 and one due at 00:01 on the same local
//! date are both "due today".

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Days-until-due values that trigger a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Threshold {
    /// Due on the current calendar day
    DueToday,
    /// Due on the next calendar day
    DueTomorrow,
    /// Due three calendar days from now
    DueInThreeDays,
}

impl Threshold {
    /// Every threshold, furthest first
    pub const ALL: [Self; 3] = [Self::DueInThreeDays, Self::DueTomorrow, Self::DueToday];

    /// Map a calendar-day difference onto the threshold set
    pub const fn from_days(days: i64) -> Option<Self> {
        match days {
            0 => Some(Self::DueToday),
            1 => Some(Self::DueTomorrow),
            3 => Some(Self::DueInThreeDays),
            _ => None,
        }
    }

    /// Calendar days until due
    pub const fn days(self) -> i64 {
        match self {
            Self::DueToday => 0,
            Self::DueTomorrow => 1,
            Self::DueInThreeDays => 3,
        }
    }

    /// Short label used in reminder messages
    pub const fn label(self) -> &'static str {
        match self {
            Self::DueToday => "D-day",
            Self::DueTomorrow => "D-1",
            Self::DueInThreeDays => "D-3",
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decide which reminder, if any, is owed for an assignment at `now`.
///
/// No reminder is returned when the work is already submitted, when either
/// end of the window is unknown, before the assignment unlocks, or once the
/// due instant has passed. Otherwise the calendar-day distance between today
/// and the due date (both taken in `zone`) must be a member of the
/// [`Threshold`] set.
pub fn evaluate(
    now: DateTime<Utc>,
    unlock_at: Option<DateTime<Utc>>,
    due_at: Option<DateTime<Utc>>,
    has_submission: bool,
    zone: FixedOffset,
) -> Option<Threshold> {
    if has_submission {
        return None;
    }
    let (unlock_at, due_at) = (unlock_at?, due_at?);
    if now < unlock_at || now > due_at {
        return None;
    }

    let today = now.with_timezone(&zone).date_naive();
    let due_date = due_at.with_timezone(&zone).date_naive();
    Threshold::from_days((due_date - today).num_days())
}
