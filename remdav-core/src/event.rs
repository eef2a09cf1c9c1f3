//! The local calendar event model.

use chrono::{NaiveDate, NaiveTime};

/// A single occurrence expanded from the Remind source, or an event about
/// to be written into it.
///
/// This is deliberately minimal: the sync engine only ever looks at `uid`,
/// and the Remind format itself carries no richer metadata than a date, an
/// optional time and duration, and a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemindEvent {
    pub uid: String,
    pub date: NaiveDate,
    /// None for all-day reminders.
    pub time: Option<NaiveTime>,
    /// Only meaningful for timed reminders.
    pub duration_minutes: Option<u32>,
    pub summary: String,
}

impl RemindEvent {
    pub fn all_day(uid: impl Into<String>, date: NaiveDate, summary: impl Into<String>) -> Self {
        RemindEvent {
            uid: uid.into(),
            date,
            time: None,
            duration_minutes: None,
            summary: summary.into(),
        }
    }
}
