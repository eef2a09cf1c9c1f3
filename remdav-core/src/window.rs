//! Expansion window for the Remind source.

use chrono::{Duration, NaiveDate, Utc};

use crate::constants::{DEFAULT_LOOKBACK_DAYS, DEFAULT_MONTHS};

/// The date window a Remind file is expanded over.
///
/// Both the current file and the optional reference ("old") file must use
/// the same window, otherwise the three-way diff compares snapshots of
/// different scopes.
#[derive(Debug, Clone, Copy)]
pub struct SyncWindow {
    pub start: NaiveDate,
    pub months: u32,
}

impl Default for SyncWindow {
    /// Default window: from [`DEFAULT_LOOKBACK_DAYS`] ago, spanning
    /// [`DEFAULT_MONTHS`] months.
    fn default() -> Self {
        SyncWindow {
            start: Utc::now().date_naive() - Duration::days(DEFAULT_LOOKBACK_DAYS),
            months: DEFAULT_MONTHS,
        }
    }
}

impl SyncWindow {
    pub fn new(start: Option<NaiveDate>, months: Option<u32>) -> Self {
        let default = SyncWindow::default();
        SyncWindow {
            start: start.unwrap_or(default.start),
            months: months.unwrap_or(default.months),
        }
    }
}
