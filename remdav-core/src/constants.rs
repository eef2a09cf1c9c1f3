//! Shared defaults.

/// Timezone assumed for the Remind file when none is given.
pub const DEFAULT_ZONE: &str = "Europe/Berlin";

/// Number of months the Remind file is expanded over.
pub const DEFAULT_MONTHS: u32 = 15;

/// How far back the expansion window starts relative to today.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 84;

/// Default Remind file, relative to the home directory.
pub const DEFAULT_REMIND_FILE: &str = ".reminders";

/// Comment line that records an explicit UID for the following REM line.
pub const UID_COMMENT_PREFIX: &str = "# UID:";
