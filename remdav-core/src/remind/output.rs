//! Parsing of `remind -l -s<n>` simple-calendar output.
//!
//! With `-l`, every entry is preceded by a `# fileinfo <line> <file>`
//! header pointing at the source line it was expanded from. The entry
//! itself is six space-separated fields:
//!
//! ```text
//! yyyy/mm/dd <special> <tags> <duration> <time> <body>
//! ```
//!
//! where `duration` and `time` are minute counts or `*`.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::event::RemindEvent;
use crate::uid::generate_uid;

use super::uid_comment;

/// Parse the full output into a UID-keyed snapshot.
///
/// `source_lines` are the lines of the Remind text the output was
/// expanded from; they carry the identity of each entry. Recurring
/// reminders expand to many entries with the same source line and
/// therefore the same UID; the last occurrence wins, as it does for
/// duplicate UIDs from any store.
pub(crate) fn parse(
    output: &str,
    source_lines: &[&str],
    host: &str,
) -> HashMap<String, RemindEvent> {
    let mut events = HashMap::new();
    let mut pending_line: Option<usize> = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("# fileinfo ") {
            pending_line = rest.split_whitespace().next().and_then(|n| n.parse().ok());
            continue;
        }
        let Some(lineno) = pending_line.take() else {
            continue;
        };
        let Some((date, time, duration_minutes, summary)) = parse_entry(line) else {
            debug!(line, "skipping unparsable calendar entry");
            continue;
        };

        let uid = uid_for_line(source_lines, lineno, host);
        events.insert(
            uid.clone(),
            RemindEvent {
                uid,
                date,
                time,
                duration_minutes,
                summary,
            },
        );
    }

    events
}

/// Identity of the entry defined at 1-based `lineno`: the `# UID:`
/// comment directly above it if there is one, else a digest of the line.
fn uid_for_line(source_lines: &[&str], lineno: usize, host: &str) -> String {
    let idx = lineno.saturating_sub(1);
    if idx >= 1 {
        if let Some(tagged) = uid_comment(source_lines[idx - 1]) {
            return tagged.to_string();
        }
    }
    let line = source_lines.get(idx).copied().unwrap_or("");
    generate_uid(line, host)
}

type Entry = (NaiveDate, Option<NaiveTime>, Option<u32>, String);

fn parse_entry(line: &str) -> Option<Entry> {
    let mut parts = line.splitn(6, ' ');
    let date = parts.next()?;
    let special = parts.next()?;
    let _tags = parts.next()?;
    let duration = parts.next()?;
    let minutes = parts.next()?;
    let mut body = parts.next()?.trim().to_string();

    // SPECIAL reminders (SHADE, MOON, ...) are not calendar events.
    if special != "*" {
        return None;
    }

    let date = NaiveDate::parse_from_str(date, "%Y/%m/%d").ok()?;
    let time = match minutes {
        "*" => None,
        m => {
            let m: u32 = m.parse().ok()?;
            NaiveTime::from_hms_opt(m / 60, m % 60, 0)
        }
    };
    let duration_minutes = match duration {
        "*" => None,
        d => Some(d.parse().ok()?),
    };

    // The body repeats the start time (a "14:30" or "14:30-16:00" token
    // with -b1); drop it, the time is already carried structurally.
    if let Some(t) = time {
        let clock = t.format("%H:%M").to_string();
        match body.split_once(' ') {
            Some((first, rest)) if first.starts_with(&clock) => body = rest.to_string(),
            None if body.starts_with(&clock) => body.clear(),
            _ => {}
        }
    }

    if body.is_empty() {
        return None;
    }

    Some((date, time, duration_minutes, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
# UID: pulled-1@remote.example
REM 2026-08-07 AT 14:30 DURATION 1:00 MSG Planning
REM 2026-08-10 MSG Pay rent
REM Mon MSG Weekly review
";

    fn source_lines() -> Vec<&'static str> {
        SOURCE.lines().collect()
    }

    #[test]
    fn test_parse_associates_fileinfo_with_uid_comment() {
        let output = "\
# fileinfo 2 /home/u/.reminders
2026/08/07 * * 60 870 14:30 Planning
# fileinfo 3 /home/u/.reminders
2026/08/10 * * * * Pay rent
";
        let events = parse(output, &source_lines(), "box");

        let planning = &events["pulled-1@remote.example"];
        assert_eq!(planning.summary, "Planning");
        assert_eq!(planning.time, NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(planning.duration_minutes, Some(60));

        let rent_uid = generate_uid("REM 2026-08-10 MSG Pay rent", "box");
        let rent = &events[&rent_uid];
        assert_eq!(rent.summary, "Pay rent");
        assert_eq!(rent.time, None);
        assert_eq!(rent.duration_minutes, None);
    }

    #[test]
    fn test_recurring_entries_collapse_to_one_uid() {
        let output = "\
# fileinfo 4 /home/u/.reminders
2026/08/03 * * * * Weekly review
# fileinfo 4 /home/u/.reminders
2026/08/10 * * * * Weekly review
";
        let events = parse(output, &source_lines(), "box");

        assert_eq!(events.len(), 1);
        let review = &events[&generate_uid("REM Mon MSG Weekly review", "box")];
        // Last occurrence wins.
        assert_eq!(review.date, NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
    }

    #[test]
    fn test_special_entries_are_skipped() {
        let output = "\
# fileinfo 3 /home/u/.reminders
2026/08/10 COLOR * * * 255 0 0 Pay rent
";
        assert!(parse(output, &source_lines(), "box").is_empty());
    }

    #[test]
    fn test_time_range_prefix_is_stripped() {
        let output = "\
# fileinfo 2 /home/u/.reminders
2026/08/07 * * 90 870 14:30-16:00 Planning
";
        let events = parse(output, &source_lines(), "box");
        assert_eq!(events["pulled-1@remote.example"].summary, "Planning");
    }

    #[test]
    fn test_output_without_fileinfo_is_ignored() {
        let output = "2026/08/07 * * * * Orphan entry\n";
        assert!(parse(output, &source_lines(), "box").is_empty());
    }
}
