//! Parsing of downloaded event bodies, using the icalendar crate's parser.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{read_calendar, unfold},
};

use crate::event::RemindEvent;

/// Parse the first VEVENT of an iCalendar document into a [`RemindEvent`],
/// with times normalized to `zone` (the zone the Remind file is kept in).
///
/// Returns `None` for documents we cannot represent as a Remind line; the
/// caller skips those rather than failing the run.
pub fn parse_event(content: &str, zone: Tz) -> Option<RemindEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    let start = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok());

    let (date, time) = to_local(&start, zone);
    let duration_minutes = match (time, end) {
        (Some(start_time), Some(end)) => {
            let (end_date, end_time) = to_local(&end, zone);
            end_time.map(|end_time| {
                let start_dt = date.and_time(start_time);
                let end_dt = end_date.and_time(end_time);
                (end_dt - start_dt).num_minutes().max(0) as u32
            })
        }
        _ => None,
    };

    Some(RemindEvent {
        uid,
        date,
        time,
        duration_minutes,
        summary,
    })
}

/// Project an iCalendar date or datetime onto the Remind file's zone.
///
/// Floating and zone-local times are taken at face value; UTC and
/// foreign-zone times are converted.
fn to_local(dpt: &DatePerhapsTime, zone: Tz) -> (chrono::NaiveDate, Option<chrono::NaiveTime>) {
    match dpt {
        DatePerhapsTime::Date(d) => (*d, None),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => {
                let local = dt.with_timezone(&zone);
                (local.date_naive(), Some(local.time()))
            }
            CalendarDateTime::Floating(naive) => (naive.date(), Some(naive.time())),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                match tzid.parse::<Tz>() {
                    Ok(source_zone) => zoned_to_local(*date_time, source_zone, zone),
                    // Unknown TZID, keep the wall clock as written.
                    Err(_) => (date_time.date(), Some(date_time.time())),
                }
            }
        },
    }
}

fn zoned_to_local(
    naive: NaiveDateTime,
    source: Tz,
    target: Tz,
) -> (chrono::NaiveDate, Option<chrono::NaiveTime>) {
    match naive.and_local_timezone(source).earliest() {
        Some(dt) => {
            let local = dt.with_timezone(&target);
            (local.date_naive(), Some(local.time()))
        }
        // Nonexistent wall-clock time (DST gap), keep it as written.
        None => (naive.date(), Some(naive.time())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_parse_timed_utc_event_converts_to_zone() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:meet-1@example.org\r\n\
SUMMARY:Standup\r\n\
DTSTART:20260807T120000Z\r\n\
DTEND:20260807T123000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let event = parse_event(ics, chrono_tz::Europe::Berlin).expect("should parse");

        assert_eq!(event.uid, "meet-1@example.org");
        assert_eq!(event.summary, "Standup");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        // 12:00 UTC is 14:00 in Berlin during DST.
        assert_eq!(event.time, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(event.duration_minutes, Some(30));
    }

    #[test]
    fn test_parse_all_day_event() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:day-1@example.org\r\n\
SUMMARY:Offsite\r\n\
DTSTART;VALUE=DATE:20261224\r\n\
DTEND;VALUE=DATE:20261225\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let event = parse_event(ics, chrono_tz::Europe::Berlin).expect("should parse");

        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 12, 24).unwrap());
        assert_eq!(event.time, None);
        assert_eq!(event.duration_minutes, None);
    }

    #[test]
    fn test_parse_without_vevent_is_none() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";
        assert!(parse_event(ics, chrono_tz::UTC).is_none());
    }

    #[test]
    fn test_generate_parse_roundtrip() {
        use crate::ics::generate_ics;

        let event = RemindEvent {
            uid: "rt-1@box".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            time: NaiveTime::from_hms_opt(9, 15, 0),
            duration_minutes: Some(45),
            summary: "Review".to_string(),
        };

        let ics = generate_ics(&event, chrono_tz::Europe::Berlin).unwrap();
        let parsed = parse_event(&ics, chrono_tz::Europe::Berlin).expect("should parse");

        assert_eq!(parsed, event);
    }
}
