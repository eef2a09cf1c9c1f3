//! Single-event iCalendar document generation.

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use crate::error::{RemDavError, RemDavResult};
use crate::event::RemindEvent;

/// Serialize one event into a standalone VCALENDAR document, the wire
/// format for uploads.
///
/// Timed events are written with a `TZID` parameter in the Remind file's
/// zone; all-day events use `VALUE=DATE` with the RFC 5545 exclusive end.
pub fn generate_ics(event: &RemindEvent, zone: Tz) -> RemDavResult<String> {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.summary(&event.summary);

    // DTSTAMP is required by RFC 5545.
    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    ics_event.add_property("DTSTAMP", dtstamp);

    match event.time {
        Some(time) => {
            let start = event.date.and_time(time);
            add_zoned_property(&mut ics_event, "DTSTART", &start, zone);

            let minutes = i64::from(event.duration_minutes.unwrap_or(0));
            if minutes > 0 {
                let end = start + Duration::minutes(minutes);
                add_zoned_property(&mut ics_event, "DTEND", &end, zone);
            }
        }
        None => {
            add_date_property(&mut ics_event, "DTSTART", event.date);
            // Exclusive end date for a one-day event.
            let end = event
                .date
                .succ_opt()
                .ok_or_else(|| RemDavError::IcsGenerate(format!("date overflow for {}", event.uid)))?;
            add_date_property(&mut ics_event, "DTEND", end);
        }
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    Ok(cal.to_string())
}

fn add_zoned_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    datetime: &chrono::NaiveDateTime,
    zone: Tz,
) {
    let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", zone.name());
    ics_event.append_property(prop);
}

fn add_date_property(ics_event: &mut icalendar::Event, name: &str, date: chrono::NaiveDate) {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.add_parameter("VALUE", "DATE");
    ics_event.append_property(prop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_generate_timed_event_carries_tzid() {
        let event = RemindEvent {
            uid: "abc123@box".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0),
            duration_minutes: Some(90),
            summary: "Team planning".to_string(),
        };

        let ics = generate_ics(&event, chrono_tz::Europe::Berlin).unwrap();

        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("UID:abc123@box"));
        assert!(ics.contains("DTSTART;TZID=Europe/Berlin:20260807T143000"));
        assert!(ics.contains("DTEND;TZID=Europe/Berlin:20260807T160000"));
        assert!(ics.contains("SUMMARY:Team planning"));
    }

    #[test]
    fn test_generate_all_day_event_uses_date_values() {
        let event = RemindEvent::all_day(
            "day@box",
            NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
            "Christmas Eve",
        );

        let ics = generate_ics(&event, chrono_tz::UTC).unwrap();

        assert!(ics.contains("DTSTART;VALUE=DATE:20261224"));
        // End is exclusive.
        assert!(ics.contains("DTEND;VALUE=DATE:20261225"));
    }
}
