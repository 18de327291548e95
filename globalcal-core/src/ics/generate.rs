//! ICS file generation.

use chrono::{Duration, NaiveDateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::event::StoredEvent;

/// Generate one VCALENDAR holding a VEVENT per projected event.
pub fn generate_ics(events: &[StoredEvent]) -> String {
    let mut cal = Calendar::new();
    cal.name("globalcal");

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for stored in events {
        let event = &stored.event;

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event.origin.uid());
        ics_event.summary(&event.title);
        ics_event.add_property("DTSTAMP", &dtstamp);

        if event.all_day {
            add_date_property(&mut ics_event, "DTSTART", event.start);
            // DTEND of an all-day event is exclusive
            let end = event
                .stop
                .checked_add_signed(Duration::days(1))
                .unwrap_or(event.stop);
            add_date_property(&mut ics_event, "DTEND", end);
        } else {
            // Floating datetimes: the store keeps naive local times
            ics_event.add_property("DTSTART", event.start.format("%Y%m%dT%H%M%S").to_string());
            ics_event.add_property("DTEND", event.stop.format("%Y%m%dT%H%M%S").to_string());
        }

        ics_event.add_property("COLOR", event.background.as_str());
        ics_event.add_property("X-GLOBALCAL-COLOR", event.background.as_str());
        ics_event.add_property("X-GLOBALCAL-ORIGIN", event.origin.to_string());

        if event.visible_to_everyone {
            ics_event.add_property("CLASS", "PUBLIC");
        }

        let ics_event = ics_event.done();
        cal.push(ics_event);
    }

    let cal = cal.done();

    strip_ics_bloat(&cal.to_string())
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with GLOBALCAL
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:GLOBALCAL\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_date_property(ics_event: &mut icalendar::Event, name: &str, time: NaiveDateTime) {
    let mut prop = Property::new(name, time.date().format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    ics_event.append_property(prop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::event::{OriginKey, ProjectedEvent};
    use crate::temporal::{Bound, Temporal, parse_datetime_text, to_instant};
    use chrono::NaiveDate;

    fn stored(id: u64, all_day: bool) -> StoredEvent {
        let (start, stop) = if all_day {
            let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
            (
                to_instant(Some(Temporal::Date(day)), Bound::Start).0.unwrap(),
                to_instant(Some(Temporal::Date(day)), Bound::Stop).0.unwrap(),
            )
        } else {
            (
                parse_datetime_text("2025-03-20 15:00:00").unwrap(),
                parse_datetime_text("2025-03-20 16:30:00").unwrap(),
            )
        };

        StoredEvent {
            id,
            event: ProjectedEvent {
                title: format!("Event {id}"),
                start,
                stop,
                all_day,
                owner_ids: vec![],
                visible_to_everyone: false,
                origin: OriginKey::new("crm.lead", id as i64, 2),
                background: HexColor::parse("#00AA00").unwrap(),
                text_color: HexColor::black(),
                legacy_color_index: 0,
            },
        }
    }

    #[test]
    fn test_generate_ics_all_day_event_has_value_date() {
        let ics = generate_ics(&[stored(1, true)]);

        assert!(
            ics.contains("DTSTART;VALUE=DATE:20250320"),
            "DTSTART should have VALUE=DATE parameter. ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTEND;VALUE=DATE:20250321"),
            "DTEND should be the exclusive next day. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_timed_event_is_floating() {
        let ics = generate_ics(&[stored(4, false)]);

        assert!(ics.contains("DTSTART:20250320T150000\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND:20250320T163000\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("UID:crm.lead-4-2@globalcal"));
        assert!(ics.contains("SUMMARY:Event 4"));
        assert!(ics.contains("COLOR:#00AA00"));
        assert!(ics.contains("X-GLOBALCAL-COLOR:#00AA00"));
    }

    #[test]
    fn test_generate_ics_all_day_event_on_last_date() {
        let mut last = stored(1, true);
        last.event.start = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        last.event.stop = NaiveDate::MAX.and_hms_micro_opt(23, 59, 59, 999_999).unwrap();

        let ics = generate_ics(&[last]);

        let end = NaiveDate::MAX.format("%Y%m%d").to_string();
        assert!(ics.contains(&format!("DTEND;VALUE=DATE:{end}")), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_one_vevent_per_event() {
        let ics = generate_ics(&[stored(1, true), stored(2, false), stored(3, false)]);

        assert_eq!(ics.lines().filter(|l| *l == "BEGIN:VEVENT").count(), 3);
        assert!(ics.contains("PRODID:GLOBALCAL\r\n"));
        assert!(!ics.contains("CALSCALE:GREGORIAN"));
    }
}
