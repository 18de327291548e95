//! Temporal normalization: turns date, datetime and duration inputs into a
//! canonical `(start, stop, all_day)` window.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A date or datetime read from a source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// Which end of a window a value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    Stop,
}

/// Canonical event window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub all_day: bool,
}

/// Convert a raw value into an instant. Date-only values become midnight for a
/// start and the last microsecond of the day for a stop; the flag reports
/// whether the value was date-only.
pub fn to_instant(raw: Option<Temporal>, bound: Bound) -> (Option<NaiveDateTime>, bool) {
    match raw {
        None => (None, false),
        Some(Temporal::DateTime(dt)) => (Some(dt), false),
        Some(Temporal::Date(d)) => {
            let instant = match bound {
                Bound::Start => Some(d.and_time(NaiveTime::MIN)),
                Bound::Stop => d.and_hms_micro_opt(23, 59, 59, 999_999),
            };
            (instant, instant.is_some())
        }
    }
}

/// Resolve the event window of a record.
///
/// Returns `None` when no start resolves (the record produces no event).
/// Without a stop, a positive duration in hours gives `stop = start + duration`;
/// otherwise the event is instantaneous (`stop == start`).
pub fn resolve_window(
    start: Option<Temporal>,
    stop: Option<Temporal>,
    duration_hours: Option<f64>,
) -> Option<Window> {
    let (start, start_all_day) = to_instant(start, Bound::Start);
    let start = start?;

    let (stop, stop_all_day) = match to_instant(stop, Bound::Stop) {
        (Some(stop), all_day) => (stop, all_day),
        (None, _) => match duration_hours
            .and_then(hours)
            .and_then(|d| start.checked_add_signed(d))
        {
            Some(stop) => (stop, false),
            None => (start, start_all_day),
        },
    };

    Some(Window {
        start,
        stop,
        all_day: start_all_day || stop_all_day,
    })
}

/// A positive, finite number of hours as a duration.
pub fn hours(value: f64) -> Option<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let micros = (value * 3_600_000_000.0).round();
    if micros >= i64::MAX as f64 {
        return None;
    }

    Some(Duration::microseconds(micros as i64))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse `YYYY-MM-DD HH:MM[:SS[.ffffff]]` (space or `T` separated).
pub fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse text as a datetime, falling back to a plain date.
pub fn parse_temporal_text(s: &str) -> Option<Temporal> {
    parse_datetime_text(s)
        .map(Temporal::DateTime)
        .or_else(|| parse_date_text(s).map(Temporal::Date))
}
