//! ISO-8601 date / date-time strings to epoch seconds.
//!
//! Two shapes are accepted: `YYYY-MM-DDTHH:MM` and a bare `YYYY-MM-DD`,
//! the latter mapped to local noon so daily summaries land mid-day. A
//! missing minute defaults to zero.
//! Anything else yields [`Timestamp::ZERO`]; callers treat that as unknown.

use chrono::{Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::model::Timestamp;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize `text` in the process's local time zone.
pub fn normalize(text: &str) -> Timestamp {
    normalize_in(text, &Local)
}

/// Normalize `text` as a wall-clock time in `tz`.
pub fn normalize_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Timestamp {
    match parse_local(text.trim()) {
        Some(naive) => resolve(naive, tz),
        None => Timestamp::ZERO,
    }
}

fn parse_local(text: &str) -> Option<NaiveDateTime> {
    if let Ok((dt, _rest)) = NaiveDateTime::parse_and_remainder(text, DATE_TIME_FORMAT) {
        return Some(dt);
    }

    let (date, rest) = NaiveDate::parse_and_remainder(text, DATE_FORMAT).ok()?;
    let time = match bare_hour(rest) {
        Some(hour) => NaiveTime::from_hms_opt(hour, 0, 0)?,
        None => NaiveTime::from_hms_opt(12, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// The hour of a `THH` suffix with no minutes.
fn bare_hour(rest: &str) -> Option<u32> {
    let digits = rest.strip_prefix('T')?;
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Leaves DST state to the zone: a repeated hour takes the earlier
/// instant, a skipped hour is pushed forward past the gap.
fn resolve<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Timestamp {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    };

    resolved.map_or(Timestamp::ZERO, |dt| Timestamp(dt.timestamp()))
}
