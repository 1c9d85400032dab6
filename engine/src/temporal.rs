//! Parsing for the specialized string types: a simplified ISO 8601 subset
//! for dates, datetimes, times and time zones, plus canonical UUIDs.
//!
//! Shapes are matched with regular expressions; calendar validity and
//! instant arithmetic come from `chrono`. Datetimes without an offset are
//! read as UTC.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use regex::{Captures, Regex};
use syncguard_schema::ValueType;

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]\d{6}|\d{4})-(\d{2})-(\d{2})$").expect("date regex is valid")
});

static DATETIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([+-]\d{6}|\d{4})(?:-(\d{2})(?:-(\d{2}))?)?(?:T(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,3}))?)?(Z|[+-]\d{2}:\d{2})?)?$",
    )
    .expect("datetime regex is valid")
});

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,3}))?)?$").expect("time regex is valid")
});

static TIMEZONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Z|([+-])(\d{2}):(\d{2}))$").expect("timezone regex is valid")
});

static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$")
        .expect("uuid regex is valid")
});

fn field<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn year(caps: &Captures<'_>) -> Option<i32> {
    let text = caps.get(1)?.as_str();
    text.strip_prefix('+').unwrap_or(text).parse().ok()
}

/// Milliseconds from a one-to-three digit fraction (`5` is 500 ms).
fn millis(fraction: Option<&str>) -> u32 {
    fraction.map_or(0, |digits| {
        let value: u32 = digits.parse().unwrap_or(0);
        match digits.len() {
            1 => value * 100,
            2 => value * 10,
            _ => value,
        }
    })
}

fn time_of_day(caps: &Captures<'_>, first: usize) -> Option<NaiveTime> {
    let hour = field(caps, first)?;
    let minute = field(caps, first + 1)?;
    let second = field(caps, first + 2).unwrap_or(0);
    let fraction = caps.get(first + 3).map(|m| m.as_str());
    NaiveTime::from_hms_milli_opt(hour, minute, second, millis(fraction))
}

fn offset(text: &str) -> Option<FixedOffset> {
    let caps = TIMEZONE_REGEX.captures(text)?;
    if caps.get(1).is_none() {
        return FixedOffset::east_opt(0);
    }
    let sign = if &caps[1] == "-" { -1 } else { 1 };
    let hours: i32 = field(&caps, 2)?;
    let minutes: i32 = field(&caps, 3)?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a calendar date such as `2024-02-29` or `+012024-01-01`.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_REGEX.captures(text)?;
    NaiveDate::from_ymd_opt(year(&caps)?, field(&caps, 2)?, field(&caps, 3)?)
}

/// Parses a date with optional time and offset, such as `2024`,
/// `2024-03-01T10:15`, or `2024-03-01T10:15:30.250+02:00`.
#[must_use]
pub fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let caps = DATETIME_REGEX.captures(text)?;
    let month = if caps.get(2).is_some() { field(&caps, 2)? } else { 1 };
    let day = if caps.get(3).is_some() { field(&caps, 3)? } else { 1 };
    let date = NaiveDate::from_ymd_opt(year(&caps)?, month, day)?;
    let time = if caps.get(4).is_some() {
        time_of_day(&caps, 4)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    let zone = match caps.get(8) {
        Some(zone) => offset(zone.as_str())?,
        None => FixedOffset::east_opt(0)?,
    };
    zone.from_local_datetime(&date.and_time(time)).single()
}

/// Parses a time of day such as `23:59`, `08:00:05` or `08:00:05.1`.
#[must_use]
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_REGEX.captures(text)?;
    time_of_day(&caps, 1)
}

/// Parses a UTC offset: `Z` or `±HH:MM`.
#[must_use]
pub fn parse_timezone(text: &str) -> Option<FixedOffset> {
    offset(text)
}

/// Returns true for an 8-4-4-4-12 hexadecimal UUID, in either case.
#[must_use]
pub fn is_uuid(text: &str) -> bool {
    UUID_REGEX.is_match(text)
}

/// Orders two strings by their parsed value under a temporal type.
///
/// Returns `None` when the type is not temporal or either side fails to
/// parse.
#[must_use]
pub fn compare(kind: ValueType, left: &str, right: &str) -> Option<Ordering> {
    match kind {
        ValueType::Date => Some(parse_date(left)?.cmp(&parse_date(right)?)),
        ValueType::Datetime => Some(parse_datetime(left)?.cmp(&parse_datetime(right)?)),
        ValueType::Time => Some(parse_time(left)?.cmp(&parse_time(right)?)),
        ValueType::Timezone => Some(
            parse_timezone(left)?
                .local_minus_utc()
                .cmp(&parse_timezone(right)?.local_minus_utc()),
        ),
        _ => None,
    }
}
