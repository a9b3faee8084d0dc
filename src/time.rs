//! Parsing of upstream departure times.
//!
//! Feeds report times either as full timestamps or as bare clock-of-day
//! strings relative to the service day. Clock strings may carry hours past 23
//! for trips that run after midnight, and some feeds wrap the clock back to
//! `00:xx` without advancing the date, so clock values far in the past are
//! moved to the next day.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ParseError;

/// Clock-of-day values further than this in the past are taken to mean tomorrow.
pub const ROLLOVER_THRESHOLD_SECS: i64 = 3600;

/// Offset-less timestamp layouts, interpreted in the feed time zone.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Converts an upstream time value into an absolute instant.
///
/// Accepts either a full timestamp (see [`parse_timestamp`]) or a clock-of-day
/// string `H:M` / `H:M:S` anchored to the start of `now`'s calendar day in `tz`.
///
/// # Errors
///
/// Returns a [`ParseError`] for empty input, non-numeric clock fields, minutes
/// or seconds outside `0..60`, or an unparsable timestamp.
pub fn parse_departure_time(
    raw: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<DateTime<Utc>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    if raw.contains('-') || raw.contains('T') {
        parse_timestamp(raw, tz)
    } else {
        parse_clock(raw, now, tz)
    }
}

/// Parses a full timestamp.
///
/// RFC 3339 values carry their own offset. Offset-less values
/// (`2026-03-05T08:05:00`, `2026-03-05 08:05:00`) are read as local time in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| ParseError::InvalidTimestamp(raw.to_string()));
        }
    }

    Err(ParseError::InvalidTimestamp(raw.to_string()))
}

/// Start of `now`'s calendar day in `tz`, as a UTC instant.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let midnight = local.date_naive().and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight skipped by a DST jump: reuse the current offset.
        None => {
            let offset = TimeDelta::seconds(i64::from(local.offset().fix().local_minus_utc()));
            Utc.from_utc_datetime(&(midnight - offset))
        }
    }
}

fn parse_clock(raw: &str, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    let fields: Vec<&str> = raw.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m] => (clock_field(h)?, clock_field(m)?, 0),
        [h, m, s] => (clock_field(h)?, clock_field(m)?, clock_field(s)?),
        _ => return Err(ParseError::InvalidField(raw.to_string())),
    };

    if minutes >= 60 || seconds >= 60 {
        return Err(ParseError::OutOfRange(raw.to_string()));
    }

    let offset = TimeDelta::hours(i64::from(hours))
        + TimeDelta::minutes(i64::from(minutes))
        + TimeDelta::seconds(i64::from(seconds));

    let instant = start_of_day(now, tz)
        .checked_add_signed(offset)
        .ok_or_else(|| ParseError::OutOfRange(raw.to_string()))?;

    if (now - instant).num_seconds() > ROLLOVER_THRESHOLD_SECS {
        return instant
            .checked_add_signed(TimeDelta::hours(24))
            .ok_or_else(|| ParseError::OutOfRange(raw.to_string()));
    }

    Ok(instant)
}

fn clock_field(field: &str) -> Result<u32, ParseError> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidField(field.to_string()));
    }
    field
        .parse()
        .map_err(|_| ParseError::InvalidField(field.to_string()))
}
