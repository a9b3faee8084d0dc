//! Mapping of one upstream record onto a canonical [`Departure`].

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::classify::{DelayStatus, classify};
use crate::raw::RawDeparture;
use crate::time::parse_departure_time;

/// Departures whose estimate is further than this in the past have left.
pub const STALE_AFTER_SECS: i64 = 60;

/// A scheduled time further than this from the estimate belongs to the adjacent day.
pub const SCHEDULE_ALIGN_HOURS: i64 = 12;

/// Route label used when upstream does not name the line.
pub const UNKNOWN_LINE: &str = "?";

/// A departure ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Departure {
    pub line: String,
    pub headsign: String,
    pub scheduled: DateTime<Utc>,
    pub estimated: DateTime<Utc>,
    pub minutes_until: i64,
    pub delay_seconds: i64,
    pub status: DelayStatus,
    /// Whether `estimated` is a live prediction rather than the timetable.
    pub realtime: bool,
}

/// Normalizes one upstream record against `now`.
///
/// Returns `None` when the record has no usable departure time or has already
/// departed. The estimate falls back to the scheduled field only when no
/// estimate was sent at all; a present but unparsable estimate drops the record.
pub fn normalize(raw: &RawDeparture, now: DateTime<Utc>, tz: Tz) -> Option<Departure> {
    let Some(estimated_raw) = raw
        .estimated_time
        .as_deref()
        .or(raw.scheduled_time.as_deref())
    else {
        debug!(line = ?raw.line, "Dropping departure without any time");
        return None;
    };

    let estimated = match parse_departure_time(estimated_raw, now, tz) {
        Ok(instant) => instant,
        Err(e) => {
            debug!(line = ?raw.line, value = estimated_raw, error = %e, "Dropping departure with unparsable time");
            return None;
        }
    };

    if estimated < now - TimeDelta::seconds(STALE_AFTER_SECS) {
        debug!(line = ?raw.line, %estimated, "Dropping departed entry");
        return None;
    }

    let scheduled = raw
        .scheduled_time
        .as_deref()
        .and_then(|s| parse_departure_time(s, now, tz).ok())
        .map(|scheduled| align_to(scheduled, estimated))
        .unwrap_or(estimated);

    let (delay_seconds, status) = classify(scheduled, estimated, raw.delay_seconds);
    let minutes_until = (estimated - now).num_seconds().max(0) / 60;

    let realtime = match raw.status.as_deref() {
        Some(tag) => tag.eq_ignore_ascii_case("REALTIME"),
        None => raw.estimated_time.is_some(),
    };

    Some(Departure {
        line: raw
            .line
            .clone()
            .unwrap_or_else(|| UNKNOWN_LINE.to_string()),
        headsign: raw.headsign.clone().unwrap_or_default(),
        scheduled,
        estimated,
        minutes_until,
        delay_seconds,
        status,
        realtime,
    })
}

/// Shifts `scheduled` by a day when it lands on the other side of midnight from
/// `estimated`, so `23:58` scheduled against `00:03` estimated reads as late.
fn align_to(scheduled: DateTime<Utc>, estimated: DateTime<Utc>) -> DateTime<Utc> {
    let window = TimeDelta::hours(SCHEDULE_ALIGN_HOURS);
    let offset = scheduled - estimated;
    if offset > window {
        scheduled - TimeDelta::days(1)
    } else if offset < -window {
        scheduled + TimeDelta::days(1)
    } else {
        scheduled
    }
}
