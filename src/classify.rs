use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Delays within this many seconds of zero count as on time.
///
/// Upstream estimates jitter by tens of seconds between polls; tightening the
/// band makes departures flap between statuses.
pub const ON_TIME_TOLERANCE_SECS: i64 = 60;

/// Punctuality of a departure relative to its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelayStatus {
    OnTime,
    Delayed,
    Early,
}

impl DelayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelayStatus::OnTime => "ON_TIME",
            DelayStatus::Delayed => "DELAYED",
            DelayStatus::Early => "EARLY",
        }
    }
}

impl fmt::Display for DelayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a signed delay into a status.
///
/// | Delay (s)  | Status  |
/// |------------|---------|
/// | > 60       | DELAYED |
/// | < -60      | EARLY   |
/// | -60 ..= 60 | ON_TIME |
pub fn status_for_delay(delay_seconds: i64) -> DelayStatus {
    match delay_seconds {
        d if d > ON_TIME_TOLERANCE_SECS => DelayStatus::Delayed,
        d if d < -ON_TIME_TOLERANCE_SECS => DelayStatus::Early,
        _ => DelayStatus::OnTime,
    }
}

/// Returns the delay in seconds and its status.
///
/// An explicit delay reported by upstream wins over the difference between
/// the estimated and scheduled instants.
pub fn classify(
    scheduled: DateTime<Utc>,
    estimated: DateTime<Utc>,
    explicit_delay: Option<i64>,
) -> (i64, DelayStatus) {
    let delay_seconds = explicit_delay.unwrap_or_else(|| (estimated - scheduled).num_seconds());
    (delay_seconds, status_for_delay(delay_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_status_boundaries() {
        assert_eq!(status_for_delay(61), DelayStatus::Delayed);
        assert_eq!(status_for_delay(60), DelayStatus::OnTime);
        assert_eq!(status_for_delay(0), DelayStatus::OnTime);
        assert_eq!(status_for_delay(-60), DelayStatus::OnTime);
        assert_eq!(status_for_delay(-61), DelayStatus::Early);
    }

    #[test]
    fn test_computed_delay() {
        let scheduled = Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap();
        let estimated = scheduled + TimeDelta::minutes(5);
        assert_eq!(
            classify(scheduled, estimated, None),
            (300, DelayStatus::Delayed)
        );
        assert_eq!(
            classify(estimated, scheduled, None),
            (-300, DelayStatus::Early)
        );
    }

    #[test]
    fn test_explicit_delay_wins() {
        let scheduled = Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap();
        let estimated = scheduled + TimeDelta::minutes(5);
        assert_eq!(
            classify(scheduled, estimated, Some(30)),
            (30, DelayStatus::OnTime)
        );
        assert_eq!(
            classify(scheduled, scheduled, Some(-120)),
            (-120, DelayStatus::Early)
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(DelayStatus::OnTime.to_string(), "ON_TIME");
        assert_eq!(
            serde_json::to_string(&DelayStatus::Delayed).unwrap(),
            "\"DELAYED\""
        );
    }
}
