//! Upstream departure records.
//!
//! Feed revisions name the same fields differently, send route ids as numbers
//! or strings, and leave estimates empty when no vehicle is tracked. Every
//! record goes through one tolerant mapping driven by [`RawField::aliases`],
//! so a malformed field only ever blanks that field.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A canonical field of an upstream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawField {
    Line,
    Headsign,
    ScheduledTime,
    EstimatedTime,
    DelaySeconds,
    Status,
}

impl RawField {
    /// Upstream keys for this field, in order of preference.
    ///
    /// | Field          | Keys                                                                      |
    /// |----------------|---------------------------------------------------------------------------|
    /// | line           | `routeShortName`, `routeId`, `line`, `routeName`                          |
    /// | headsign       | `headsign`, `tripHeadsign`, `direction`, `destination`                    |
    /// | scheduled time | `theoreticalTime`, `scheduledTime`, `plannedTime`, `scheduledDepartureTime` |
    /// | estimated time | `estimatedTime`, `expectedTime`, `realTime`, `estimatedDepartureTime`     |
    /// | delay seconds  | `delayInSeconds`, `delay`                                                 |
    /// | status tag     | `status`                                                                  |
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            RawField::Line => &["routeShortName", "routeId", "line", "routeName"],
            RawField::Headsign => &["headsign", "tripHeadsign", "direction", "destination"],
            RawField::ScheduledTime => &[
                "theoreticalTime",
                "scheduledTime",
                "plannedTime",
                "scheduledDepartureTime",
            ],
            RawField::EstimatedTime => &[
                "estimatedTime",
                "expectedTime",
                "realTime",
                "estimatedDepartureTime",
            ],
            RawField::DelaySeconds => &["delayInSeconds", "delay"],
            RawField::Status => &["status"],
        }
    }
}

/// One departure exactly as far as upstream can be trusted: every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct RawDeparture {
    pub line: Option<String>,
    pub headsign: Option<String>,
    pub scheduled_time: Option<String>,
    pub estimated_time: Option<String>,
    pub delay_seconds: Option<i64>,
    pub status: Option<String>,
}

impl RawDeparture {
    /// Maps a JSON object onto the canonical fields.
    ///
    /// For each field the first alias holding a usable value wins; empty strings
    /// and `null` count as absent.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        RawDeparture {
            line: first(record, RawField::Line, text),
            headsign: first(record, RawField::Headsign, text),
            scheduled_time: first(record, RawField::ScheduledTime, text),
            estimated_time: first(record, RawField::EstimatedTime, text),
            delay_seconds: first(record, RawField::DelaySeconds, seconds),
            status: first(record, RawField::Status, text),
        }
    }
}

impl From<Value> for RawDeparture {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(record) => RawDeparture::from_record(&record),
            _ => RawDeparture::default(),
        }
    }
}

/// Top-level body of the departures endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeparturesPayload {
    #[serde(default)]
    last_update: Option<Value>,
    pub departures: Vec<RawDeparture>,
}

impl DeparturesPayload {
    pub fn new(departures: Vec<RawDeparture>) -> Self {
        Self {
            last_update: None,
            departures,
        }
    }

    /// The feed's own last-update stamp, if it sent a usable one.
    pub fn last_update(&self) -> Option<String> {
        self.last_update.as_ref().and_then(text)
    }
}

fn first<T>(
    record: &Map<String, Value>,
    field: RawField,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    field
        .aliases()
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(convert)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}
