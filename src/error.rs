//! Error types shared by the departure pipeline.

use std::time::Duration;

/// A single upstream time field could not be turned into an instant.
///
/// Always recovered locally: the record owning the field is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty time value")]
    Empty,
    #[error("invalid clock field '{0}'")]
    InvalidField(String),
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("time value '{0}' is out of range")]
    OutOfRange(String),
}

/// A poll cycle could not produce a new board.
///
/// Stored in the coordinator state, so it carries rendered messages rather
/// than the underlying client errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Decode(String),
    /// A refresh was triggered while another one was still in flight.
    #[error("refresh already in flight")]
    Busy,
    /// The coordinator was shut down before the fetch completed.
    #[error("coordinator shut down")]
    Cancelled,
}

impl FetchError {
    /// Whether this error describes a failed fetch that belongs in `last_error`.
    ///
    /// `Busy` and `Cancelled` are control outcomes and never touch state.
    pub fn is_fetch_failure(&self) -> bool {
        !matches!(self, FetchError::Busy | FetchError::Cancelled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Request(err.to_string())
    }
}

/// Invalid monitor configuration, reported before any polling starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("invalid stop id '{0}'")]
    InvalidStopId(String),
    #[error("max_departures must be between {min} and {max}, got {value}")]
    MaxDeparturesOutOfRange { value: usize, min: usize, max: usize },
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),
}
