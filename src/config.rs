use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::coordinator::PollSettings;
use crate::error::ConfigError;
use crate::infra::ztm::DEFAULT_DEPARTURES_URL;

pub const MIN_DEPARTURES: usize = 1;
pub const MAX_DEPARTURES: usize = 15;

/// Settings for monitoring a single stop.
///
/// Stored as a JSON object on disk; everything except `stop_id` is optional:
/// ```json
/// {
///   "stop_id": "1752",
///   "stop_name": "Brama Oliwska",
///   "max_departures": 6
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default = "default_max_departures")]
    pub max_departures: usize,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// IANA zone the feed's clock times refer to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_max_departures() -> usize {
    6
}

fn default_endpoint() -> String {
    DEFAULT_DEPARTURES_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_timezone() -> String {
    "Europe/Warsaw".to_string()
}

impl MonitorConfig {
    /// A configuration for `stop_id` with every other setting at its default.
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            stop_name: None,
            max_departures: default_max_departures(),
            endpoint: default_endpoint(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            timezone: default_timezone(),
        }
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Checks every setting and returns the coordinator's view of them.
    pub fn poll_settings(&self) -> Result<PollSettings, ConfigError> {
        let stop_id = self.stop_id.trim();
        if stop_id.is_empty() || stop_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::InvalidStopId(self.stop_id.clone()));
        }

        if !(MIN_DEPARTURES..=MAX_DEPARTURES).contains(&self.max_departures) {
            return Err(ConfigError::MaxDeparturesOutOfRange {
                value: self.max_departures,
                min: MIN_DEPARTURES,
                max: MAX_DEPARTURES,
            });
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("poll_interval_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_secs"));
        }

        Ok(PollSettings {
            stop_id: stop_id.to_string(),
            max_departures: self.max_departures,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            timezone: self.timezone()?,
        })
    }
}
