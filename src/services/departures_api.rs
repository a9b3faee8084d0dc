//! Trait for the upstream source of departures.

use crate::error::FetchError;
use crate::raw::DeparturesPayload;

/// Abstraction over a departures backend (e.g., the ZTM Gdańsk endpoint).
#[async_trait::async_trait]
pub trait DeparturesApi: Send + Sync {
    /// Returns the current raw departures for `stop_id`.
    async fn fetch_departures(&self, stop_id: &str) -> Result<DeparturesPayload, FetchError>;
}
