//! JSON decoder for departures responses.

use crate::error::FetchError;
use crate::raw::DeparturesPayload;

/// Decodes a departures response body.
///
/// Individual records never fail here; only the top level must be an object
/// with a `departures` array.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the body is not JSON or lacks the
/// `departures` array.
pub fn parse_payload(bytes: &[u8]) -> Result<DeparturesPayload, FetchError> {
    serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))
}
