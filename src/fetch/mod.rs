mod client;
mod basic;

pub use client::HttpClient;
pub use basic::BasicClient;

use bytes::Bytes;
use reqwest::Url;
use tracing::debug;

use crate::error::FetchError;

/// Longest prefix of an error body kept in [`FetchError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// GETs `url` and returns the body of a successful response.
///
/// # Errors
///
/// Returns [`FetchError::Request`] for transport failures and
/// [`FetchError::Status`] for any non-2xx response.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: Url) -> Result<Bytes, FetchError> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), %status, "Response received");
    Ok(bytes)
}
