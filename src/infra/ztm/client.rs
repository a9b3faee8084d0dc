use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_payload;
use crate::raw::DeparturesPayload;
use crate::services::DeparturesApi;

/// Live departures endpoint of ZTM Gdańsk.
pub const DEFAULT_DEPARTURES_URL: &str = "https://ckan2.multimediagdansk.pl/departures";

/// Client for a `GET <endpoint>?stopId=<id>` departures API.
pub struct ZtmClient<C = BasicClient> {
    http: C,
    endpoint: Url,
}

impl<C: HttpClient> ZtmClient<C> {
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if `endpoint` is not a valid URL.
    pub fn new(http: C, endpoint: &str) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| FetchError::Request(format!("invalid endpoint '{endpoint}': {e}")))?;
        Ok(Self { http, endpoint })
    }

    fn departures_url(&self, stop_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("stopId", stop_id);
        url
    }
}

#[async_trait]
impl<C: HttpClient> DeparturesApi for ZtmClient<C> {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_departures(&self, stop_id: &str) -> Result<DeparturesPayload, FetchError> {
        let bytes = fetch_bytes(&self.http, self.departures_url(stop_id)).await?;
        let payload = parse_payload(&bytes)?;
        debug!(records = payload.departures.len(), "Departures payload decoded");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Request, Response};
    use std::sync::Mutex;

    struct Recording {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<Url>>,
    }

    impl Recording {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for Recording {
        async fn execute(&self, req: Request) -> reqwest::Result<Response> {
            self.seen.lock().unwrap().push(req.url().clone());
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(Response::from(resp))
        }
    }

    #[tokio::test]
    async fn test_requests_stop_departures() {
        let http = Recording::new(
            200,
            r#"{"lastUpdate":"2026-03-05T07:06:52Z","departures":[{"routeId":6,"headsign":"Oliwa"}]}"#,
        );
        let client = ZtmClient::new(http, DEFAULT_DEPARTURES_URL).unwrap();

        let payload = client.fetch_departures("1752").await.unwrap();
        assert_eq!(payload.departures.len(), 1);
        assert_eq!(payload.departures[0].headsign.as_deref(), Some("Oliwa"));

        let seen = client.http.seen.lock().unwrap();
        assert_eq!(
            seen[0].as_str(),
            "https://ckan2.multimediagdansk.pl/departures?stopId=1752"
        );
    }

    #[tokio::test]
    async fn test_http_error_is_fetch_error() {
        let client =
            ZtmClient::new(Recording::new(404, "not found"), DEFAULT_DEPARTURES_URL).unwrap();
        let err = client.fetch_departures("0").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let client =
            ZtmClient::new(Recording::new(200, "<html></html>"), DEFAULT_DEPARTURES_URL).unwrap();
        let err = client.fetch_departures("1752").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(ZtmClient::new(BasicClient::new(), "not a url").is_err());
    }
}
