//! Test enumeration
//!
//! Asks the validator endpoint which test URLs to run for a payload.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use crate::discovery::TestEndpoint;
use crate::http::{HttpClient, HttpError};

/// Query parameters forwarded verbatim to the validator endpoint
pub type Payload = BTreeMap<String, String>;

/// Enumeration errors. Every variant is fatal to a run.
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("Failed to retrieve TestUrls: {0}")]
    Transport(#[from] HttpError),

    #[error("Failed to retrieve TestUrls: {status} for url {url}")]
    Status { status: String, url: String },

    #[error("Failed to parse TestUrls: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetches the ordered list of test URLs from the validator
pub struct TestEnumerator {
    client: HttpClient,
}

impl TestEnumerator {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn enumerate(
        &self,
        endpoint: &TestEndpoint,
        payload: &Payload,
    ) -> Result<Vec<String>, EnumerationError> {
        let response = self
            .client
            .get_with_query(endpoint.as_str(), payload)
            .await?;

        if !response.is_success() {
            return Err(EnumerationError::Status {
                status: response.status_line(),
                url: response.url,
            });
        }

        let test_urls: Vec<String> = serde_json::from_str(&response.body)?;

        info!(
            "TestUrls to be Executed : \n{}",
            serde_json::to_string_pretty(&test_urls)?
        );

        Ok(test_urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::stub::{StubRoute, StubServer};
    use serde_json::json;

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_enumerate_sends_payload_and_keeps_order() {
        let server = StubServer::start(|base| {
            vec![StubRoute::json(
                "/wopitest",
                json!([
                    format!("{base}/run/3"),
                    format!("{base}/run/1"),
                    format!("{base}/run/2"),
                ]),
            )]
        })
        .await;

        let endpoint = TestEndpoint::from_urlsrc(&server.url("/wopitest"));
        let enumerator = TestEnumerator::new(HttpClient::with_timeout(5, false).unwrap());
        let urls = enumerator
            .enumerate(&endpoint, &payload(&[("a", "1"), ("b", "2")]))
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec![
                server.url("/run/3"),
                server.url("/run/1"),
                server.url("/run/2")
            ]
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let (path, query) = requests[0].split_once('?').unwrap();
        assert_eq!(path, "/wopitest");
        let mut params: Vec<&str> = query.split('&').collect();
        params.sort_unstable();
        assert_eq!(params, vec!["a=1", "b=2"]);
    }

    #[tokio::test]
    async fn test_enumerate_encodes_payload_values() {
        let server = StubServer::start(|_| vec![StubRoute::json("/wopitest", json!([]))]).await;

        let endpoint = TestEndpoint::from_urlsrc(&server.url("/wopitest"));
        let enumerator = TestEnumerator::new(HttpClient::with_timeout(5, false).unwrap());
        let urls = enumerator
            .enumerate(
                &endpoint,
                &payload(&[("WopiSrc", "http://host/wopi/files/1 2")]),
            )
            .await
            .unwrap();

        assert!(urls.is_empty());
        assert_eq!(
            server.requests()[0],
            "/wopitest?WopiSrc=http%3A%2F%2Fhost%2Fwopi%2Ffiles%2F1+2"
        );
    }

    #[tokio::test]
    async fn test_enumerate_non_success_status_is_fatal() {
        let server = StubServer::start(|_| vec![StubRoute::status("/wopitest", 401)]).await;

        let endpoint = TestEndpoint::from_urlsrc(&server.url("/wopitest"));
        let enumerator = TestEnumerator::new(HttpClient::with_timeout(5, false).unwrap());
        let err = enumerator
            .enumerate(&endpoint, &Payload::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EnumerationError::Status { .. }));
        assert!(err.to_string().contains("401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_enumerate_invalid_json_is_fatal() {
        let server =
            StubServer::start(|_| vec![StubRoute::text("/wopitest", "not a list")]).await;

        let endpoint = TestEndpoint::from_urlsrc(&server.url("/wopitest"));
        let enumerator = TestEnumerator::new(HttpClient::with_timeout(5, false).unwrap());
        let err = enumerator
            .enumerate(&endpoint, &Payload::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EnumerationError::Parse(_)));
    }
}
