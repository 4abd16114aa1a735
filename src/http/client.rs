//! HTTP client for talking to the WOPI Validator service
//!
//! Wraps `reqwest` with the timeout and TLS settings used by every stage
//! of a validator run.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("TLS error for {url}: {reason} (use --insecure to accept invalid certificates)")]
    Tls { url: String, reason: String },

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// HTTP client used by the discovery, enumeration and execution stages
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create client with custom timeout
    pub fn with_timeout(timeout_secs: u64, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Issue a GET request
    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(url, self.client.get(url)).await
    }

    /// Issue a GET request with the given pairs encoded as query parameters
    pub async fn get_with_query<Q>(&self, url: &str, query: &Q) -> Result<HttpResponse, HttpError>
    where
        Q: Serialize + ?Sized,
    {
        self.send(url, self.client.get(url).query(query)).await
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, HttpError> {
        debug!("Sending GET request to {}", url);

        let start = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))?;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            start.elapsed().as_millis()
        );

        Ok(HttpResponse {
            url: final_url,
            status_code: status.as_u16(),
            body,
        })
    }

    /// Map a transport error, keeping its underlying cause
    fn classify(&self, url: &str, err: &reqwest::Error) -> HttpError {
        if err.is_timeout() {
            return HttpError::Timeout(self.timeout_secs);
        }

        let reason = error_chain(err);
        if err.is_connect() {
            if reason.to_lowercase().contains("certificate") {
                HttpError::Tls {
                    url: url.to_string(),
                    reason,
                }
            } else {
                HttpError::Connect {
                    url: url.to_string(),
                    reason,
                }
            }
        } else {
            HttpError::RequestFailed(reason)
        }
    }
}

/// Flatten an error and its sources into one line
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !reason.contains(&text) {
            reason.push_str(": ");
            reason.push_str(&text);
        }
        source = cause.source();
    }
    reason
}

/// HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// URL that was actually requested, query string included
    pub url: String,
    pub status_code: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Status line used in error messages, e.g. `404 Not Found`
    pub fn status_line(&self) -> String {
        match reqwest::StatusCode::from_u16(self.status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            Some(reason) => format!("{} {}", self.status_code, reason),
            None => self.status_code.to_string(),
        }
    }
}
