//! HTTP client for the lineage server's execution-events listing.
//!
//! Thin wrapper around `GET {api_url}/execution-events`. Response parsing
//! lives in [`parse_page`] so it can be tested without a server.

use std::time::Duration;

use tracing::debug;

use crate::events::{sample_page, ExecutionEventsPage, FetchParams};

const EVENTS_PATH: &str = "execution-events";
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct ExecutionEventsClient {
    http: reqwest::Client,
    api_url: String,
}

impl ExecutionEventsClient {
    /// Create a client for the server at `api_url`.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Full URL of the listing endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/{EVENTS_PATH}", self.api_url.trim_end_matches('/'))
    }

    /// Fetch one page of at most `size` rows.
    pub async fn fetch(
        &self,
        params: &FetchParams,
        size: u64,
    ) -> Result<ExecutionEventsPage, ApiError> {
        let size = size.to_string();
        let query = [
            ("timestampStart", params.timestamp_start.as_str()),
            ("timestampEnd", params.timestamp_end.as_str()),
            ("asAtTime", params.as_at_time.as_str()),
            ("offset", params.offset.as_str()),
            ("size", size.as_str()),
        ];
        let url = self.endpoint();
        debug!(%url, offset = %params.offset, "requesting execution events");

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, body: text });
        }

        parse_page(&text)
    }
}

// =============================================================================
// SOURCE
// =============================================================================

/// Where execution events come from.
#[derive(Debug, Clone)]
pub enum EventSource {
    Remote(ExecutionEventsClient),
    /// Built-in sample rows, for offline use.
    Sample,
}

impl EventSource {
    pub async fn fetch(
        &self,
        params: &FetchParams,
        size: u64,
    ) -> Result<ExecutionEventsPage, ApiError> {
        match self {
            Self::Remote(client) => client.fetch(params, size).await,
            Self::Sample => Ok(sample_page(params.offset_value(), size)),
        }
    }

    /// Short description for status lines.
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(client) => client.api_url().to_string(),
            Self::Sample => "sample data".to_string(),
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode a listing response body.
pub fn parse_page(json: &str) -> Result<ExecutionEventsPage, ApiError> {
    serde_json::from_str(json).map_err(|e| ApiError::Decode(e.to_string()))
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),
}
