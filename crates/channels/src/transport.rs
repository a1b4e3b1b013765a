//! HTTP transport seam for the push channels.
//!
//! Dispatch semantics (validation, chunking, outcome zipping) are tested
//! against the [`PushTransport`] trait; [`HttpTransport`] is the
//! reqwest-backed production implementation with a bounded per-chunk
//! timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Default timeout for a single chunk call. A timed-out chunk is a
/// transport failure for every address in it.
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for chunk-level transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push endpoint returned a non-2xx status code.
    #[error("Push endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body did not have the documented per-token shape.
    #[error("Malformed channel response: {0}")]
    BadResponse(String),
}

/// One POST of a JSON chunk payload, returning the parsed JSON response.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn post_chunk(&self, body: &Value) -> Result<Value, TransportError>;
}

/// reqwest-backed transport for one push endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    authorization: Option<String>,
}

impl HttpTransport {
    /// Build a transport with a bounded per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            authorization: None,
        })
    }

    /// Attach an `Authorization` header value (e.g. the FCM server key).
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

#[async_trait]
impl PushTransport for HttpTransport {
    async fn post_chunk(&self, body: &Value) -> Result<Value, TransportError> {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(auth) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
