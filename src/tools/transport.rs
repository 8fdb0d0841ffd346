//! Outbound HTTP for webhook tools.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// A raw HTTP response, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON POST. Errors mean the request never produced a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        endpoint: &Url,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    async fn post_json(
        &self,
        endpoint: &Url,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        // `.json()` sets Content-Type: application/json
        let response = self
            .client
            .post(endpoint.clone())
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Webhook answered {} ({} bytes)", status, body.len());

        Ok(TransportResponse { status, body })
    }
}
