//! HTTP JSON-RPC transport backed by `reqwest`.
//!
//! No retry: a failed poll is repeated on the collector's next tick.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// HTTP JSON-RPC transport for one endpoint.
///
/// `reqwest::Client` pools connections internally and is safe to share, so
/// one `HttpTransport` serves every task polling the same URL.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
            timeout,
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        tracing::trace!(url = %self.url, method = %req.method, id = %req.id, "sending request");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
