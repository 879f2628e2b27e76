//! The HTTP seam.
//!
//! A [`Transport`] moves one prepared request and returns whatever came back,
//! including non-success statuses. Interpreting the response is the
//! pipeline's job.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::endpoints::{Method, ResponseKind};

/// A request after credential injection, ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub kind: ResponseKind,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Whatever the server sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use async_trait::async_trait;

    use super::{OutboundRequest, RawResponse, Transport, TransportError};
    use crate::config::ConfigError;
    use crate::endpoints::Method;

    /// `reqwest`-backed transport with a shared connection pool.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, ConfigError> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("reportdesk/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
            Ok(Self { client })
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn map_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut req = self
                .client
                .request(method, &request.url)
                .timeout(request.timeout);
            if !request.query.is_empty() {
                req = req.query(&request.query);
            }
            for (name, value) in &request.headers {
                req = req.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                req = req.json(body);
            }

            let resp = req.send().await.map_err(map_error)?;
            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.bytes().await.map_err(map_error)?.to_vec();

            tracing::debug!(url = %request.url, status, bytes = body.len(), "response received");

            Ok(RawResponse {
                status,
                content_type,
                body,
            })
        }
    }
}
