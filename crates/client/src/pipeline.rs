//! The request pipeline: credential injection, envelope normalization and
//! the session-expiry protocol.
//!
//! Every failure is reported to the user once through [`Interaction`] and
//! then returned. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::classify::{classify_response, classify_status, classify_transport_error};
use crate::config::{AuthScheme, ClientConfig};
use crate::endpoints::{Endpoint, Method, ResponseKind};
use crate::error::{ClientError, ClientResult};
use crate::interaction::{Interaction, ReauthPrompt};
use crate::session::SessionState;
use crate::transport::{OutboundRequest, RawResponse, Transport, TransportError};

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Origin plus API base path, no trailing slash.
    pub endpoint_root: String,
    pub timeout: Duration,
    pub auth_scheme: AuthScheme,
    /// Where a confirmed re-authentication reloads to.
    pub login_path: String,
    pub prompt: ReauthPrompt,
}

impl PipelineSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            endpoint_root: config.endpoint_root(),
            timeout: config.timeout(),
            auth_scheme: config.auth_scheme,
            login_path: config.login_path.clone(),
            prompt: ReauthPrompt::default(),
        }
    }
}

/// A file body, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A successful call's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `data` of a `200` envelope.
    Data(Value),
    Binary(BinaryPayload),
}

#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    session: SessionState,
    interaction: Arc<dyn Interaction>,
    settings: Arc<PipelineSettings>,
}

impl Pipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionState,
        interaction: Arc<dyn Interaction>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            transport,
            session,
            interaction,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Build the wire request. `GET` payload objects become query pairs;
    /// every other method sends the payload as a JSON body.
    pub fn prepare(&self, endpoint: &Endpoint, payload: Option<Value>) -> OutboundRequest {
        let mut headers = Vec::new();
        if let Some(credential) = self.session.credential() {
            headers.push((
                AUTHORIZATION.to_string(),
                self.settings.auth_scheme.header_value(credential.as_str()),
            ));
        }

        let (query, body) = match (endpoint.method, payload) {
            (Method::Get, Some(payload)) => (query_pairs(&payload), None),
            (_, payload) => (Vec::new(), payload),
        };

        OutboundRequest {
            method: endpoint.method,
            url: format!("{}{}", self.settings.endpoint_root, endpoint.path),
            query,
            headers,
            body,
            timeout: self.settings.timeout,
            kind: endpoint.kind,
        }
    }

    /// Send one call and normalize the outcome.
    pub async fn send(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<Payload> {
        let request = self.prepare(endpoint, payload);
        tracing::debug!(%endpoint, authorized = request.header(AUTHORIZATION).is_some(), "sending request");

        let outcome = classify_outcome(endpoint.kind, self.transport.send(request).await);
        match outcome {
            Ok(payload) => Ok(payload),
            Err(err) => {
                tracing::debug!(%endpoint, "request failed: {err}");
                self.interaction.notify_error(&err.user_message());
                if err.is_session_expired() {
                    self.reauthenticate().await;
                }
                Err(err)
            }
        }
    }

    /// Send and deserialize `data`.
    pub async fn call<T: DeserializeOwned>(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<T> {
        let data = self.call_value(endpoint, payload).await?;
        serde_json::from_value(data).map_err(|e| ClientError::decode(format!("{endpoint}: {e}")))
    }

    pub async fn call_value(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<Value> {
        match self.send(endpoint, payload).await? {
            Payload::Data(data) => Ok(data),
            Payload::Binary(_) => Err(ClientError::decode(format!("{endpoint} returned a file, not data"))),
        }
    }

    pub async fn fetch_binary(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<BinaryPayload> {
        match self.send(endpoint, payload).await? {
            Payload::Binary(file) => Ok(file),
            Payload::Data(_) => Err(ClientError::decode(format!("{endpoint} returned data, not a file"))),
        }
    }

    /// Ask first; only a confirmed prompt touches the session.
    async fn reauthenticate(&self) {
        if self
            .interaction
            .confirm_reauthentication(&self.settings.prompt)
            .await
        {
            tracing::info!("session expired; returning to login");
            self.session.reset();
            self.interaction.reload_to(&self.settings.login_path);
        } else {
            tracing::debug!("re-authentication declined");
        }
    }
}

fn classify_outcome(kind: ResponseKind, result: Result<RawResponse, TransportError>) -> ClientResult<Payload> {
    let response = result.map_err(|e| ClientError::from(classify_transport_error(&e)))?;
    match kind {
        ResponseKind::Binary if response.is_success() => Ok(Payload::Binary(BinaryPayload {
            content_type: response.content_type,
            bytes: response.body,
        })),
        ResponseKind::Binary => Err(classify_status(response.status, &response.body).into()),
        ResponseKind::Envelope => classify_response(&response).map(Payload::Data),
    }
}

/// Flatten a JSON object into query pairs. Nulls are skipped; strings go
/// as-is, other scalars and nested values in their JSON form.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = payload else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
