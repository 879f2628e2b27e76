//! `reportdesk-client`
//!
//! **Responsibility:** the session & authorization pipeline of the reporting
//! client.
//!
//! This crate provides:
//! - Credential storage with a client-side expiry horizon
//! - Session state (credential + identity) and its login/logout lifecycle
//! - The navigation guard deciding every route transition
//! - The request pipeline: credential injection, envelope normalization and
//!   the session-expiry protocol
//!
//! Route policy itself lives in `reportdesk-auth`; this crate only consults it.

pub mod auth_api;
pub mod classify;
pub mod client;
pub mod config;
pub mod credential;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod interaction;
pub mod pipeline;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use auth_api::{AuthApi, LoginOutcome, RemoteAuthApi};
pub use client::{ReportClient, ReportClientBuilder};
pub use config::{AuthScheme, ClientConfig, ConfigError};
pub use credential::{Credential, CredentialStore, CredentialStoreError, MemoryCredentialStore};
pub use endpoints::{Endpoint, Method, ResponseKind};
pub use envelope::{LoginRequest, ResponseEnvelope};
pub use error::{ClientError, ClientResult, TransportCause, TransportFailure};
pub use guard::{GuardDecision, GuardSettings, NavigationGuard, Redirect, RedirectReason};
pub use interaction::{HeadlessInteraction, Interaction, ReauthPrompt};
pub use pipeline::{BinaryPayload, Payload, Pipeline, PipelineSettings};
pub use session::{Session, SessionPhase, SessionState};
pub use transport::{OutboundRequest, RawResponse, Transport, TransportError};

#[cfg(not(target_arch = "wasm32"))]
pub use credential::FileCredentialStore;
#[cfg(not(target_arch = "wasm32"))]
pub use transport::ReqwestTransport;

#[cfg(target_arch = "wasm32")]
pub use credential::BrowserCredentialStore;
