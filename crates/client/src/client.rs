//! One-stop wiring of session, pipeline and guard.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use reportdesk_auth::{Identity, PermissionCode, RoleCode, RouteCatalog, RouteNode};

use crate::auth_api::{AuthApi, RemoteAuthApi};
use crate::config::{ClientConfig, ConfigError};
use crate::credential::CredentialStore;
use crate::endpoints::Endpoint;
use crate::error::ClientResult;
use crate::guard::{GuardDecision, GuardSettings, NavigationGuard};
use crate::interaction::{HeadlessInteraction, Interaction, ReauthPrompt};
use crate::pipeline::{BinaryPayload, Payload, Pipeline, PipelineSettings};
use crate::session::{Session, SessionState};
use crate::transport::Transport;

pub struct ReportClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    interaction: Option<Arc<dyn Interaction>>,
    auth_api: Option<Arc<dyn AuthApi>>,
    catalog: Option<RouteCatalog>,
    prompt: Option<ReauthPrompt>,
}

impl ReportClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            interaction: None,
            auth_api: None,
            catalog: None,
            prompt: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn interaction(mut self, interaction: Arc<dyn Interaction>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    /// Replace the remote auth collaborator (defaults to the server's
    /// `/auth/*` endpoints through the pipeline).
    pub fn auth_api(mut self, api: Arc<dyn AuthApi>) -> Self {
        self.auth_api = Some(api);
        self
    }

    pub fn catalog(mut self, catalog: RouteCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn reauth_prompt(mut self, prompt: ReauthPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn build(self) -> Result<ReportClient, ConfigError> {
        let config = self.config;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let store = self.store.unwrap_or_else(|| default_store(&config));
        let interaction = self
            .interaction
            .unwrap_or_else(|| Arc::new(HeadlessInteraction));
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => config.route_catalog()?,
        };

        let state = SessionState::new(store, config.credential_ttl());
        let mut settings = PipelineSettings::from_config(&config);
        if let Some(prompt) = self.prompt {
            settings.prompt = prompt;
        }
        let pipeline = Pipeline::new(transport, state.clone(), interaction, settings);
        let api = self
            .auth_api
            .unwrap_or_else(|| Arc::new(RemoteAuthApi::new(pipeline.clone())));
        let session = Session::new(state, api);
        let guard = NavigationGuard::new(
            session.clone(),
            Arc::new(catalog),
            GuardSettings::from_config(&config),
        );

        tracing::debug!(endpoint_root = %config.endpoint_root(), "report client ready");

        Ok(ReportClient {
            config: Arc::new(config),
            session,
            pipeline,
            guard,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_transport() -> Result<Arc<dyn Transport>, ConfigError> {
    Ok(Arc::new(crate::transport::ReqwestTransport::new()?))
}

#[cfg(target_arch = "wasm32")]
fn default_transport() -> Result<Arc<dyn Transport>, ConfigError> {
    Err(ConfigError::HttpClient(
        "no default transport on wasm32; supply one with ReportClientBuilder::transport".to_string(),
    ))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_store(config: &ClientConfig) -> Arc<dyn CredentialStore> {
    match crate::credential::FileCredentialStore::from_config(config) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::warn!("{err}; credential will not survive restarts");
            Arc::new(crate::credential::MemoryCredentialStore::new())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_store(config: &ClientConfig) -> Arc<dyn CredentialStore> {
    Arc::new(crate::credential::BrowserCredentialStore::new(
        config.credential_key.clone(),
    ))
}

/// The session & authorization pipeline behind a single handle.
#[derive(Clone)]
pub struct ReportClient {
    config: Arc<ClientConfig>,
    session: Session,
    pipeline: Pipeline,
    guard: NavigationGuard,
}

impl ReportClient {
    pub fn builder(config: ClientConfig) -> ReportClientBuilder {
        ReportClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity()
    }

    pub fn current_roles(&self) -> BTreeSet<RoleCode> {
        self.state().current_roles()
    }

    pub fn current_permissions(&self) -> BTreeSet<PermissionCode> {
        self.state().current_permissions()
    }

    pub fn has_permission(&self, permission: &PermissionCode) -> bool {
        self.state().has_permission(permission)
    }

    pub fn display_name(&self) -> Option<String> {
        self.state().display_name()
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Identity> {
        self.session.login(username, password).await
    }

    pub async fn logout(&self) {
        self.session.logout().await
    }

    pub async fn initialize(&self) -> ClientResult<()> {
        self.session.initialize().await
    }

    pub async fn navigate(&self, to: &str, from: Option<&str>) -> GuardDecision {
        self.guard.evaluate(to, from).await
    }

    /// Sidebar for the current roles.
    pub fn visible_menu(&self) -> Vec<RouteNode> {
        self.guard.catalog().visible_menu(&self.current_roles())
    }

    pub async fn send(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<Payload> {
        self.pipeline.send(endpoint, payload).await
    }

    pub async fn call<T: DeserializeOwned>(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<T> {
        self.pipeline.call(endpoint, payload).await
    }

    pub async fn call_value(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<Value> {
        self.pipeline.call_value(endpoint, payload).await
    }

    pub async fn fetch_binary(&self, endpoint: &Endpoint, payload: Option<Value>) -> ClientResult<BinaryPayload> {
        self.pipeline.fetch_binary(endpoint, payload).await
    }
}
