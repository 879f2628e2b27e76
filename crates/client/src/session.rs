//! Session state and its lifecycle.
//!
//! [`SessionState`] is the single owner of the credential and identity. It is
//! a cheap clonable handle shared by the guard and the request pipeline;
//! [`Session`] adds the operations that talk to the server.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use reportdesk_auth::{Identity, PermissionCode, RoleCode};

use crate::auth_api::AuthApi;
use crate::credential::{Credential, CredentialStore};
use crate::envelope::LoginRequest;
use crate::error::ClientResult;

/// `Anonymous -> Authenticating -> Authenticated -> Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionInner {
    phase: SessionPhase,
    credential: Option<Credential>,
    identity: Option<Identity>,
}

/// Shared handle to the current session.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<RwLock<SessionInner>>,
    store: Arc<dyn CredentialStore>,
    ttl: chrono::Duration,
}

impl core::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.read();
        f.debug_struct("SessionState")
            .field("phase", &inner.phase)
            .field("has_credential", &inner.credential.is_some())
            .field("identity", &inner.identity)
            .finish()
    }
}

impl SessionState {
    /// Start from whatever the store holds. A stored credential without an
    /// identity is the transient state the guard heals on first navigation.
    pub fn new(store: Arc<dyn CredentialStore>, ttl: chrono::Duration) -> Self {
        let credential = store.load();
        let phase = if credential.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                phase,
                credential,
                identity: None,
            })),
            store,
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase
    }

    /// A credential is present. Identity may still be missing.
    pub fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.read().credential.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    pub fn has_identity(&self) -> bool {
        self.read().identity.is_some()
    }

    /// Empty until an identity is known.
    pub fn current_roles(&self) -> BTreeSet<RoleCode> {
        self.read()
            .identity
            .as_ref()
            .map(|i| i.roles().clone())
            .unwrap_or_default()
    }

    pub fn current_permissions(&self) -> BTreeSet<PermissionCode> {
        self.read()
            .identity
            .as_ref()
            .map(|i| i.permissions().clone())
            .unwrap_or_default()
    }

    pub fn has_permission(&self, permission: &PermissionCode) -> bool {
        self.read()
            .identity
            .as_ref()
            .is_some_and(|i| i.has_permission(permission))
    }

    pub fn display_name(&self) -> Option<String> {
        self.read()
            .identity
            .as_ref()
            .map(|i| i.display_name().to_string())
    }

    pub fn username(&self) -> Option<String> {
        self.read()
            .identity
            .as_ref()
            .map(|i| i.username().to_string())
    }

    /// Drop credential and identity; back to `Anonymous`. Idempotent.
    pub fn reset(&self) {
        {
            let mut inner = self.write();
            let was = inner.phase;
            *inner = SessionInner::default();
            if was != SessionPhase::Anonymous {
                tracing::info!("session reset");
            }
        }
        self.store.clear();
    }

    /// Enter `Authenticating`, returning the phase to restore on failure.
    pub(crate) fn begin_authenticating(&self) -> SessionPhase {
        let mut inner = self.write();
        std::mem::replace(&mut inner.phase, SessionPhase::Authenticating)
    }

    pub(crate) fn restore_phase(&self, phase: SessionPhase) {
        let mut inner = self.write();
        if inner.phase == SessionPhase::Authenticating {
            inner.phase = phase;
        }
    }

    /// Install a fresh credential and identity together.
    pub(crate) fn establish(&self, credential: Credential, identity: Identity) {
        self.store.save(&credential, self.ttl);
        let mut inner = self.write();
        inner.credential = Some(credential);
        inner.identity = Some(identity);
        inner.phase = SessionPhase::Authenticated;
    }

    /// Replace the identity wholesale. Ignored when the credential has gone
    /// away in the meantime; returns whether it was applied.
    pub(crate) fn replace_identity(&self, identity: Identity) -> bool {
        let mut inner = self.write();
        if inner.credential.is_none() {
            return false;
        }
        inner.identity = Some(identity);
        inner.phase = SessionPhase::Authenticated;
        true
    }
}

/// Session state plus the server calls that drive it.
#[derive(Clone)]
pub struct Session {
    state: SessionState,
    api: Arc<dyn AuthApi>,
}

impl Session {
    pub fn new(state: SessionState, api: Arc<dyn AuthApi>) -> Self {
        Self { state, api }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Authenticate and, on success, install credential and identity in one
    /// step. A rejection leaves the session as it was and is returned as-is.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Identity> {
        let previous = self.state.begin_authenticating();
        let request = LoginRequest::new(username, password);

        match self.api.login(&request).await {
            Ok(outcome) => {
                tracing::info!(username = %outcome.identity.username(), roles = outcome.identity.roles().len(), "logged in");
                self.state.establish(outcome.credential, outcome.identity.clone());
                Ok(outcome.identity)
            }
            Err(err) => {
                self.state.restore_phase(previous);
                tracing::info!(%username, "login failed: {err}");
                Err(err)
            }
        }
    }

    /// Ask the server who the current credential belongs to. Any failure
    /// resets the session before the error is returned.
    pub async fn fetch_identity(&self) -> ClientResult<Identity> {
        match self.api.whoami().await {
            Ok(identity) => {
                if self.state.replace_identity(identity.clone()) {
                    tracing::debug!(username = %identity.username(), "identity refreshed");
                } else {
                    tracing::debug!("identity arrived after session reset; discarded");
                }
                Ok(identity)
            }
            Err(err) => {
                tracing::warn!("identity fetch failed: {err}");
                self.state.reset();
                Err(err)
            }
        }
    }

    /// Best-effort remote logout, then an unconditional reset.
    pub async fn logout(&self) {
        if self.state.is_authenticated() {
            if let Err(err) = self.api.logout().await {
                tracing::warn!("remote logout failed: {err}");
            }
        }
        self.state.reset();
        tracing::info!("logged out");
    }

    pub fn reset(&self) {
        self.state.reset();
    }

    /// Heal a restored credential that has no identity yet.
    pub async fn initialize(&self) -> ClientResult<()> {
        if self.state.is_authenticated() && !self.state.has_identity() {
            self.fetch_identity().await?;
        }
        Ok(())
    }
}
