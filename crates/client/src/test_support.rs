//! In-process fakes for the client's seams.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use reportdesk_auth::{Identity, RoleCode};

use crate::auth_api::{AuthApi, LoginOutcome};
use crate::credential::Credential;
use crate::envelope::LoginRequest;
use crate::error::{ClientError, ClientResult};
use crate::interaction::{Interaction, ReauthPrompt};
use crate::transport::{OutboundRequest, RawResponse, Transport, TransportError};

pub fn identity(username: &str, roles: &[&str]) -> Identity {
    Identity::new(
        username,
        None,
        roles.iter().map(|r| RoleCode::from(r.to_string())),
        [],
    )
}

fn unscripted(what: &str) -> ClientError {
    ClientError::Remote {
        code: 500,
        message: format!("{what} not scripted"),
    }
}

/// Replies from a queue and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn reply(&self, response: RawResponse) {
        self.replies.lock().unwrap().push_back(Ok(response));
    }

    pub fn reply_json(&self, status: u16, body: Value) {
        self.reply(RawResponse::json(status, &body));
    }

    pub fn fail(&self, err: TransportError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".into())))
    }
}

/// Answers every confirmation the same way and records what it was shown.
pub struct RecordingInteraction {
    confirm: bool,
    notices: Mutex<Vec<String>>,
    prompts: AtomicUsize,
    reloads: Mutex<Vec<String>>,
}

impl RecordingInteraction {
    pub fn answering(confirm: bool) -> Self {
        Self {
            confirm,
            notices: Mutex::default(),
            prompts: AtomicUsize::new(0),
            reloads: Mutex::default(),
        }
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> Vec<String> {
        self.reloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interaction for RecordingInteraction {
    fn notify_error(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    async fn confirm_reauthentication(&self, _prompt: &ReauthPrompt) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.confirm
    }

    fn reload_to(&self, location: &str) {
        self.reloads.lock().unwrap().push(location.to_string());
    }
}

/// Canned answers for the auth collaborator.
#[derive(Default)]
pub struct FakeAuthApi {
    login: Option<ClientResult<LoginOutcome>>,
    whoami: Option<ClientResult<Identity>>,
    fail_logout: bool,
    logout_calls: AtomicUsize,
    whoami_calls: AtomicUsize,
}

impl FakeAuthApi {
    pub fn accepting(token: &str, who: Identity) -> Self {
        Self {
            login: Some(Ok(LoginOutcome {
                credential: Credential::new(token),
                identity: who.clone(),
            })),
            whoami: Some(Ok(who)),
            ..Self::default()
        }
    }

    pub fn rejecting(err: ClientError) -> Self {
        Self {
            login: Some(Err(err)),
            ..Self::default()
        }
    }

    pub fn with_whoami(mut self, result: ClientResult<Identity>) -> Self {
        self.whoami = Some(result);
        self
    }

    pub fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn whoami_calls(&self) -> usize {
        self.whoami_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _request: &LoginRequest) -> ClientResult<LoginOutcome> {
        self.login.clone().unwrap_or_else(|| Err(unscripted("login")))
    }

    async fn logout(&self) -> ClientResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            Err(unscripted("logout"))
        } else {
            Ok(())
        }
    }

    async fn whoami(&self) -> ClientResult<Identity> {
        self.whoami_calls.fetch_add(1, Ordering::SeqCst);
        self.whoami.clone().unwrap_or_else(|| Err(unscripted("whoami")))
    }
}
