//! The remote authentication collaborator.

use async_trait::async_trait;

use reportdesk_auth::Identity;

use crate::credential::Credential;
use crate::endpoints;
use crate::envelope::{LoginData, LoginRequest, UserRecord};
use crate::error::{ClientError, ClientResult};
use crate::pipeline::Pipeline;

/// What a successful login hands to the session.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub credential: Credential,
    pub identity: Identity,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginOutcome>;

    async fn logout(&self) -> ClientResult<()>;

    /// The identity behind the current credential.
    async fn whoami(&self) -> ClientResult<Identity>;
}

/// [`AuthApi`] over the request pipeline.
#[derive(Clone)]
pub struct RemoteAuthApi {
    pipeline: Pipeline,
}

impl RemoteAuthApi {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl AuthApi for RemoteAuthApi {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginOutcome> {
        let body = serde_json::to_value(request).map_err(|e| ClientError::decode(e.to_string()))?;
        let data: LoginData = self
            .pipeline
            .call(&endpoints::auth::login(), Some(body))
            .await
            .map_err(|err| match err {
                ClientError::Remote { code, message } => ClientError::AuthFailure { code, message },
                other => other,
            })?;

        if data.token.trim().is_empty() {
            return Err(ClientError::decode("login response carried no token"));
        }

        Ok(LoginOutcome {
            identity: data.identity(),
            credential: Credential::new(data.token),
        })
    }

    async fn logout(&self) -> ClientResult<()> {
        self.pipeline
            .call_value(&endpoints::auth::logout(), None)
            .await
            .map(|_| ())
    }

    async fn whoami(&self) -> ClientResult<Identity> {
        let user: UserRecord = self.pipeline.call(&endpoints::auth::whoami(), None).await?;
        Ok(user.identity())
    }
}
