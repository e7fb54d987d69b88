//! Session-aware request execution

use std::sync::Arc;

use graphdb_domain::constants::headers;
use graphdb_domain::{AuthMode, EndpointSet, GraphDbError, RequestDescriptor, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::state::{AuthenticationSession, SessionToken};
use crate::http::{HttpResponse, RetryPolicy, RetryingExecutor, TransportFactory};

/// Wraps a [`RetryingExecutor`] with login, token attachment and a single
/// re-login on 401.
pub struct SessionAwareExecutor {
    requests: RetryingExecutor,
    login: RetryingExecutor,
    session: Arc<AuthenticationSession>,
}

impl SessionAwareExecutor {
    pub fn new(
        requests: RetryingExecutor,
        login: RetryingExecutor,
        session: Arc<AuthenticationSession>,
    ) -> Self {
        Self { requests, login, session }
    }

    /// Bind request transports to `endpoints` and login transports to their
    /// server roots.
    ///
    /// # Errors
    /// Propagates binding failures from the factory.
    pub fn bind(
        endpoints: &EndpointSet,
        factory: &dyn TransportFactory,
        policy: RetryPolicy,
        session: Arc<AuthenticationSession>,
    ) -> Result<Self> {
        let requests = RetryingExecutor::new(endpoints, factory, policy.clone())?;
        let login = RetryingExecutor::new(&endpoints.server_roots(), factory, policy)?;
        Ok(Self::new(requests, login, session))
    }

    pub fn session(&self) -> &Arc<AuthenticationSession> {
        &self.session
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.requests.policy()
    }

    /// Execute a request with the session token attached.
    ///
    /// Logs in first when credentials are configured and no token is cached.
    /// If the request fails with 401 the rejected token is cleared, one fresh
    /// login is made and the request is replayed exactly once with the token
    /// that login returned; whatever the replay returns is final.
    ///
    /// # Errors
    /// Login failures (`Auth` or executor errors) and request failures.
    pub async fn execute<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        if self.session.requires_authentication().await {
            self.authenticate().await?;
        }

        let token = self.session.token().await;
        match self.send_with_token(&build, token.as_deref()).await {
            Err(error) if error.is_unauthorized() && self.session.can_authenticate() => {
                warn!(error = %error, "session token rejected, logging in again");
                self.session.clear_if_current(token.as_deref()).await;
                let fresh = self.obtain_token().await?;
                self.send_with_token(&build, fresh.as_deref()).await
            }
            result => result,
        }
    }

    /// Log in unconditionally and cache the resulting token.
    ///
    /// Does nothing when no auth mode or credentials are configured.
    ///
    /// # Errors
    /// `Auth` when the server rejects the credentials or a token login
    /// response lacks the `Authorization` header; otherwise the executor
    /// error of the login request.
    pub async fn authenticate(&self) -> Result<()> {
        self.obtain_token().await.map(|_| ())
    }

    /// Log in and return the token that was stored, `None` when no login is
    /// configured.
    async fn obtain_token(&self) -> Result<Option<String>> {
        let (Some(credentials), Some(request)) =
            (self.session.login_credentials(), self.session.login_request())
        else {
            return Ok(None);
        };
        let username = credentials.username.as_str();
        let mode = self.session.mode();
        debug!(username, ?mode, "logging in");

        let response = self
            .login
            .execute(|| request.clone())
            .await
            .map_err(|error| match error {
                GraphDbError::Unauthorized { .. } => {
                    GraphDbError::Auth(format!("credentials for '{username}' were rejected"))
                }
                other => other,
            })?;

        let token = match mode {
            AuthMode::Token => response
                .header(headers::AUTHORIZATION)
                .map(str::to_string)
                .ok_or_else(|| {
                    GraphDbError::Auth("login response carried no authorization header".into())
                })?,
            AuthMode::Basic => credentials.basic_header(),
            AuthMode::None => return Ok(None),
        };
        let claims = response.json::<Value>().await.ok();

        self.session.store(SessionToken::new(token.clone(), claims)).await;
        info!(username, ?mode, "logged in");
        Ok(Some(token))
    }

    /// Forget the cached token. No request is sent.
    pub async fn logout(&self) {
        self.session.clear().await;
        debug!("session token cleared");
    }

    async fn send_with_token<F>(&self, build: &F, token: Option<&str>) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        self.requests
            .execute(|| match token {
                Some(token) => build().with_header(headers::AUTHORIZATION, token),
                None => build(),
            })
            .await
    }
}
