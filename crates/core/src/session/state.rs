//! Cached session state

use std::fmt;

use graphdb_domain::constants::{headers, mime, paths};
use graphdb_domain::{AuthMode, ClientConfig, Credentials, RequestDescriptor};
use serde_json::Value;
use tokio::sync::RwLock;

/// Token sent in the `Authorization` header, plus the login response body
#[derive(Clone, PartialEq)]
pub struct SessionToken {
    value: String,
    claims: Option<Value>,
}

impl SessionToken {
    pub fn new(value: impl Into<String>, claims: Option<Value>) -> Self {
        Self { value: value.into(), claims }
    }

    /// Header value, e.g. `GDB eyJ...` or `Basic YWRt...`
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn claims(&self) -> Option<&Value> {
        self.claims.as_ref()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("claims", &self.claims.is_some())
            .finish()
    }
}

/// Auth mode, credentials and the cached token.
///
/// One session is shared through `Arc` by a repository client and every
/// transaction it begins, so a re-login by any of them is seen by all.
/// The session is never persisted.
pub struct AuthenticationSession {
    mode: AuthMode,
    credentials: Option<Credentials>,
    token: RwLock<Option<SessionToken>>,
}

impl fmt::Debug for AuthenticationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationSession")
            .field("mode", &self.mode)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl AuthenticationSession {
    pub fn new(mode: AuthMode, credentials: Option<Credentials>) -> Self {
        Self { mode, credentials, token: RwLock::new(None) }
    }

    /// Session without credentials; requests go out unauthenticated
    pub fn anonymous() -> Self {
        Self::new(AuthMode::None, None)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.auth_mode, config.login_credentials().cloned())
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// Credentials usable for a login: an auth mode is selected and both
    /// username and password are present
    pub(crate) fn login_credentials(&self) -> Option<&Credentials> {
        if self.mode == AuthMode::None {
            return None;
        }
        self.credentials
            .as_ref()
            .filter(|c| !c.username.is_empty() && !c.password.is_empty())
    }

    /// Whether a login is possible at all
    pub fn can_authenticate(&self) -> bool {
        self.login_credentials().is_some()
    }

    /// True when credentials are configured and no token is cached
    pub async fn requires_authentication(&self) -> bool {
        self.can_authenticate() && self.token.read().await.is_none()
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.as_ref().map(|t| t.value.clone())
    }

    /// Raw login response body of the current session
    pub async fn claims(&self) -> Option<Value> {
        self.token.read().await.as_ref().and_then(|t| t.claims.clone())
    }

    pub async fn store(&self, token: SessionToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    /// Drop the cached token only if it is still `rejected`. A token stored
    /// by a concurrent login in the meantime is kept.
    pub async fn clear_if_current(&self, rejected: Option<&str>) {
        let mut token = self.token.write().await;
        if token.as_ref().map(|t| t.value.as_str()) == rejected {
            *token = None;
        }
    }

    /// Login request for the configured mode, relative to a server root
    pub(crate) fn login_request(&self) -> Option<RequestDescriptor> {
        let credentials = self.login_credentials()?;
        match self.mode {
            AuthMode::None => None,
            AuthMode::Token => Some(
                RequestDescriptor::post(format!("{}/{}", paths::LOGIN, credentials.username))
                    .with_header(headers::GRAPHDB_PASSWORD, credentials.password.clone())
                    .with_header(headers::ACCEPT, mime::JSON),
            ),
            AuthMode::Basic => Some(
                RequestDescriptor::get(format!(
                    "{}/{}",
                    paths::SECURITY_USERS,
                    credentials.username
                ))
                    .with_header(headers::AUTHORIZATION, credentials.basic_header())
                    .with_header(headers::ACCEPT, mime::JSON),
            ),
        }
    }
}
