//! Client configuration
//!
//! Configuration is plain data: named fields with defaults, plus consuming
//! `with_*` helpers that return an updated copy. Specialised configs embed a
//! [`ClientConfig`] instead of extending it.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::constants::{
    mime, DEFAULT_READ_TIMEOUT, DEFAULT_RETRY_COUNT, DEFAULT_WRITE_TIMEOUT, SERVICE_UNAVAILABLE,
};
use crate::errors::{GraphDbError, Result};
use crate::types::{Endpoint, EndpointSet, Headers};

/// How the client authenticates, fixed when the config is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Requests are sent without credentials
    #[default]
    None,
    /// HTTP Basic credentials, verified once against the security endpoint
    Basic,
    /// Credential exchange for a server-issued token
    Token,
}

impl AuthMode {
    /// Parse a mode name (`none`, `basic`, `token`/`gdb`), case-insensitive.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` for unknown names.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "token" | "gdb" => Ok(Self::Token),
            other => Err(GraphDbError::Config(format!("unknown auth mode '{other}'"))),
        }
    }
}

/// Username and password. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    /// `Basic base64(username:password)`
    pub fn basic_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", self.username, self.password)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every client flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Headers added to every request unless the request sets them itself
    pub headers: Headers,
    /// Per-attempt timeout for read requests
    pub read_timeout: Duration,
    /// Per-attempt timeout for write requests
    pub write_timeout: Duration,
    /// Retries per endpoint; attempts per endpoint are `retry_count + 1`
    pub retry_count: u32,
    /// Delay before the first retry on an endpoint, doubled per further retry
    pub retry_backoff: Duration,
    /// Statuses treated like "service busy"
    pub retriable_statuses: BTreeSet<u16>,
    pub auth_mode: AuthMode,
    pub credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            headers: Headers::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff: Duration::ZERO,
            retriable_statuses: BTreeSet::from([SERVICE_UNAVAILABLE]),
            auth_mode: AuthMode::None,
            credentials: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.auth_mode = AuthMode::Basic;
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    #[must_use]
    pub fn with_token_auth(mut self, username: &str, password: &str) -> Self {
        self.auth_mode = AuthMode::Token;
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Credentials that will actually be used for login, if any
    pub fn login_credentials(&self) -> Option<&Credentials> {
        match self.auth_mode {
            AuthMode::None => None,
            AuthMode::Basic | AuthMode::Token => self.credentials.as_ref(),
        }
    }

    /// # Errors
    /// Returns `GraphDbError::Config` when an auth mode is selected without
    /// both a username and a password, or when timeouts are zero.
    pub fn validate(&self) -> Result<()> {
        if self.auth_mode != AuthMode::None {
            match &self.credentials {
                Some(credentials) if !credentials.username.trim().is_empty() => {
                    if credentials.password.is_empty() {
                        return Err(GraphDbError::Config(format!(
                            "{:?} authentication requires a password",
                            self.auth_mode
                        )));
                    }
                }
                _ => {
                    return Err(GraphDbError::Config(format!(
                        "{:?} authentication requires a username",
                        self.auth_mode
                    )))
                }
            }
        }
        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(GraphDbError::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Configuration of a client bound to one logical repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryClientConfig {
    pub client: ClientConfig,
    /// Equivalent repository URLs, in failover order
    pub endpoints: Vec<String>,
    /// Serialization used for statement writes and reads
    pub default_rdf_mime_type: String,
    /// Result format requested for queries without an explicit type
    pub default_query_mime_type: String,
}

impl Default for RepositoryClientConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            endpoints: Vec::new(),
            default_rdf_mime_type: mime::N_QUADS.to_string(),
            default_query_mime_type: mime::SPARQL_RESULTS_JSON.to_string(),
        }
    }
}

impl RepositoryClientConfig {
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { endpoints: endpoints.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    #[must_use]
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    /// Validate and build the endpoint set.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` for an empty or malformed endpoint list
    /// or an invalid base config.
    pub fn endpoint_set(&self) -> Result<EndpointSet> {
        self.client.validate()?;
        EndpointSet::parse(&self.endpoints)
    }
}

/// Configuration of a client bound to one server (repository management)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerClientConfig {
    pub client: ClientConfig,
    pub server_url: String,
}

impl ServerClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self { client: ClientConfig::default(), server_url: server_url.into() }
    }

    #[must_use]
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// # Errors
    /// Returns `GraphDbError::Config` for a malformed URL or invalid base
    /// config.
    pub fn endpoint(&self) -> Result<Endpoint> {
        self.client.validate()?;
        Endpoint::parse(&self.server_url)
    }
}
