//! Client for repository management on one server

use std::sync::Arc;

use graphdb_domain::constants::{headers, mime, paths};
use graphdb_domain::{
    Endpoint, EndpointSet, GraphDbError, RequestDescriptor, Result, ServerClientConfig,
};
use tracing::{info, info_span, Instrument, Span};

use crate::content::sparql;
use crate::context::ClientContext;
use crate::http::{HttpResponse, TransportFactory};
use crate::session::{AuthenticationSession, SessionAwareExecutor};

/// Server-level operations. Requests are relative to the server URL and use
/// the same retry and session handling as repository clients.
pub struct ServerClient {
    endpoint: Endpoint,
    executor: SessionAwareExecutor,
    context: ClientContext,
}

impl ServerClient {
    /// # Errors
    /// `Config` for a malformed server URL, invalid auth settings, or a
    /// transport that cannot be built.
    pub fn new(config: &ServerClientConfig, factory: Arc<dyn TransportFactory>) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let span = info_span!("server", endpoint = %endpoint);
        let context = ClientContext::new(&config.client, factory, span);
        let session = Arc::new(AuthenticationSession::from_config(&config.client));
        let executor = SessionAwareExecutor::bind(
            &EndpointSet::single(endpoint.clone()),
            context.factory.as_ref(),
            context.policy.clone(),
            session,
        )?;
        Ok(Self { endpoint, executor, context })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.context.span = span;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Identifiers of all repositories on the server.
    ///
    /// # Errors
    /// Request failures, or `Parse` for a malformed result document.
    pub async fn get_repository_ids(&self) -> Result<Vec<String>> {
        let response = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::get(paths::REPOSITORIES)
                        .with_header(headers::ACCEPT, mime::SPARQL_RESULTS_JSON),
                )
            })
            .await?;
        let rows = sparql::parse_bindings(&response.bytes().await?)?;
        Ok(sparql::column(&rows, "id").iter().map(|term| term.value().to_string()).collect())
    }

    /// # Errors
    /// `InvalidInput` for a blank id; errors of
    /// [`ServerClient::get_repository_ids`].
    pub async fn has_repository(&self, id: &str) -> Result<bool> {
        let id = require_id(id)?;
        Ok(self.get_repository_ids().await?.iter().any(|existing| existing == id))
    }

    /// Delete a repository and all its data.
    ///
    /// # Errors
    /// `InvalidInput` for a blank id; request failures.
    pub async fn delete_repository(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", paths::REPOSITORIES, require_id(id)?);
        self.send(|| self.context.write(RequestDescriptor::delete(path.clone()))).await?;
        self.context.span.in_scope(|| info!(repository = id, "repository deleted"));
        Ok(())
    }

    /// Protocol version implemented by the server.
    ///
    /// # Errors
    /// Request failures.
    pub async fn get_protocol_version(&self) -> Result<String> {
        let response = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::get(paths::PROTOCOL)
                        .with_header(headers::ACCEPT, mime::TEXT_PLAIN),
                )
            })
            .await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// # Errors
    /// `Auth` for rejected credentials; login request failures.
    pub async fn login(&self) -> Result<()> {
        self.executor.authenticate().instrument(self.context.span.clone()).await
    }

    pub async fn logout(&self) {
        self.executor.logout().instrument(self.context.span.clone()).await;
    }

    async fn send<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        self.executor.execute(build).instrument(self.context.span.clone()).await
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(GraphDbError::InvalidInput("repository id must not be empty".into()));
    }
    Ok(id)
}
