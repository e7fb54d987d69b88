//! Client for one server-side transaction

use std::sync::Arc;

use graphdb_domain::constants::{headers, mime, params};
use graphdb_domain::{
    Endpoint, EndpointSet, GetStatementsPayload, GraphDbError, Quad, QueryParams, QueryPayload,
    RequestBody, RequestDescriptor, Result, TransactionAction, TransactionState, UpdatePayload,
};
use parking_lot::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::content::QueryResult;
use crate::context::{read_count, require_data, ClientContext};
use crate::http::HttpResponse;
use crate::session::{AuthenticationSession, SessionAwareExecutor};

/// Handle to one open transaction.
///
/// Every operation is a single request on the transaction URI. `commit` and
/// `rollback` move the handle to a terminal state before their request is
/// sent, whatever its outcome; after that every call fails with
/// `TransactionInactive` without touching the network.
pub struct TransactionClient {
    location: Endpoint,
    executor: SessionAwareExecutor,
    context: ClientContext,
    state: Mutex<TransactionState>,
}

impl TransactionClient {
    pub(crate) fn open(
        location: Endpoint,
        mut context: ClientContext,
        session: Arc<AuthenticationSession>,
    ) -> Result<Self> {
        let executor = SessionAwareExecutor::bind(
            &EndpointSet::single(location.clone()),
            context.factory.as_ref(),
            context.policy.clone(),
            session,
        )?;
        context.span = info_span!(parent: &context.span, "transaction", location = %location);

        Ok(Self { location, executor, context, state: Mutex::new(TransactionState::Active) })
    }

    /// Transaction URI assigned by the server
    pub fn location(&self) -> &Endpoint {
        &self.location
    }

    pub fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Read statements visible inside the transaction.
    ///
    /// # Errors
    /// `TransactionInactive` on a terminal handle; otherwise request and
    /// parse failures.
    pub async fn get(&self, payload: &GetStatementsPayload) -> Result<QueryResult> {
        self.ensure_active()?;
        let accept =
            payload.response_type.clone().unwrap_or_else(|| self.context.rdf_mime_type.clone());
        let mut query = QueryParams::new();
        for (name, value) in payload.params() {
            query.set(name, value);
        }
        query.set_repeated(params::CONTEXT, self.context.encode_contexts(&payload.contexts)?);
        let mode = self.context.response_mode(&accept);

        let response = self
            .send(TransactionAction::Get, || {
                self.request(TransactionAction::Get, query.clone())
                    .with_header(headers::ACCEPT, accept.clone())
                    .with_response_mode(mode)
            })
            .await?;
        self.context.into_result(response, &accept, None).await
    }

    /// Add one statement from string-encoded terms.
    ///
    /// # Errors
    /// `InvalidInput` for terms the converter rejects, plus the errors of
    /// [`TransactionClient::add_quads`].
    pub async fn add(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        context: Option<&str>,
    ) -> Result<()> {
        self.ensure_active()?;
        let quad = self.context.quad(subject, predicate, object, context)?;
        self.add_quads(&[quad]).await
    }

    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for an empty slice, or request
    /// failures.
    pub async fn add_quads(&self, quads: &[Quad]) -> Result<()> {
        self.ensure_active()?;
        let payload = self.context.serialize(quads)?;
        let content_type = self.context.converter.content_type().to_string();
        self.send_body(TransactionAction::Add, RequestBody::Text(payload), &content_type).await
    }

    /// Add statements already serialized by the caller. The content type
    /// defaults to the client's RDF type.
    ///
    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for empty data, or request
    /// failures.
    pub async fn add_data(&self, data: &str, content_type: Option<&str>) -> Result<()> {
        self.ensure_active()?;
        require_data(data.as_bytes())?;
        let content_type = content_type.unwrap_or(&self.context.rdf_mime_type).to_string();
        self.send_body(TransactionAction::Add, RequestBody::Text(data.to_string()), &content_type)
            .await
    }

    /// Remove the given serialized statements.
    ///
    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for empty data, or request
    /// failures.
    pub async fn delete_data(&self, data: &str, content_type: Option<&str>) -> Result<()> {
        self.ensure_active()?;
        require_data(data.as_bytes())?;
        let content_type = content_type.unwrap_or(&self.context.rdf_mime_type).to_string();
        let body = RequestBody::Text(data.to_string());
        self.send_body(TransactionAction::Delete, body, &content_type).await
    }

    /// Add binary RDF content, e.g. the bytes of a file.
    ///
    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for empty data, or request
    /// failures.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<()> {
        self.ensure_active()?;
        require_data(&data)?;
        let content_type = content_type.unwrap_or(&self.context.rdf_mime_type).to_string();
        let mut query = QueryParams::new();
        if let Some(base_uri) = base_uri {
            query.set(params::BASE_URI, base_uri);
        }

        self.send(TransactionAction::Add, || {
            self.request(TransactionAction::Add, query.clone())
                .with_header(headers::CONTENT_TYPE, content_type.clone())
                .with_body(RequestBody::Bytes(data.clone()))
        })
        .await
        .map(|_| ())
    }

    /// Number of statements, optionally restricted to one graph.
    ///
    /// # Errors
    /// `TransactionInactive`, request failures, or `Parse` for a
    /// non-numeric answer.
    pub async fn get_size(&self, context: Option<&str>) -> Result<u64> {
        self.ensure_active()?;
        let mut query = QueryParams::new();
        if let Some(context) = context {
            query.set(params::CONTEXT, self.context.encode_context(context)?);
        }

        let response = self
            .send(TransactionAction::Size, || {
                self.request(TransactionAction::Size, query.clone())
                    .with_header(headers::ACCEPT, mime::TEXT_PLAIN)
            })
            .await?;
        read_count(response).await
    }

    /// Evaluate a query against the transaction's view of the data.
    ///
    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for an invalid payload, request
    /// or parse failures.
    pub async fn query(&self, payload: &QueryPayload) -> Result<QueryResult> {
        self.ensure_active()?;
        payload.validate()?;
        let accept =
            payload.response_type.clone().unwrap_or_else(|| self.context.query_mime_type.clone());
        let mut query = QueryParams::new();
        for (name, value) in payload.form() {
            query.set(name, value);
        }
        let mode = self.context.response_mode(&accept);

        let response = self
            .send(TransactionAction::Query, || {
                self.request(TransactionAction::Query, query.clone())
                    .with_header(headers::ACCEPT, accept.clone())
                    .with_response_mode(mode)
            })
            .await?;
        self.context.into_result(response, &accept, None).await
    }

    /// Execute a SPARQL update inside the transaction.
    ///
    /// # Errors
    /// `TransactionInactive`, `InvalidInput` for a blank update, or request
    /// failures.
    pub async fn update(&self, payload: &UpdatePayload) -> Result<()> {
        self.ensure_active()?;
        payload.validate()?;
        let mut query = QueryParams::new();
        for (name, value) in payload.form() {
            query.set(name, value);
        }

        self.send(TransactionAction::Update, || {
            self.request(TransactionAction::Update, query.clone())
        })
        .await
        .map(|_| ())
    }

    /// Commit. The handle is terminal afterwards even if the request fails.
    ///
    /// # Errors
    /// `TransactionInactive` if already terminal; otherwise the request
    /// failure, surfaced after the state change.
    pub async fn commit(&self) -> Result<()> {
        self.finish(TransactionState::Committed)?;
        let result = self
            .send(TransactionAction::Commit, || {
                self.request(TransactionAction::Commit, QueryParams::new())
            })
            .await;
        self.log_outcome("commit", &result);
        result.map(|_| ())
    }

    /// Roll back with `DELETE` on the transaction URI. The handle is
    /// terminal afterwards even if the request fails.
    ///
    /// # Errors
    /// `TransactionInactive` if already terminal; otherwise the request
    /// failure, surfaced after the state change.
    pub async fn rollback(&self) -> Result<()> {
        self.finish(TransactionState::RolledBack)?;
        let result = self
            .executor
            .execute(|| self.context.write(RequestDescriptor::delete("")))
            .instrument(self.context.span.clone())
            .await;
        self.log_outcome("rollback", &result);
        result.map(|_| ())
    }

    fn ensure_active(&self) -> Result<()> {
        let state = *self.state.lock();
        if state.is_terminal() {
            return Err(GraphDbError::TransactionInactive { state });
        }
        Ok(())
    }

    /// Single Active -> terminal transition; concurrent callers lose with
    /// `TransactionInactive`.
    fn finish(&self, terminal: TransactionState) -> Result<()> {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return Err(GraphDbError::TransactionInactive { state: *state });
        }
        *state = terminal;
        Ok(())
    }

    fn request(&self, action: TransactionAction, mut query: QueryParams) -> RequestDescriptor {
        query.set(params::ACTION, action.as_str());
        let request = RequestDescriptor::put("").with_params(query);
        if action.is_read() {
            self.context.read(request)
        } else {
            self.context.write(request)
        }
    }

    async fn send_body(
        &self,
        action: TransactionAction,
        body: RequestBody,
        content_type: &str,
    ) -> Result<()> {
        self.send(action, || {
            self.request(action, QueryParams::new())
                .with_header(headers::CONTENT_TYPE, content_type)
                .with_body(body.clone())
        })
        .await
        .map(|_| ())
    }

    async fn send<F>(&self, action: TransactionAction, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        debug!(%action, "transaction request");
        self.executor.execute(build).instrument(self.context.span.clone()).await
    }

    fn log_outcome(&self, operation: &str, result: &Result<HttpResponse>) {
        self.context.span.in_scope(|| match result {
            Ok(_) => info!(operation, "transaction finished"),
            Err(error) => warn!(operation, error = %error, "transaction finished with an error"),
        });
    }
}

impl std::fmt::Debug for TransactionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionClient")
            .field("location", &self.location)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
