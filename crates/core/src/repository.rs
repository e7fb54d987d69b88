//! Client for one logical repository served by equivalent endpoints

use std::sync::Arc;

use graphdb_domain::constants::{headers, mime, params, paths};
use graphdb_domain::{
    EndpointSet, GetStatementsPayload, GraphDbError, IsolationLevel, Namespace, Quad, QueryParams,
    QueryPayload, RepositoryClientConfig, RequestBody, RequestDescriptor, Result, Term,
    UpdatePayload,
};
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument, Span};

use crate::content::{sparql, Binding, ParserRegistry, QueryResult, TermConverter};
use crate::context::{read_count, require_data, ClientContext};
use crate::http::{HttpResponse, TransportFactory};
use crate::session::{AuthenticationSession, SessionAwareExecutor};
use crate::transaction::TransactionClient;

/// Repository operations with failover, retries and session handling.
///
/// The client is `Send + Sync`; share it behind an `Arc` to issue calls
/// concurrently. Each call walks the endpoint set independently.
pub struct RepositoryClient {
    endpoints: EndpointSet,
    executor: SessionAwareExecutor,
    context: ClientContext,
}

impl RepositoryClient {
    /// Validate the configuration and bind one transport per endpoint.
    ///
    /// # Errors
    /// `Config` for an empty or malformed endpoint list, invalid auth
    /// settings, or a transport that cannot be built.
    pub fn new(
        config: &RepositoryClientConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self> {
        let endpoints = config.endpoint_set()?;
        let span = info_span!("repository", endpoint = %endpoints.first());
        let mut context = ClientContext::new(&config.client, factory, span);
        context.rdf_mime_type = config.default_rdf_mime_type.clone();
        context.query_mime_type = config.default_query_mime_type.clone();

        let session = Arc::new(AuthenticationSession::from_config(&config.client));
        let executor = SessionAwareExecutor::bind(
            &endpoints,
            context.factory.as_ref(),
            context.policy.clone(),
            session,
        )?;

        debug!(endpoints = endpoints.len(), "repository client created");
        Ok(Self { endpoints, executor, context })
    }

    /// Replace the parser registry used for reads and queries
    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.context.parsers = Arc::new(parsers);
        self
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn TermConverter>) -> Self {
        self.context.converter = converter;
        self
    }

    /// Run every operation inside `span` instead of the default
    /// `repository` span
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.context.span = span;
        self
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.context.parsers
    }

    /// Execute an arbitrary request relative to the repository endpoint.
    ///
    /// Default headers are applied; the request goes through login,
    /// failover and retries like every built-in operation.
    ///
    /// # Errors
    /// Login and request failures.
    pub async fn execute<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        self.send(|| build().with_default_headers(&self.context.headers)).await
    }

    /// Open a transaction. The returned client shares this client's session
    /// and settings.
    ///
    /// # Errors
    /// `MissingTransactionLocation` when the server answers without a
    /// `Location` header; login and request failures.
    pub async fn begin_transaction(
        &self,
        isolation: Option<IsolationLevel>,
    ) -> Result<TransactionClient> {
        let response = self
            .send(|| {
                let request = self.context.write(RequestDescriptor::post(paths::TRANSACTIONS));
                match isolation {
                    Some(level) => request.with_param(params::ISOLATION_LEVEL, level.as_iri()),
                    None => request,
                }
            })
            .await?;

        let location = response
            .header(headers::LOCATION)
            .filter(|location| !location.trim().is_empty())
            .ok_or(GraphDbError::MissingTransactionLocation)?;
        let location = response.endpoint().resolve(location)?;

        self.context.span.in_scope(|| info!(%location, "transaction started"));
        TransactionClient::open(location, self.context.clone(), Arc::clone(self.executor.session()))
    }

    /// Number of statements, optionally restricted to one graph.
    ///
    /// # Errors
    /// Request failures, or `Parse` for a non-numeric answer.
    pub async fn get_size(&self, context: Option<&str>) -> Result<u64> {
        let context = context.map(|c| self.context.encode_context(c)).transpose()?;
        let response = self
            .send(|| {
                let request = self.context.read(
                    RequestDescriptor::get(paths::SIZE)
                        .with_header(headers::ACCEPT, mime::TEXT_PLAIN),
                );
                match &context {
                    Some(context) => request.with_param(params::CONTEXT, context.clone()),
                    None => request,
                }
            })
            .await?;
        read_count(response).await
    }

    /// Read statements matching a pattern.
    ///
    /// # Errors
    /// Request and parse failures.
    pub async fn get(&self, payload: &GetStatementsPayload) -> Result<QueryResult> {
        let accept =
            payload.response_type.clone().unwrap_or_else(|| self.context.rdf_mime_type.clone());
        let mut query = QueryParams::new();
        for (name, value) in payload.params() {
            query.set(name, value);
        }
        query.set_repeated(params::CONTEXT, self.context.encode_contexts(&payload.contexts)?);
        let mode = self.context.response_mode(&accept);

        let response = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::get(paths::STATEMENTS)
                        .with_params(query.clone())
                        .with_header(headers::ACCEPT, accept.clone())
                        .with_response_mode(mode),
                )
            })
            .await?;
        self.context.into_result(response, &accept, None).await
    }

    /// Evaluate a SPARQL query, sent as a form on the repository URL.
    ///
    /// # Errors
    /// `InvalidInput` for an invalid payload; request and parse failures.
    pub async fn query(&self, payload: &QueryPayload) -> Result<QueryResult> {
        payload.validate()?;
        let accept =
            payload.response_type.clone().unwrap_or_else(|| self.context.query_mime_type.clone());
        let form = payload.form();
        let mode = self.context.response_mode(&accept);

        let response = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::post("")
                        .with_header(headers::ACCEPT, accept.clone())
                        .with_header(headers::CONTENT_TYPE, mime::FORM_URLENCODED)
                        .with_body(RequestBody::Form(form.clone()))
                        .with_response_mode(mode),
                )
            })
            .await?;
        self.context.into_result(response, &accept, None).await
    }

    /// Execute a SPARQL update.
    ///
    /// # Errors
    /// `InvalidInput` for a blank update; request failures.
    pub async fn update(&self, payload: &UpdatePayload) -> Result<()> {
        payload.validate()?;
        let form = payload.form();
        self.send(|| {
            self.context.write(
                RequestDescriptor::post(paths::STATEMENTS)
                    .with_header(headers::CONTENT_TYPE, mime::FORM_URLENCODED)
                    .with_body(RequestBody::Form(form.clone())),
            )
        })
        .await
        .map(|_| ())
    }

    /// Add one statement from string-encoded terms.
    ///
    /// # Errors
    /// `InvalidInput` for terms the converter rejects; request failures.
    pub async fn add(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        context: Option<&str>,
    ) -> Result<()> {
        let quad = self.context.quad(subject, predicate, object, context)?;
        self.add_quads(&[quad]).await
    }

    /// # Errors
    /// `InvalidInput` for an empty slice; request failures.
    pub async fn add_quads(&self, quads: &[Quad]) -> Result<()> {
        let payload = self.context.serialize(quads)?;
        let content_type = self.context.converter.content_type().to_string();
        let request = RequestDescriptor::post(paths::STATEMENTS);
        self.send_statements(request, RequestBody::Text(payload), &content_type).await
    }

    /// Replace all statements with `quads`.
    ///
    /// # Errors
    /// `InvalidInput` for an empty slice; request failures.
    pub async fn put_quads(&self, quads: &[Quad]) -> Result<()> {
        let payload = self.context.serialize(quads)?;
        let content_type = self.context.converter.content_type().to_string();
        let request = RequestDescriptor::put(paths::STATEMENTS);
        self.send_statements(request, RequestBody::Text(payload), &content_type).await
    }

    /// Add statements already serialized by the caller. The content type
    /// defaults to the client's RDF type.
    ///
    /// # Errors
    /// `InvalidInput` for empty data; request failures.
    pub async fn add_data(
        &self,
        data: &str,
        content_type: Option<&str>,
        context: Option<&str>,
    ) -> Result<()> {
        require_data(data.as_bytes())?;
        let content_type = content_type.unwrap_or(&self.context.rdf_mime_type).to_string();
        let mut request = RequestDescriptor::post(paths::STATEMENTS);
        if let Some(context) = context {
            request = request.with_param(params::CONTEXT, self.context.encode_context(context)?);
        }
        self.send_statements(request, RequestBody::Text(data.to_string()), &content_type).await
    }

    /// Add binary RDF content such as a file's bytes.
    ///
    /// # Errors
    /// `InvalidInput` for empty data; request failures.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
        context: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<()> {
        let request =
            self.upload_request(RequestDescriptor::post(paths::STATEMENTS), context, base_uri)?;
        self.send_binary(request, data, content_type).await
    }

    /// Replace the repository content, or one graph of it, with binary RDF
    /// content.
    ///
    /// # Errors
    /// `InvalidInput` for empty data; request failures.
    pub async fn overwrite(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
        context: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<()> {
        let request =
            self.upload_request(RequestDescriptor::put(paths::STATEMENTS), context, base_uri)?;
        self.send_binary(request, data, content_type).await
    }

    /// Delete statements matching a pattern; `None` matches anything.
    ///
    /// # Errors
    /// `InvalidInput` for terms the converter rejects; request failures.
    pub async fn delete_statements(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
        context: Option<&str>,
    ) -> Result<()> {
        let converter = &self.context.converter;
        let mut query = QueryParams::new();
        if let Some(subject) = subject {
            query.set(params::SUBJECT, converter.encode(&converter.to_subject(subject)?));
        }
        if let Some(predicate) = predicate {
            query.set(params::PREDICATE, converter.encode(&converter.to_predicate(predicate)?));
        }
        if let Some(object) = object {
            query.set(params::OBJECT, converter.encode(&converter.to_object(object)?));
        }
        if let Some(context) = context {
            query.set(params::CONTEXT, self.context.encode_context(context)?);
        }

        self.send(|| {
            self.context
                .write(RequestDescriptor::delete(paths::STATEMENTS).with_params(query.clone()))
        })
        .await
        .map(|_| ())
    }

    /// Delete every statement in the repository.
    ///
    /// # Errors
    /// Request failures.
    pub async fn delete_all(&self) -> Result<()> {
        self.send(|| self.context.write(RequestDescriptor::delete(paths::STATEMENTS)))
            .await
            .map(|_| ())
    }

    /// # Errors
    /// Request failures, or `Parse` for a malformed result document.
    pub async fn get_namespaces(&self) -> Result<Vec<Namespace>> {
        let rows = self.select(paths::NAMESPACES).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(Namespace {
                    prefix: row.get("prefix")?.value().to_string(),
                    namespace: row.get("namespace")?.value().to_string(),
                })
            })
            .collect())
    }

    /// Namespace bound to `prefix`, `None` when the prefix is unknown.
    ///
    /// # Errors
    /// `InvalidInput` for an empty prefix; request failures other than 404.
    pub async fn get_namespace(&self, prefix: &str) -> Result<Option<String>> {
        let path = namespace_path(prefix)?;
        let result = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::get(path.clone())
                        .with_header(headers::ACCEPT, mime::TEXT_PLAIN),
                )
            })
            .await;

        match result {
            Ok(response) => Ok(Some(response.text().await?.trim().to_string())),
            Err(GraphDbError::Status { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Bind `prefix` to `namespace`, replacing an existing binding.
    ///
    /// # Errors
    /// `InvalidInput` for an empty prefix or namespace; request failures.
    pub async fn save_namespace(&self, prefix: &str, namespace: &str) -> Result<()> {
        let path = namespace_path(prefix)?;
        if namespace.trim().is_empty() {
            return Err(GraphDbError::InvalidInput("namespace must not be empty".into()));
        }
        self.send(|| {
            self.context.write(
                RequestDescriptor::put(path.clone())
                    .with_header(headers::CONTENT_TYPE, mime::TEXT_PLAIN)
                    .with_body(RequestBody::Text(namespace.to_string())),
            )
        })
        .await
        .map(|_| ())
    }

    /// # Errors
    /// `InvalidInput` for an empty prefix; request failures.
    pub async fn delete_namespace(&self, prefix: &str) -> Result<()> {
        let path = namespace_path(prefix)?;
        self.send(|| self.context.write(RequestDescriptor::delete(path.clone())))
            .await
            .map(|_| ())
    }

    /// # Errors
    /// Request failures.
    pub async fn delete_all_namespaces(&self) -> Result<()> {
        self.send(|| self.context.write(RequestDescriptor::delete(paths::NAMESPACES)))
            .await
            .map(|_| ())
    }

    /// Named graphs that contain at least one statement.
    ///
    /// # Errors
    /// Request failures, or `Parse` for a malformed result document.
    pub async fn get_contexts(&self) -> Result<Vec<Term>> {
        let rows = self.select(paths::CONTEXTS).await?;
        Ok(sparql::column(&rows, "contextID"))
    }

    /// Log in now instead of on the first request.
    ///
    /// # Errors
    /// `Auth` for rejected credentials; login request failures.
    pub async fn login(&self) -> Result<()> {
        self.executor.authenticate().instrument(self.context.span.clone()).await
    }

    /// Forget the session token. No request is sent.
    pub async fn logout(&self) {
        self.executor.logout().instrument(self.context.span.clone()).await;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.executor.session().has_token().await
    }

    /// Login response body of the current session
    pub async fn session_claims(&self) -> Option<Value> {
        self.executor.session().claims().await
    }

    async fn select(&self, path: &'static str) -> Result<Vec<Binding>> {
        let response = self
            .send(|| {
                self.context.read(
                    RequestDescriptor::get(path)
                        .with_header(headers::ACCEPT, mime::SPARQL_RESULTS_JSON),
                )
            })
            .await?;
        sparql::parse_bindings(&response.bytes().await?)
    }

    fn upload_request(
        &self,
        mut request: RequestDescriptor,
        context: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<RequestDescriptor> {
        if let Some(context) = context {
            request = request.with_param(params::CONTEXT, self.context.encode_context(context)?);
        }
        if let Some(base_uri) = base_uri {
            request = request.with_param(params::BASE_URI, base_uri);
        }
        Ok(request)
    }

    async fn send_binary(
        &self,
        request: RequestDescriptor,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        require_data(&data)?;
        let content_type = content_type.unwrap_or(&self.context.rdf_mime_type).to_string();
        self.send_statements(request, RequestBody::Bytes(data), &content_type).await
    }

    async fn send_statements(
        &self,
        request: RequestDescriptor,
        body: RequestBody,
        content_type: &str,
    ) -> Result<()> {
        self.send(|| {
            self.context.write(
                request
                    .clone()
                    .with_header(headers::CONTENT_TYPE, content_type)
                    .with_body(body.clone()),
            )
        })
        .await
        .map(|_| ())
    }

    async fn send<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        self.executor.execute(build).instrument(self.context.span.clone()).await
    }
}

fn namespace_path(prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(GraphDbError::InvalidInput("namespace prefix must not be empty".into()));
    }
    Ok(format!("{}/{prefix}", paths::NAMESPACES))
}

impl std::fmt::Debug for RepositoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryClient")
            .field("endpoints", &self.endpoints)
            .field("session", self.executor.session())
            .finish_non_exhaustive()
    }
}
