use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use graphdb_core::{HttpResponse, HttpTransport, ResponseBody, TransportFactory};
use graphdb_domain::{
    ClientConfig, Endpoint, GraphDbError, Headers, HttpMethod, RequestBody, RequestDescriptor,
    ResponseMode, Result,
};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use tracing::debug;

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("graphdb-client/", env!("CARGO_PKG_VERSION"));

/// [`HttpTransport`] over a shared reqwest client, bound to one endpoint.
///
/// Every received response is returned as `Ok`, whatever its status; only a
/// missing response (refused connection, DNS failure, timeout) is an error.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    endpoint: Endpoint,
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new(endpoint: Endpoint, client: ReqwestClient) -> Self {
        Self { endpoint, client }
    }

    fn build(&self, request: &RequestDescriptor) -> Result<RequestBuilder> {
        let url = self.endpoint.join(request.path())?;
        let mut builder = self.client.request(method(request.method()), url);

        if !request.params().is_empty() {
            builder = builder.query(&request.params().pairs());
        }
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        builder = match request.body() {
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            None => builder,
        };

        Ok(builder)
    }
}

/// Map a reqwest failure, reporting transport errors against the bound
/// endpoint rather than the full request URL.
fn transport_error(endpoint: &Endpoint, err: reqwest::Error) -> GraphDbError {
    match GraphDbError::from(InfraError::from(err)) {
        GraphDbError::Transport { message, .. } => {
            GraphDbError::transport(endpoint.as_str(), message)
        }
        other => other,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        let builder = self.build(&request)?;
        let method = request.method();
        let path = request.path();
        debug!(endpoint = %self.endpoint, %method, path, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(endpoint = %self.endpoint, %method, path, error = %err, "HTTP request failed");
            transport_error(&self.endpoint, err)
        })?;

        let status = response.status().as_u16();
        debug!(endpoint = %self.endpoint, %method, path, status, "received HTTP response");

        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();

        let body = match request.response_mode() {
            ResponseMode::Buffered => {
                let bytes =
                    response.bytes().await.map_err(|err| transport_error(&self.endpoint, err))?;
                ResponseBody::Buffered(bytes.to_vec())
            }
            ResponseMode::Streamed => {
                let endpoint = self.endpoint.clone();
                let stream = response
                    .bytes_stream()
                    .map_ok(|chunk| chunk.to_vec())
                    .map_err(move |err| transport_error(&endpoint, err));
                ResponseBody::Streamed(stream.boxed())
            }
        };

        Ok(HttpResponse::new(self.endpoint.clone(), status, headers, body))
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Binds [`ReqwestTransport`]s that share one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransportFactory {
    client: ReqwestClient,
}

impl ReqwestTransportFactory {
    /// Start building a new factory.
    pub fn builder() -> ReqwestTransportFactoryBuilder {
        ReqwestTransportFactoryBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Factory whose client-level timeout covers the slower of the
    /// configured read and write timeouts. Requests still carry their own.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder().timeout(config.read_timeout.max(config.write_timeout)).build()
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn bind(&self, endpoint: &Endpoint) -> Result<Arc<dyn HttpTransport>> {
        Ok(Arc::new(ReqwestTransport::new(endpoint.clone(), self.client.clone())))
    }
}

/// Builder for [`ReqwestTransportFactory`].
#[derive(Debug)]
pub struct ReqwestTransportFactoryBuilder {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    use_proxy: bool,
}

impl Default for ReqwestTransportFactoryBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: None,
            user_agent: None,
            use_proxy: false,
        }
    }
}

impl ReqwestTransportFactoryBuilder {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Honor system proxy settings (disabled by default).
    #[must_use]
    pub fn use_proxy(mut self, enabled: bool) -> Self {
        self.use_proxy = enabled;
        self
    }

    /// # Errors
    /// Returns `GraphDbError::Config` if the HTTP client cannot be built.
    pub fn build(self) -> Result<ReqwestTransportFactory> {
        let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder = ReqwestClient::builder().timeout(self.timeout).user_agent(agent);

        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder.build().map_err(|err| GraphDbError::from(InfraError::from(err)))?;

        Ok(ReqwestTransportFactory { client })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use graphdb_domain::constants::mime;
    use tokio::net::TcpListener;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn transport(server: &MockServer) -> Arc<dyn HttpTransport> {
        let endpoint = Endpoint::parse(&format!("{}/repositories/test", server.uri())).unwrap();
        ReqwestTransportFactory::new().unwrap().bind(&endpoint).unwrap()
    }

    #[tokio::test]
    async fn sends_params_headers_and_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repositories/test/statements"))
            .and(query_param("context", "<urn:g>"))
            .and(header("content-type", mime::N_QUADS))
            .and(body_string("<urn:s> <urn:p> <urn:o> .\n"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let request = RequestDescriptor::post("statements")
            .with_param("context", "<urn:g>")
            .with_header("Content-Type", mime::N_QUADS)
            .with_body(RequestBody::Text("<urn:s> <urn:p> <urn:o> .\n".into()));

        let response = transport(&server).await.send(request).await.unwrap();

        assert_eq!(response.status(), 204);
    }

    #[tokio::test]
    async fn form_bodies_are_url_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repositories/test"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("query=ASK+%7B%7D"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"boolean":true}"#))
            .mount(&server)
            .await;

        let request = RequestDescriptor::post("")
            .with_body(RequestBody::Form(vec![("query".into(), "ASK {}".into())]));

        let response = transport(&server).await.send(request).await.unwrap();

        assert_eq!(response.text().await.unwrap(), r#"{"boolean":true}"#);
    }

    #[tokio::test]
    async fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "1"))
            .mount(&server)
            .await;

        let response = transport(&server).await.send(RequestDescriptor::get("size")).await.unwrap();

        assert_eq!(response.status(), 503);
        assert_eq!(response.header("retry-after"), Some("1"));
    }

    #[tokio::test]
    async fn streamed_mode_yields_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let request =
            RequestDescriptor::get("statements").with_response_mode(ResponseMode::Streamed);
        let response = transport(&server).await.send(request).await.unwrap();

        let ResponseBody::Streamed(stream) = response.into_body() else {
            panic!("expected a streamed body");
        };
        let chunks: Vec<Vec<u8>> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn per_request_timeout_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let request = RequestDescriptor::get("size").with_timeout(Duration::from_millis(50));
        let error = transport(&server).await.send(request).await.unwrap_err();

        assert!(error.is_retriable(), "expected retriable error, got {error:?}");
    }

    #[tokio::test]
    async fn refused_connection_names_the_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::parse(&format!("http://{address}/repositories/test")).unwrap();
        let transport = ReqwestTransportFactory::new().unwrap().bind(&endpoint).unwrap();

        let error = transport.send(RequestDescriptor::get("size")).await.unwrap_err();

        match error {
            GraphDbError::Transport { endpoint: reported, .. } => {
                assert_eq!(reported, endpoint.as_str());
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
