//! Settings shared by a repository client and the transactions it begins

use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use graphdb_domain::constants::mime;
use graphdb_domain::{
    ClientConfig, GraphDbError, Headers, Quad, RequestDescriptor, ResponseMode, Result, Term,
};
use tracing::Span;

use crate::content::{
    NQuadsConverter, ParseOptions, ParserRegistry, QueryResult, TermConverter,
};
use crate::http::{
    normalize_mime, ByteStream, HttpResponse, ResponseBody, RetryPolicy, TransportFactory,
};

#[derive(Clone)]
pub(crate) struct ClientContext {
    pub headers: Headers,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub rdf_mime_type: String,
    pub query_mime_type: String,
    pub parsers: Arc<ParserRegistry>,
    pub converter: Arc<dyn TermConverter>,
    pub factory: Arc<dyn TransportFactory>,
    pub policy: RetryPolicy,
    pub span: Span,
}

impl ClientContext {
    pub fn new(config: &ClientConfig, factory: Arc<dyn TransportFactory>, span: Span) -> Self {
        Self {
            headers: config.headers.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            rdf_mime_type: mime::N_QUADS.to_string(),
            query_mime_type: mime::SPARQL_RESULTS_JSON.to_string(),
            parsers: Arc::new(ParserRegistry::with_defaults()),
            converter: Arc::new(NQuadsConverter),
            factory,
            policy: RetryPolicy::from_config(config),
            span,
        }
    }

    /// Apply default headers and the read timeout
    pub fn read(&self, request: RequestDescriptor) -> RequestDescriptor {
        request.with_default_headers(&self.headers).with_timeout(self.read_timeout)
    }

    /// Apply default headers and the write timeout
    pub fn write(&self, request: RequestDescriptor) -> RequestDescriptor {
        request.with_default_headers(&self.headers).with_timeout(self.write_timeout)
    }

    /// Encode a caller-supplied graph name (`<iri>`, bare IRI, `_:b`, `null`)
    /// for a `context` parameter
    pub fn encode_context(&self, raw: &str) -> Result<String> {
        let term = self.converter.to_context(raw)?;
        Ok(self.converter.encode(&term))
    }

    pub fn encode_contexts(&self, raw: &[String]) -> Result<Vec<String>> {
        raw.iter().map(|context| self.encode_context(context)).collect()
    }

    /// Build a quad from string-encoded terms
    pub fn quad(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        context: Option<&str>,
    ) -> Result<Quad> {
        Ok(Quad::new(
            self.converter.to_subject(subject)?,
            self.converter.to_predicate(predicate)?,
            self.converter.to_object(object)?,
            match context {
                Some(context) => self.converter.to_context(context)?,
                None => Term::DefaultGraph,
            },
        ))
    }

    /// Serialize quads for upload; an empty slice is rejected
    pub fn serialize(&self, quads: &[Quad]) -> Result<String> {
        if quads.is_empty() {
            return Err(GraphDbError::InvalidInput("no statements to send".into()));
        }
        self.converter.serialize(quads)
    }

    /// Streamed when a streaming parser is registered for `accept`
    pub fn response_mode(&self, accept: &str) -> ResponseMode {
        if self.parsers.is_streaming(accept) {
            ResponseMode::Streamed
        } else {
            ResponseMode::Buffered
        }
    }

    /// Turn a successful read response into a [`QueryResult`] using the
    /// parser registered for the response type, falling back to the
    /// requested type when the server sent none.
    pub async fn into_result(
        &self,
        response: HttpResponse,
        requested: &str,
        base_uri: Option<String>,
    ) -> Result<QueryResult> {
        let content_type =
            response.content_type().unwrap_or_else(|| normalize_mime(requested));

        let Some(parser) = self.parsers.get(&content_type) else {
            let body = response.text().await?;
            return Ok(QueryResult::Text { content_type, body });
        };

        if parser.is_streaming() {
            let stream: ByteStream = match response.into_body() {
                ResponseBody::Streamed(stream) => stream,
                ResponseBody::Buffered(bytes) => {
                    stream::once(async move { Ok::<_, GraphDbError>(bytes) }).boxed()
                }
            };
            return Ok(QueryResult::Stream { content_type, stream });
        }

        let body = response.text().await?;
        let options = ParseOptions { content_type, base_uri };
        parser.parse(&body, &options).map(QueryResult::Parsed)
    }
}

pub(crate) fn require_data(data: &[u8]) -> Result<()> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(GraphDbError::InvalidInput("data must not be empty".into()));
    }
    Ok(())
}

/// Parse a numeric body such as the answer to a size request
pub(crate) async fn read_count(response: HttpResponse) -> Result<u64> {
    let body = response.text().await?;
    body.trim()
        .parse()
        .map_err(|e| GraphDbError::Parse(format!("expected a number, got '{}': {e}", body.trim())))
}
