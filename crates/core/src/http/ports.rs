//! Port interfaces for the HTTP transport

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use graphdb_domain::constants::headers;
use graphdb_domain::{Endpoint, GraphDbError, Headers, RequestDescriptor, Result};
use serde::de::DeserializeOwned;

/// Streamed response body
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Response body, buffered or streamed according to the request's
/// `ResponseMode`
pub enum ResponseBody {
    Buffered(Vec<u8>),
    Streamed(ByteStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// A response received from one endpoint
#[derive(Debug)]
pub struct HttpResponse {
    endpoint: Endpoint,
    status: u16,
    headers: Headers,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(endpoint: Endpoint, status: u16, headers: Headers, body: ResponseBody) -> Self {
        Self { endpoint, status, headers, body }
    }

    /// Endpoint that produced this response
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// MIME type of the body without parameters (`; charset=...`)
    pub fn content_type(&self) -> Option<String> {
        self.header(headers::CONTENT_TYPE).map(normalize_mime)
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Read the whole body, draining a stream if necessary.
    ///
    /// # Errors
    /// Propagates stream failures.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streamed(stream) => {
                stream
                    .try_fold(Vec::new(), |mut acc, chunk| async move {
                        acc.extend_from_slice(&chunk);
                        Ok(acc)
                    })
                    .await
            }
        }
    }

    /// # Errors
    /// Returns `GraphDbError::Parse` if the body is not UTF-8.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes)
            .map_err(|e| GraphDbError::Parse(format!("response body is not UTF-8: {e}")))
    }

    /// # Errors
    /// Returns `GraphDbError::Parse` if the body is not valid JSON for `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GraphDbError::Parse(format!("invalid JSON body: {e}")))
    }
}

/// Lowercase a MIME type and drop its parameters
pub fn normalize_mime(raw: &str) -> String {
    raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// HTTP transport bound to one base URL.
///
/// Implementations return `Ok` for every response that was received,
/// whatever its status; `Err(GraphDbError::Transport)` means no response
/// (connection refused, DNS failure, timeout).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Base URL this transport sends to
    fn endpoint(&self) -> &Endpoint;

    /// Send one attempt of a request
    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse>;
}

/// Creates one transport binding per endpoint
pub trait TransportFactory: Send + Sync {
    /// # Errors
    /// Returns `GraphDbError::Config` if the transport cannot be built.
    fn bind(&self, endpoint: &Endpoint) -> Result<Arc<dyn HttpTransport>>;
}
