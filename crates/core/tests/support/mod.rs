//! Shared test helpers for `graphdb-core` integration tests.
//!
//! `ScriptedNetwork` is a transport factory whose transports answer from
//! per-URL scripts and record every request they see, so tests can assert
//! exact attempt counts per endpoint.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graphdb_core::{HttpResponse, HttpTransport, ResponseBody, TransportFactory};
use graphdb_domain::{
    Endpoint, GraphDbError, Headers, HttpMethod, QueryParams, RequestBody, RequestDescriptor,
    Result,
};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Respond { status: u16, headers: Vec<(String, String)>, body: String },
    NoResponse,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self::Respond { status, headers: Vec::new(), body: String::new() }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::Respond { status: 200, headers: Vec::new(), body: body.into() }
    }

    pub fn no_response() -> Self {
        Self::NoResponse
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        match self {
            Self::Respond { status, mut headers, body } => {
                headers.push((name.to_string(), value.to_string()));
                Self::Respond { status, headers, body }
            }
            Self::NoResponse => Self::NoResponse,
        }
    }
}

/// A request as seen by the scripted transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Headers,
    pub params: QueryParams,
    pub body: Option<RequestBody>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.first(name)
    }
}

#[derive(Default)]
struct NetworkState {
    scripts: HashMap<String, VecDeque<Reply>>,
    fallbacks: HashMap<String, Reply>,
    log: Vec<RecordedRequest>,
}

fn key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Transport factory answering from scripts.
///
/// Replies queued with [`ScriptedNetwork::on`] are consumed in order; once a
/// URL's queue is empty its [`ScriptedNetwork::always`] reply is used, and
/// URLs with neither answer 404.
#[derive(Clone, Default)]
pub struct ScriptedNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Arc<dyn TransportFactory> {
        Arc::new(self.clone())
    }

    /// Queue one reply for `url`
    pub fn on(&self, url: &str, reply: Reply) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.scripts.entry(key(url)).or_default().push_back(reply);
        self
    }

    /// Queue the same reply `times` times
    pub fn on_times(&self, url: &str, reply: Reply, times: usize) -> &Self {
        for _ in 0..times {
            self.on(url, reply.clone());
        }
        self
    }

    /// Reply used once the queue for `url` is drained
    pub fn always(&self, url: &str, reply: Reply) -> &Self {
        self.state.lock().unwrap().fallbacks.insert(key(url), reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        let url = key(url);
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().log.len()
    }

    pub fn count_to(&self, url: &str) -> usize {
        self.requests_to(url).len()
    }

    fn answer(&self, endpoint: &Endpoint, request: RequestDescriptor) -> Result<HttpResponse> {
        let url = key(endpoint.join(request.path())?.as_str());
        let mut state = self.state.lock().unwrap();
        state.log.push(RecordedRequest {
            url: url.clone(),
            method: request.method(),
            headers: request.headers().clone(),
            params: request.params().clone(),
            body: request.body().cloned(),
        });

        let reply = match state.scripts.get_mut(&url).and_then(VecDeque::pop_front) {
            Some(reply) => reply,
            None => state.fallbacks.get(&url).cloned().unwrap_or_else(|| Reply::status(404)),
        };

        match reply {
            Reply::NoResponse => Err(GraphDbError::transport(url, "connection refused")),
            Reply::Respond { status, headers, body } => Ok(HttpResponse::new(
                endpoint.clone(),
                status,
                headers.into_iter().collect(),
                ResponseBody::Buffered(body.into_bytes()),
            )),
        }
    }
}

struct ScriptedTransport {
    endpoint: Endpoint,
    network: ScriptedNetwork,
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        self.network.answer(&self.endpoint, request)
    }
}

impl TransportFactory for ScriptedNetwork {
    fn bind(&self, endpoint: &Endpoint) -> Result<Arc<dyn HttpTransport>> {
        Ok(Arc::new(ScriptedTransport { endpoint: endpoint.clone(), network: self.clone() }))
    }
}

pub const REPO_A: &str = "http://a:7200/repositories/test";
pub const REPO_B: &str = "http://b:7200/repositories/test";
pub const REPO_C: &str = "http://c:7200/repositories/test";

pub fn url(base: &str, path: &str) -> String {
    format!("{base}/{path}")
}
