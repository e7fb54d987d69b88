//! Endpoints and ordered endpoint sets

use std::fmt;

use url::Url;

use crate::constants::paths;
use crate::errors::{GraphDbError, Result};

/// One base URL of a repository, transaction or server resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Parse an absolute http(s) URL.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` if the URL is malformed or not http(s).
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| GraphDbError::Config(format!("invalid endpoint '{raw}': {e}")))?;
        Self::from_url(url)
    }

    /// Wrap an already parsed URL.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` for non-http(s) schemes.
    pub fn from_url(mut url: Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GraphDbError::Config(format!(
                "unsupported endpoint scheme '{}' in {url}",
                url.scheme()
            )));
        }
        url.set_query(None);
        url.set_fragment(None);
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Append a relative resource path. An empty path addresses the endpoint
    /// itself.
    ///
    /// # Errors
    /// Returns `GraphDbError::InvalidInput` if the joined URL is malformed.
    pub fn join(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Ok(self.url.clone());
        }
        let base = self.url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{relative}"))
            .map_err(|e| GraphDbError::InvalidInput(format!("invalid request path '{path}': {e}")))
    }

    /// Resolve a `Location` header value, absolute or relative, against this
    /// endpoint.
    ///
    /// # Errors
    /// Returns `GraphDbError::Parse` if the location cannot be resolved.
    pub fn resolve(&self, location: &str) -> Result<Self> {
        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        let url = base
            .join(location.trim())
            .map_err(|e| GraphDbError::Parse(format!("invalid location '{location}': {e}")))?;
        Self::from_url(url)
    }

    /// The server root: everything before a `/repositories/{id}` segment.
    /// Endpoints without such a segment are already server roots.
    pub fn server_root(&self) -> Self {
        let segments: Vec<&str> =
            self.url.path_segments().map(|segments| segments.collect()).unwrap_or_default();

        let Some(position) = segments.iter().position(|s| *s == paths::REPOSITORIES) else {
            return self.clone();
        };

        let mut url = self.url.clone();
        url.set_path(&segments[..position].join("/"));
        Self { url }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, non-empty list of interchangeable endpoints for one logical
/// resource. Order is the failover order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    /// Build a set from raw URLs.
    ///
    /// # Errors
    /// Returns `GraphDbError::Config` if the list is empty or any URL is
    /// invalid.
    pub fn parse<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints =
            urls.into_iter().map(|raw| Endpoint::parse(raw.as_ref())).collect::<Result<Vec<_>>>()?;
        Self::new(endpoints)
    }

    /// # Errors
    /// Returns `GraphDbError::Config` if `endpoints` is empty.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(GraphDbError::Config("endpoint set must not be empty".into()));
        }
        Ok(Self { endpoints })
    }

    pub fn single(endpoint: Endpoint) -> Self {
        Self { endpoints: vec![endpoint] }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn first(&self) -> &Endpoint {
        &self.endpoints[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    /// Distinct server roots of all endpoints, in endpoint order.
    pub fn server_roots(&self) -> Self {
        let mut roots: Vec<Endpoint> = Vec::with_capacity(self.endpoints.len());
        for root in self.endpoints.iter().map(Endpoint::server_root) {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        Self { endpoints: roots }
    }
}

impl<'a> IntoIterator for &'a EndpointSet {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}
