//! Protocol constants shared by the client crates

use std::time::Duration;

/// Header names. Always lowercase; header maps compare case-insensitively.
pub mod headers {
    pub const AUTHORIZATION: &str = "authorization";
    pub const ACCEPT: &str = "accept";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const LOCATION: &str = "location";
    pub const GRAPHDB_PASSWORD: &str = "x-graphdb-password";
}

/// Query and form parameter names of the RDF4J protocol
pub mod params {
    pub const ACTION: &str = "action";
    pub const ISOLATION_LEVEL: &str = "isolation-level";
    pub const SUBJECT: &str = "subj";
    pub const PREDICATE: &str = "pred";
    pub const OBJECT: &str = "obj";
    pub const CONTEXT: &str = "context";
    pub const INFER: &str = "infer";
    pub const QUERY: &str = "query";
    pub const UPDATE: &str = "update";
    pub const TIMEOUT: &str = "timeout";
    pub const DISTINCT: &str = "distinct";
    pub const LIMIT: &str = "limit";
    pub const OFFSET: &str = "offset";
    pub const BASE_URI: &str = "baseURI";
}

/// MIME types used by the client
pub mod mime {
    pub const N_QUADS: &str = "application/n-quads";
    pub const N_TRIPLES: &str = "application/n-triples";
    pub const TURTLE: &str = "text/turtle";
    pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
    pub const SPARQL_UPDATE: &str = "application/sparql-update";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const JSON: &str = "application/json";
}

/// Resource paths relative to a repository or server endpoint
pub mod paths {
    pub const REPOSITORIES: &str = "repositories";
    pub const STATEMENTS: &str = "statements";
    pub const SIZE: &str = "size";
    pub const CONTEXTS: &str = "contexts";
    pub const NAMESPACES: &str = "namespaces";
    pub const TRANSACTIONS: &str = "transactions";
    pub const PROTOCOL: &str = "protocol";
    pub const LOGIN: &str = "rest/login";
    pub const SECURITY_USERS: &str = "rest/security/users";
}

/// Status the server uses to signal "service busy"
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Status signalling an expired or missing session token
pub const UNAUTHORIZED: u16 = 401;

/// Default timeout for read requests
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for write requests
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of retries per endpoint (attempts = retries + 1)
pub const DEFAULT_RETRY_COUNT: u32 = 2;
