//! # GraphDB Core
//!
//! Request, session and transaction logic of the graph database client.
//!
//! This crate contains:
//! - The transport port (`HttpTransport`, `TransportFactory`)
//! - The failover executor and its retry policy
//! - Session handling (login, token cache, re-login on 401)
//! - Repository, transaction and server clients
//! - Content parser registry and the N-Quads term converter
//!
//! ## Architecture Principles
//! - Only depends on `graphdb-domain`
//! - No HTTP library code; transports are injected through
//!   `TransportFactory`
//! - Network calls are the only suspension points

pub mod content;
mod context;
pub mod http;
pub mod repository;
pub mod server;
pub mod session;
pub mod transaction;

pub use content::{
    Binding, ContentParser, NQuadsConverter, ParseOptions, ParsedContent, ParserRegistry,
    QueryResult, RawParser, SparqlJsonParser, TermConverter,
};
pub use http::{
    ByteStream, HttpResponse, HttpTransport, ResponseBody, RetryPolicy, RetryingExecutor,
    TransportFactory,
};
pub use repository::RepositoryClient;
pub use server::ServerClient;
pub use session::{AuthenticationSession, SessionAwareExecutor, SessionToken};
pub use transaction::TransactionClient;
