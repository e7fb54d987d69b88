//! # GraphDB Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - Configuration loading from environment variables and files
//! - Tracing subscriber setup
//! - Client constructors wired to the HTTP transport
//!
//! ## Architecture
//! - Implements traits defined in `graphdb-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod clients;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use clients::{repository_client, repository_client_from_env, server_client};
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportFactory, ReqwestTransportFactoryBuilder};
pub use logging::init_tracing;
