//! Client constructors wired to the reqwest transport

use std::sync::Arc;

use graphdb_core::{RepositoryClient, ServerClient};
use graphdb_domain::{RepositoryClientConfig, Result, ServerClientConfig};

use crate::http::ReqwestTransportFactory;

/// Build a [`RepositoryClient`] that talks HTTP through reqwest.
///
/// # Errors
/// Returns `GraphDbError::Config` for an invalid configuration or if the HTTP
/// client cannot be built.
pub fn repository_client(config: &RepositoryClientConfig) -> Result<RepositoryClient> {
    let factory = ReqwestTransportFactory::from_config(&config.client)?;
    RepositoryClient::new(config, Arc::new(factory))
}

/// Build a [`ServerClient`] that talks HTTP through reqwest.
///
/// # Errors
/// Returns `GraphDbError::Config` for an invalid configuration or if the HTTP
/// client cannot be built.
pub fn server_client(config: &ServerClientConfig) -> Result<ServerClient> {
    let factory = ReqwestTransportFactory::from_config(&config.client)?;
    ServerClient::new(config, Arc::new(factory))
}

/// Load configuration (environment first, then file) and build a repository
/// client from it.
///
/// # Errors
/// Propagates loader and construction errors.
pub fn repository_client_from_env() -> Result<RepositoryClient> {
    repository_client(&crate::config::load()?)
}
