//! Conversions from external infrastructure errors into domain errors.

use graphdb_domain::GraphDbError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GraphDbError);

impl From<InfraError> for GraphDbError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GraphDbError> for InfraError {
    fn from(value: GraphDbError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGraphDbError {
    fn into_graphdb(self) -> GraphDbError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GraphDbError */
/* -------------------------------------------------------------------------- */

impl IntoGraphDbError for HttpError {
    fn into_graphdb(self) -> GraphDbError {
        let endpoint = self.url().map(ToString::to_string).unwrap_or_default();

        if self.is_builder() {
            return GraphDbError::Config(format!("invalid HTTP request: {self}"));
        }
        if self.is_timeout() {
            return GraphDbError::transport(endpoint, "HTTP request timed out");
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return GraphDbError::transport(endpoint, format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return GraphDbError::Parse(format!("failed to decode response body: {self}"));
        }

        if let Some(status) = self.status() {
            return GraphDbError::Status {
                endpoint,
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        // Request and body errors: the exchange broke off without a usable
        // response.
        GraphDbError::transport(endpoint, self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_graphdb())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
