//! Value types shared by the client crates

pub mod endpoint;
pub mod payload;
pub mod rdf;
pub mod request;
pub mod transaction;

pub use endpoint::{Endpoint, EndpointSet};
pub use payload::{GetStatementsPayload, QueryPayload, UpdatePayload};
pub use rdf::{Namespace, Quad, Term};
pub use request::{
    Headers, HttpMethod, ParamValue, QueryParams, RequestBody, RequestDescriptor, ResponseMode,
};
pub use transaction::{IsolationLevel, TransactionAction, TransactionState};
