//! # GraphDB Domain
//!
//! Plain data types for the graph database client.
//!
//! This crate contains:
//! - Error types and the `Result` alias
//! - Client configuration structures
//! - Endpoint sets and request descriptors
//! - RDF term, payload and transaction types
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other client crates
//! - No I/O, no async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
