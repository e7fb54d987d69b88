//! Response parsing and RDF term conversion
//!
//! Parsers are looked up by MIME type in a [`ParserRegistry`]; statement
//! payloads are produced by a [`TermConverter`].

pub mod nquads;
pub mod ports;
pub mod registry;
pub mod sparql;

pub use nquads::NQuadsConverter;
pub use ports::{Binding, ContentParser, ParseOptions, ParsedContent, QueryResult, TermConverter};
pub use registry::{ParserRegistry, RawParser};
pub use sparql::SparqlJsonParser;
