//! Content parsing and term conversion ports

use std::collections::BTreeMap;
use std::fmt;

use graphdb_domain::constants::mime;
use graphdb_domain::{Quad, Result, Term};

use crate::http::ByteStream;

/// One row of a SPARQL result set
pub type Binding = BTreeMap<String, Term>;

/// Output of a [`ContentParser`]
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    Term(Term),
    Terms(Vec<Term>),
    Quads(Vec<Quad>),
    Bindings(Vec<Binding>),
    Boolean(bool),
    Raw(String),
}

/// Options handed to a parser together with the content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Normalized MIME type of the content
    pub content_type: String,
    pub base_uri: Option<String>,
}

/// Parser for one response MIME type
pub trait ContentParser: Send + Sync {
    /// MIME type this parser handles
    fn supported_type(&self) -> &str;

    /// Streaming parsers receive the raw byte stream instead of a buffered
    /// body
    fn is_streaming(&self) -> bool {
        false
    }

    /// # Errors
    /// Returns `GraphDbError::Parse` for malformed content.
    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParsedContent>;
}

/// Converts between string-encoded and typed RDF terms and serializes
/// statements for upload
pub trait TermConverter: Send + Sync {
    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for values that cannot be a
    /// subject.
    fn to_subject(&self, raw: &str) -> Result<Term>;

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for non-IRI values.
    fn to_predicate(&self, raw: &str) -> Result<Term>;

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for unparseable values.
    fn to_object(&self, raw: &str) -> Result<Term>;

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for values that cannot name a
    /// graph.
    fn to_context(&self, raw: &str) -> Result<Term>;

    /// Encode one term the way protocol parameters expect it
    fn encode(&self, term: &Term) -> String;

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for statements that cannot be
    /// serialized.
    fn serialize(&self, quads: &[Quad]) -> Result<String>;

    /// MIME type of [`TermConverter::serialize`] output
    fn content_type(&self) -> &str {
        mime::N_QUADS
    }
}

/// Result of a read: parsed when a parser was registered for the response
/// type, streamed for streaming parsers, plain text otherwise
pub enum QueryResult {
    Parsed(ParsedContent),
    Text { content_type: String, body: String },
    Stream { content_type: String, stream: ByteStream },
}

impl QueryResult {
    pub fn parsed(&self) -> Option<&ParsedContent> {
        match self {
            Self::Parsed(content) => Some(content),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            Self::Stream { stream, .. } => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(content) => f.debug_tuple("Parsed").field(content).finish(),
            Self::Text { content_type, body } => f
                .debug_struct("Text")
                .field("content_type", content_type)
                .field("len", &body.len())
                .finish(),
            Self::Stream { content_type, .. } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}
