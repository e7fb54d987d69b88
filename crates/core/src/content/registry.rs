//! Parser registry keyed by MIME type

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use graphdb_domain::constants::mime;
use graphdb_domain::Result;

use super::ports::{ContentParser, ParseOptions, ParsedContent};
use super::sparql::SparqlJsonParser;
use crate::http::normalize_mime;

/// Hands content through unchanged as [`ParsedContent::Raw`].
///
/// Registered as streaming, it makes reads of its MIME type return the
/// response as a byte stream.
#[derive(Debug, Clone)]
pub struct RawParser {
    content_type: String,
    streaming: bool,
}

impl RawParser {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self { content_type: normalize_mime(&content_type.into()), streaming: false }
    }

    pub fn streaming(content_type: impl Into<String>) -> Self {
        Self { streaming: true, ..Self::new(content_type) }
    }
}

impl ContentParser for RawParser {
    fn supported_type(&self) -> &str {
        &self.content_type
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParsedContent> {
        Ok(ParsedContent::Raw(content.to_string()))
    }
}

/// Parsers by normalized MIME type. Registering a second parser for a type
/// replaces the first.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn ContentParser>>,
}

impl ParserRegistry {
    /// Empty registry; every read returns plain text
    pub fn new() -> Self {
        Self::default()
    }

    /// SPARQL JSON results and plain text
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SparqlJsonParser));
        registry.register(Arc::new(RawParser::new(mime::TEXT_PLAIN)));
        registry
    }

    pub fn register(&mut self, parser: Arc<dyn ContentParser>) {
        self.parsers.insert(normalize_mime(parser.supported_type()), parser);
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.register(parser);
        self
    }

    /// Parser for a MIME type; parameters such as `charset` are ignored
    pub fn get(&self, content_type: &str) -> Option<Arc<dyn ContentParser>> {
        self.parsers.get(&normalize_mime(content_type)).cloned()
    }

    pub fn is_streaming(&self, content_type: &str) -> bool {
        self.get(content_type).is_some_and(|parser| parser.is_streaming())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.parsers.keys().collect();
        types.sort();
        f.debug_struct("ParserRegistry").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_parameters() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.get("Application/SPARQL-Results+JSON; charset=utf-8").is_some());
        assert!(registry.get("text/turtle").is_none());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = ParserRegistry::new()
            .with_parser(Arc::new(RawParser::new("text/turtle")))
            .with_parser(Arc::new(RawParser::streaming("text/turtle")));

        assert_eq!(registry.len(), 1);
        assert!(registry.is_streaming("text/turtle"));
    }

    #[test]
    fn raw_parser_returns_content_unchanged() {
        let parser = RawParser::new("text/plain");
        let parsed = parser.parse("42", &ParseOptions::default()).unwrap();
        assert_eq!(parsed, ParsedContent::Raw("42".into()));
    }
}
