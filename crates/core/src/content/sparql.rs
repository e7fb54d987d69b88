//! SPARQL 1.1 query results in JSON (`application/sparql-results+json`)

use std::collections::BTreeMap;

use graphdb_domain::constants::mime;
use graphdb_domain::{GraphDbError, Result, Term};
use serde::Deserialize;

use super::ports::{Binding, ContentParser, ParseOptions, ParsedContent};

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    #[serde(default)]
    results: Option<ResultsBody>,
    #[serde(default)]
    boolean: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    bindings: Vec<BTreeMap<String, BoundValue>>,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(default, rename = "xml:lang")]
    language: Option<String>,
}

impl BoundValue {
    fn into_term(self) -> Result<Term> {
        match self.kind.as_str() {
            "uri" => Ok(Term::iri(self.value)),
            "bnode" => Ok(Term::blank(self.value)),
            "literal" | "typed-literal" => Ok(Term::Literal {
                value: self.value,
                datatype: self.datatype,
                language: self.language,
            }),
            other => Err(GraphDbError::Parse(format!("unsupported binding type '{other}'"))),
        }
    }
}

/// Parse a SELECT or ASK result document.
///
/// # Errors
/// Returns `GraphDbError::Parse` for invalid JSON or unknown term types.
pub fn parse_results(content: &[u8]) -> Result<ParsedContent> {
    let document: ResultsDocument = serde_json::from_slice(content)
        .map_err(|e| GraphDbError::Parse(format!("invalid SPARQL JSON results: {e}")))?;

    if let Some(answer) = document.boolean {
        return Ok(ParsedContent::Boolean(answer));
    }

    let rows = document
        .results
        .map(|body| body.bindings)
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(name, value)| Ok((name, value.into_term()?)))
                .collect::<Result<Binding>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedContent::Bindings(rows))
}

/// Rows of a SELECT result document
///
/// # Errors
/// Returns `GraphDbError::Parse` if the document is not a SELECT result.
pub fn parse_bindings(content: &[u8]) -> Result<Vec<Binding>> {
    match parse_results(content)? {
        ParsedContent::Bindings(rows) => Ok(rows),
        _ => Err(GraphDbError::Parse("expected SELECT results, got a boolean".into())),
    }
}

/// Values of one variable across all rows, skipping rows where it is unbound
pub fn column(rows: &[Binding], name: &str) -> Vec<Term> {
    rows.iter().filter_map(|row| row.get(name).cloned()).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SparqlJsonParser;

impl ContentParser for SparqlJsonParser {
    fn supported_type(&self) -> &str {
        mime::SPARQL_RESULTS_JSON
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParsedContent> {
        parse_results(content.as_bytes())
    }
}
