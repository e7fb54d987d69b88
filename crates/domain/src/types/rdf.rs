//! Minimal RDF term and quad model

use serde::{Deserialize, Serialize};

/// An RDF term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "termType", rename_all = "camelCase")]
pub enum Term {
    Iri { value: String },
    BlankNode { value: String },
    Literal { value: String, datatype: Option<String>, language: Option<String> },
    DefaultGraph,
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri { value: value.into() }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Self::BlankNode { value: value.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal { value: value.into(), datatype: None, language: None }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal { value: value.into(), datatype: Some(datatype.into()), language: None }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal { value: value.into(), datatype: None, language: Some(language.into()) }
    }

    /// Lexical value; empty for the default graph.
    pub fn value(&self) -> &str {
        match self {
            Self::Iri { value } | Self::BlankNode { value } | Self::Literal { value, .. } => value,
            Self::DefaultGraph => "",
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::BlankNode { .. })
    }
}

/// A statement with an optional named graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self { subject, predicate, object, graph }
    }

    /// A triple in the default graph
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self::new(subject, predicate, object, Term::DefaultGraph)
    }
}

/// A prefix-to-namespace binding of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub prefix: String,
    pub namespace: String,
}
