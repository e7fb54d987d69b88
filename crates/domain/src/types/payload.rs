//! Request payloads for statement reads, queries and updates
//!
//! Payloads are plain data. `validate()` is called by the clients before any
//! request is built, so invalid payloads never reach the network.

use crate::constants::params;
use crate::errors::{GraphDbError, Result};

/// Statement pattern for `GET statements`. Terms are N-Triples encoded
/// (`<http://x>`, `_:b0`, `"lit"@en`); `None` is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetStatementsPayload {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
    pub contexts: Vec<String>,
    pub infer: Option<bool>,
    /// Requested RDF serialization, defaults to the client's RDF type
    pub response_type: Option<String>,
}

impl GetStatementsPayload {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(subject) = &self.subject {
            pairs.push((params::SUBJECT, subject.clone()));
        }
        if let Some(predicate) = &self.predicate {
            pairs.push((params::PREDICATE, predicate.clone()));
        }
        if let Some(object) = &self.object {
            pairs.push((params::OBJECT, object.clone()));
        }
        if let Some(infer) = self.infer {
            pairs.push((params::INFER, infer.to_string()));
        }
        pairs
    }
}

/// SPARQL query payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPayload {
    pub query: String,
    pub response_type: Option<String>,
    pub infer: Option<bool>,
    /// Server-side evaluation timeout in seconds
    pub timeout: Option<u32>,
    pub distinct: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Variable bindings, sent as `$name=value`
    pub bindings: Vec<(String, String)>,
}

impl QueryPayload {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_response_type(mut self, mime: impl Into<String>) -> Self {
        self.response_type = Some(mime.into());
        self
    }

    #[must_use]
    pub fn with_infer(mut self, infer: bool) -> Self {
        self.infer = Some(infer);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for a blank query or a zero limit.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(GraphDbError::InvalidInput("query must not be empty".into()));
        }
        if self.limit == Some(0) {
            return Err(GraphDbError::InvalidInput("limit must be greater than zero".into()));
        }
        Ok(())
    }

    /// Form fields, `query` first.
    pub fn form(&self) -> Vec<(String, String)> {
        let mut form = vec![(params::QUERY.to_string(), self.query.clone())];
        if let Some(infer) = self.infer {
            form.push((params::INFER.to_string(), infer.to_string()));
        }
        if let Some(timeout) = self.timeout {
            form.push((params::TIMEOUT.to_string(), timeout.to_string()));
        }
        if let Some(distinct) = self.distinct {
            form.push((params::DISTINCT.to_string(), distinct.to_string()));
        }
        if let Some(limit) = self.limit {
            form.push((params::LIMIT.to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            form.push((params::OFFSET.to_string(), offset.to_string()));
        }
        for (name, value) in &self.bindings {
            form.push((format!("${name}"), value.clone()));
        }
        form
    }
}

/// SPARQL update payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePayload {
    pub update: String,
    pub infer: Option<bool>,
    pub timeout: Option<u32>,
    pub base_uri: Option<String>,
}

impl UpdatePayload {
    pub fn new(update: impl Into<String>) -> Self {
        Self { update: update.into(), ..Self::default() }
    }

    /// # Errors
    /// Returns `GraphDbError::InvalidInput` for a blank update string.
    pub fn validate(&self) -> Result<()> {
        if self.update.trim().is_empty() {
            return Err(GraphDbError::InvalidInput("update must not be empty".into()));
        }
        Ok(())
    }

    pub fn form(&self) -> Vec<(String, String)> {
        let mut form = vec![(params::UPDATE.to_string(), self.update.clone())];
        if let Some(infer) = self.infer {
            form.push((params::INFER.to_string(), infer.to_string()));
        }
        if let Some(timeout) = self.timeout {
            form.push((params::TIMEOUT.to_string(), timeout.to_string()));
        }
        if let Some(base_uri) = &self.base_uri {
            form.push((params::BASE_URI.to_string(), base_uri.clone()));
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(QueryPayload::new("  ").validate(), Err(GraphDbError::InvalidInput(_))));
        assert!(matches!(
            QueryPayload::new("ASK {}").with_limit(0).validate(),
            Err(GraphDbError::InvalidInput(_))
        ));
        assert!(QueryPayload::new("ASK {}").validate().is_ok());
    }

    #[test]
    fn query_form_contains_bindings() {
        let mut payload = QueryPayload::new("SELECT * WHERE { ?s ?p ?o }").with_infer(false);
        payload.bindings.push(("s".into(), "<urn:x>".into()));

        let form = payload.form();
        assert_eq!(form[0], ("query".to_string(), "SELECT * WHERE { ?s ?p ?o }".to_string()));
        assert!(form.contains(&("infer".to_string(), "false".to_string())));
        assert!(form.contains(&("$s".to_string(), "<urn:x>".to_string())));
    }

    #[test]
    fn blank_update_is_rejected() {
        assert!(UpdatePayload::new("").validate().is_err());
        assert!(UpdatePayload::new("CLEAR ALL").validate().is_ok());
    }

    #[test]
    fn statement_pattern_params_skip_wildcards() {
        let payload = GetStatementsPayload {
            subject: Some("<urn:s>".into()),
            infer: Some(true),
            ..Default::default()
        };
        assert_eq!(
            payload.params(),
            vec![("subj", "<urn:s>".to_string()), ("infer", "true".to_string())]
        );
    }
}
