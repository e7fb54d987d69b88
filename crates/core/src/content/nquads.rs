//! N-Triples term encoding and N-Quads serialization

use graphdb_domain::{GraphDbError, Quad, Result, Term};

/// Term converter using N-Triples syntax for single terms.
///
/// Accepts `<http://iri>`, bare absolute IRIs, `_:label` blank nodes and
/// `"lexical"`, `"lexical"@lang`, `"lexical"^^<datatype>` literals. Any other
/// object value becomes a plain literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NQuadsConverter;

impl NQuadsConverter {
    pub fn new() -> Self {
        Self
    }
}

fn invalid(role: &str, raw: &str) -> GraphDbError {
    GraphDbError::InvalidInput(format!("'{raw}' is not a valid {role}"))
}

fn parse_resource(raw: &str) -> Option<Term> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        return (!inner.is_empty()).then(|| Term::iri(inner));
    }
    if let Some(label) = raw.strip_prefix("_:") {
        return (!label.is_empty()).then(|| Term::blank(label));
    }
    let looks_like_iri = raw.contains(':')
        && !raw.starts_with('"')
        && !raw.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"'));
    looks_like_iri.then(|| Term::iri(raw))
}

fn parse_literal(raw: &str) -> Result<Term> {
    let Some(rest) = raw.strip_prefix('"') else {
        return Ok(Term::literal(raw));
    };
    let close = rest.rfind('"').ok_or_else(|| invalid("literal", raw))?;
    let value = unescape(&rest[..close]);
    let suffix = &rest[close + 1..];

    if suffix.is_empty() {
        Ok(Term::literal(value))
    } else if let Some(language) = suffix.strip_prefix('@') {
        Ok(Term::lang_literal(value, language))
    } else if let Some(datatype) =
        suffix.strip_prefix("^^<").and_then(|dt| dt.strip_suffix('>'))
    {
        Ok(Term::typed_literal(value, datatype))
    } else {
        Err(invalid("literal", raw))
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl super::TermConverter for NQuadsConverter {
    fn to_subject(&self, raw: &str) -> Result<Term> {
        parse_resource(raw).ok_or_else(|| invalid("subject", raw))
    }

    fn to_predicate(&self, raw: &str) -> Result<Term> {
        parse_resource(raw).filter(Term::is_iri).ok_or_else(|| invalid("predicate", raw))
    }

    fn to_object(&self, raw: &str) -> Result<Term> {
        match parse_resource(raw) {
            Some(term) => Ok(term),
            None => parse_literal(raw.trim()),
        }
    }

    fn to_context(&self, raw: &str) -> Result<Term> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Term::DefaultGraph);
        }
        parse_resource(trimmed).ok_or_else(|| invalid("context", raw))
    }

    /// The default graph encodes as `null`, the protocol's name for it in
    /// `context` parameters.
    fn encode(&self, term: &Term) -> String {
        match term {
            Term::Iri { value } => format!("<{value}>"),
            Term::BlankNode { value } => format!("_:{value}"),
            Term::Literal { value, datatype, language } => {
                let mut encoded = format!("\"{}\"", escape(value));
                if let Some(language) = language {
                    encoded.push('@');
                    encoded.push_str(language);
                } else if let Some(datatype) = datatype {
                    encoded.push_str(&format!("^^<{datatype}>"));
                }
                encoded
            }
            Term::DefaultGraph => "null".to_string(),
        }
    }

    fn serialize(&self, quads: &[Quad]) -> Result<String> {
        let mut out = String::new();
        for quad in quads {
            if !(quad.subject.is_iri() || quad.subject.is_blank()) {
                return Err(invalid("subject", quad.subject.value()));
            }
            if !quad.predicate.is_iri() {
                return Err(invalid("predicate", quad.predicate.value()));
            }
            if quad.object == Term::DefaultGraph {
                return Err(invalid("object", "default graph"));
            }

            out.push_str(&self.encode(&quad.subject));
            out.push(' ');
            out.push_str(&self.encode(&quad.predicate));
            out.push(' ');
            out.push_str(&self.encode(&quad.object));
            match &quad.graph {
                Term::DefaultGraph => {}
                Term::Iri { .. } | Term::BlankNode { .. } => {
                    out.push(' ');
                    out.push_str(&self.encode(&quad.graph));
                }
                Term::Literal { value, .. } => return Err(invalid("graph", value)),
            }
            out.push_str(" .\n");
        }
        Ok(out)
    }
}
