//! `Term`: the RDF node sum type, and `Resource`: `Term` widened with the
//! error/empty states SPARQL evaluation needs.

use std::collections::HashMap;
use std::fmt;

use crate::iri::{resolve_relative, Iri};
use crate::literal::{unescape_lexical, Literal};
use crate::RdfError;

/// A blank node, identified by a label unique within its parse/store scope.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct BlankNode(pub String);

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A SPARQL query variable (without the leading `?`/`$`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Variable(pub String);

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// An RDF term: the value a triple position or a bound variable can hold.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

impl Term {
    pub fn iri(value: impl AsRef<str>) -> Self {
        Term::Iri(Iri::from_absolute(value.as_ref()))
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(BlankNode(label.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(Variable(name.into()))
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Canonical lexical form used as a store key and for equality:
    /// `<iri>`, `_:label`, `"lex"...`, `?name`.
    pub fn canonical(&self) -> String {
        match self {
            Term::Iri(iri) => iri.canonical(),
            Term::Blank(b) => b.to_string(),
            Term::Literal(l) => l.canonical(),
            Term::Variable(v) => v.to_string(),
        }
    }

    /// Parse a single term out of Turtle/SPARQL surface syntax: an
    /// angle-bracketed or prefixed IRI, a `_:label` blank node, a quoted
    /// literal (with optional `@lang` or `^^datatype`), or a `?`/`$`
    /// variable. `namespaces` maps registered prefixes to their namespace
    /// IRIs; `base` resolves relative IRI references.
    pub fn parse(text: &str, namespaces: &HashMap<String, String>, base: &str) -> Result<Term, RdfError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RdfError::InvalidIri("empty term".to_string()));
        }
        let mut chars = text.chars();
        match chars.next().unwrap() {
            '<' => {
                let inner = text
                    .strip_prefix('<')
                    .and_then(|s| s.strip_suffix('>'))
                    .ok_or_else(|| RdfError::InvalidIri(format!("unterminated IRI: {text}")))?;
                let resolved = if inner.contains(':') {
                    inner.to_string()
                } else {
                    resolve_relative(inner, base)?
                };
                Ok(Term::Iri(Iri::from_absolute(&resolved)))
            }
            '"' | '\'' => parse_literal(text).map(Term::Literal),
            '_' if text.starts_with("_:") => Ok(Term::blank(&text[2..])),
            '?' | '$' => Ok(Term::variable(&text[1..])),
            _ => parse_prefixed_name(text, namespaces).map(Term::Iri),
        }
    }
}

fn parse_prefixed_name(text: &str, namespaces: &HashMap<String, String>) -> Result<Iri, RdfError> {
    let (prefix, local) = match text.find(':') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => return Err(RdfError::InvalidIri(format!("not an IRI or prefixed name: {text}"))),
    };
    let namespace = namespaces
        .get(prefix)
        .ok_or_else(|| RdfError::InvalidIri(format!("unregistered prefix: {prefix}")))?;
    let local_name = unescape_local_name(local);
    Ok(Iri::from_prefixed(prefix, namespace, &local_name))
}

/// Undo the `\`-escaping Turtle prefixed names use for reserved local-name
/// punctuation (`\.`, `\-`, `\~`, ...).
fn unescape_local_name(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn parse_literal(text: &str) -> Result<Literal, RdfError> {
    let quote = text.chars().next().unwrap();
    let close = find_unescaped_quote(&text[1..], quote)
        .ok_or_else(|| RdfError::InvalidLiteral(format!("unterminated literal: {text}")))?;
    let lexical = unescape_lexical(&text[1..1 + close])?;
    let rest = &text[1 + close + 1..];

    if let Some(lang) = rest.strip_prefix('@') {
        return Ok(Literal::lang_string(lexical, lang));
    }
    if let Some(dt) = rest.strip_prefix("^^") {
        let dt = dt.trim_start_matches('<').trim_end_matches('>');
        return Ok(Literal::typed(lexical, dt));
    }
    Ok(Literal::string(lexical))
}

fn find_unescaped_quote(s: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({})", self.canonical())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// The value type SPARQL operators and builtins consume and produce:
/// a `Term`, plus an in-band diagnostic `Error`, plus `Empty` (the
/// unbound/aggregate-seed marker).
#[derive(Clone, PartialEq, Debug)]
pub enum Resource {
    Term(Term),
    Error(String),
    Empty,
}

impl Resource {
    pub fn term(term: Term) -> Self {
        Resource::Term(term)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Resource::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resource::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Resource::Empty)
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            Resource::Term(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        self.as_term().and_then(Term::as_literal)
    }

    /// SPARQL effective boolean value (EBV), three-valued: `Some(bool)` for
    /// a definite truth value, `None` when the EBV is itself undefined
    /// (errors, IRIs, blank nodes, and unbound terms have no EBV).
    pub fn effective_boolean_value(&self) -> Option<bool> {
        match self {
            Resource::Term(Term::Literal(lit)) => {
                if let Some(b) = lit.as_bool() {
                    Some(b)
                } else if lit.is_numeric() {
                    lit.as_f64().map(|n| n != 0.0 && !n.is_nan())
                } else if lit.datatype.is_none() && lit.language.is_none() {
                    Some(!lit.lexical_form.is_empty())
                } else if lit.language.is_some() {
                    Some(!lit.lexical_form.is_empty())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Term(t) => write!(f, "{}", t),
            Resource::Error(msg) => write!(f, "Error({msg})"),
            Resource::Empty => write!(f, "Empty"),
        }
    }
}

impl From<Term> for Resource {
    fn from(term: Term) -> Self {
        Resource::Term(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("ex".to_string(), "http://example.org/".to_string());
        m
    }

    #[test]
    fn parse_angle_bracketed_iri() {
        let t = Term::parse("<http://example.org/x>", &ns(), "http://example.org/").unwrap();
        assert_eq!(t.canonical(), "<http://example.org/x>");
    }

    #[test]
    fn parse_prefixed_name() {
        let t = Term::parse("ex:x", &ns(), "http://example.org/").unwrap();
        assert_eq!(t.canonical(), "<http://example.org/x>");
    }

    #[test]
    fn parse_blank_node() {
        let t = Term::parse("_:b0", &ns(), "http://example.org/").unwrap();
        assert!(t.is_blank());
        assert_eq!(t.canonical(), "_:b0");
    }

    #[test]
    fn parse_variable() {
        let t = Term::parse("?x", &ns(), "http://example.org/").unwrap();
        assert!(t.is_variable());
    }

    #[test]
    fn parse_typed_literal() {
        let t = Term::parse("\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>", &ns(), "http://example.org/").unwrap();
        let lit = t.as_literal().unwrap();
        assert_eq!(lit.lexical_form, "42");
        assert_eq!(lit.datatype.as_deref(), Some("http://www.w3.org/2001/XMLSchema#integer"));
    }

    #[test]
    fn parse_lang_literal() {
        let t = Term::parse("\"chat\"@fr", &ns(), "http://example.org/").unwrap();
        let lit = t.as_literal().unwrap();
        assert_eq!(lit.language.as_deref(), Some("fr"));
    }

    #[test]
    fn unregistered_prefix_is_error() {
        assert!(Term::parse("unknown:x", &ns(), "http://example.org/").is_err());
    }

    #[test]
    fn ebv_of_true_boolean_literal() {
        let r = Resource::term(Term::Literal(Literal::boolean(true)));
        assert_eq!(r.effective_boolean_value(), Some(true));
    }

    #[test]
    fn ebv_of_iri_is_undefined() {
        let r = Resource::term(Term::iri("http://example.org/x"));
        assert_eq!(r.effective_boolean_value(), None);
    }

    #[test]
    fn ebv_of_zero_is_false() {
        let r = Resource::term(Term::Literal(Literal::integer(0)));
        assert_eq!(r.effective_boolean_value(), Some(false));
    }

    #[test]
    fn ebv_of_empty_string_is_false() {
        let r = Resource::term(Term::Literal(Literal::string("")));
        assert_eq!(r.effective_boolean_value(), Some(false));
    }
}


