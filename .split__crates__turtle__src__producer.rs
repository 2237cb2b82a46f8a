//! The producer object driven by Turtle's grammar actions: a stack-based
//! state machine mirroring the nesting of subjects/predicates through
//! blank-node property lists and collections.

use std::collections::HashMap;

use rdf_model::{Literal, Term, Vocabulary};

use crate::error::{TurtleError, TurtleResult};

/// Semantic-action target for a Turtle parse. Accumulates triples as the
/// grammar's deferred `Call` actions replay against it.
pub struct TurtleProducer {
    pub(crate) triples: Vec<[String; 3]>,
    pub(crate) prefixes: HashMap<String, String>,
    pub(crate) base: String,
    blank_seq: u64,
    subjects: Vec<String>,
    predicates: Vec<String>,
    pending: Option<String>,
    blank_stack: Vec<String>,
    collections: Vec<CollectionFrame>,
    error: Option<TurtleError>,
}

#[derive(Default)]
struct CollectionFrame {
    head: Option<String>,
    previous: Option<String>,
}

impl TurtleProducer {
    /// Creates a producer with the given base IRI (used to resolve
    /// relative IRI references).
    pub fn new(base: impl Into<String>) -> Self {
        TurtleProducer {
            triples: Vec::new(),
            prefixes: HashMap::new(),
            base: base.into(),
            blank_seq: 0,
            subjects: Vec::new(),
            predicates: Vec::new(),
            pending: None,
            blank_stack: Vec::new(),
            collections: Vec::new(),
            error: None,
        }
    }

    /// Consumes the producer, returning the accumulated triples or the
    /// first semantic error encountered while replaying actions.
    pub fn into_triples(self) -> TurtleResult<Vec<[String; 3]>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(self.triples)
    }

    fn fail(&mut self, err: TurtleError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn resolve_iri_ref(&self, bracketed: &str) -> TurtleResult<String> {
        let inner = bracketed.trim_start_matches('<').trim_end_matches('>');
        if inner.contains(':') {
            Ok(inner.to_string())
        } else {
            rdf_model::resolve_relative(inner, &self.base).map_err(TurtleError::Term)
        }
    }

    /// `_:b{n}`, unique within this producer's run.
    fn fresh_blank(&mut self) -> String {
        let id = self.blank_seq;
        self.blank_seq += 1;
        format!("_:b{id}")
    }

    // --- Directives ---

    pub(crate) fn set_prefix(&mut self, raw_prefix: &str, raw_iri: &str) {
        let name = raw_prefix.trim_end_matches(':').to_string();
        match self.resolve_iri_ref(raw_iri) {
            Ok(resolved) => {
                self.prefixes.insert(name, resolved);
            }
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn set_base(&mut self, raw_iri: &str) {
        match self.resolve_iri_ref(raw_iri) {
            Ok(resolved) => self.base = resolved,
            Err(err) => self.fail(err),
        }
    }

    // --- Subject / predicate frame management ---

    fn parse_term(&self, raw: &str) -> TurtleResult<Term> {
        Term::parse(raw, &self.prefixes, &self.base).map_err(TurtleError::Term)
    }

    pub(crate) fn push_subject_from_text(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(term) => {
                self.subjects.push(term.canonical());
                self.predicates.push(String::new());
            }
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn push_subject_from_pending(&mut self) {
        let value = self.pending.take().unwrap_or_default();
        self.subjects.push(value);
        self.predicates.push(String::new());
    }

    pub(crate) fn pop_subject(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
    }

    pub(crate) fn set_predicate_from_text(&mut self, raw: &str) {
        let result = if raw == "a" {
            Ok(Vocabulary::RDF_TYPE.to_string())
        } else {
            self.parse_term(raw).map(|t| t.canonical())
        };
        match result {
            Ok(canonical) => {
                if let Some(slot) = self.predicates.last_mut() {
                    *slot = strip_angle_brackets(&canonical);
                }
            }
            Err(err) => self.fail(err),
        }
    }

    fn emit(&mut self, object: String) {
        let subject = self.subjects.last().cloned().unwrap_or_default();
        let predicate = self.predicates.last().cloned().unwrap_or_default();
        if subject.is_empty() || predicate.is_empty() {
            self.fail(TurtleError::Semantic("object outside of a subject/predicate context".to_string()));
            return;
        }
        self.triples.push([subject, predicate, object]);
    }

    pub(crate) fn emit_object_from_text(&mut self, raw: &str) {
        match parse_object_literal_shorthand(raw).map(Ok).unwrap_or_else(|| self.parse_term(raw)) {
            Ok(term) => {
                let canonical = term.canonical();
                self.emit(canonical);
            }
            Err(err) => self.fail(err),
        }
    }

    /// Builds a literal from its raw quoted lexical form (single- or
    /// triple-quoted, with either `"` or `'`) plus an optional language
    /// tag or datatype IRI/prefixed-name text, and emits it as the
    /// current object. Handled here rather than via `Term::parse`, which
    /// only understands single-character quote delimiters.
    pub(crate) fn emit_literal_object(&mut self, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) {
        match self.build_literal(raw_with_quotes, lang, datatype) {
            Ok(term) => {
                let canonical = term.canonical();
                self.emit(canonical);
            }
            Err(err) => self.fail(err),
        }
    }

    fn build_literal(&self, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) -> TurtleResult<Term> {
        let inner = strip_quote_delimiters(raw_with_quotes)?;
        let lexical = rdf_model::unescape_lexical(inner).map_err(TurtleError::Term)?;
        if let Some(lang) = lang {
            return Ok(Term::Literal(Literal::lang_string(lexical, lang)));
        }
        if let Some(datatype_text) = datatype {
            let datatype_term = self.parse_term(datatype_text)?;
            let datatype_iri = match datatype_term {
                Term::Iri(iri) => iri.value(),
                _ => return Err(TurtleError::Semantic(format!("datatype is not an IRI: {datatype_text}"))),
            };
            return Ok(Term::Literal(Literal::typed(lexical, datatype_iri)));
        }
        Ok(Term::Literal(Literal::string(lexical)))
    }

    pub(crate) fn emit_object_from_pending(&mut self) {
        let value = self.pending.take().unwrap_or_default();
        self.emit(value);
    }

    // --- Blank-node property lists ---

    pub(crate) fn begin_blank_object(&mut self) {
        let blank = self.fresh_blank();
        self.blank_stack.push(blank.clone());
        self.subjects.push(blank);
        self.predicates.push(String::new());
    }

    pub(crate) fn end_blank_object(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
        // Deferred until now (rather than recorded in `begin_blank_object`)
        // so a nested property list's own begin/end pair can use `pending`
        // in between without clobbering ours: each holds its blank's
        // identity on `blank_stack` until its own list has fully closed.
        self.pending = self.blank_stack.pop();
    }

    // --- Collections ---

    pub(crate) fn begin_collection(&mut self) {
        self.collections.push(CollectionFrame::default());
    }

    pub(crate) fn begin_collection_item(&mut self) {
        let cell = self.fresh_blank();
        {
            let frame = self.collections.last_mut().expect("collection frame");
            if let Some(previous) = &frame.previous {
                let previous = previous.clone();
                self.triples.push([previous, Vocabulary::RDF_REST.to_string(), cell.clone()]);
            } else {
                frame.head = Some(cell.clone());
            }
        }
        self.collections.last_mut().expect("collection frame").previous = Some(cell.clone());
        self.subjects.push(cell);
        self.predicates.push(Vocabulary::RDF_FIRST.to_string());
    }

    pub(crate) fn end_collection_item(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
    }

    pub(crate) fn end_collection(&mut self) {
        let frame = self.collections.pop().expect("collection frame");
        match (frame.head, frame.previous) {
            (Some(head), Some(last)) => {
                self.triples.push([last, Vocabulary::RDF_REST.to_string(), Vocabulary::RDF_NIL.to_string()]);
                self.pending = Some(head);
            }
            _ => self.pending = Some(Vocabulary::RDF_NIL.to_string()),
        }
    }
}

fn strip_quote_delimiters(raw: &str) -> TurtleResult<&str> {
    for triple in ["\"\"\"", "'''"] {
        if raw.len() >= 6 && raw.starts_with(triple) && raw.ends_with(triple) {
            return Ok(&raw[3..raw.len() - 3]);
        }
    }
    for single in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(single) && raw.ends_with(single) {
            return Ok(&raw[1..raw.len() - 1]);
        }
    }
    Err(TurtleError::Semantic(format!("malformed string literal: {raw}")))
}

fn strip_angle_brackets(value: &str) -> String {
    if value.starts_with('<') && value.ends_with('>') {
        value.to_string()
    } else {
        format!("<{value}>")
    }
}

/// Recognizes Turtle's unquoted numeric and boolean object shorthand
/// (`42`, `-3.14`, `1.0e10`, `true`, `false`), which `Term::parse` itself
/// does not handle since it is Turtle-specific sugar, not part of the
/// general term grammar shared with SPARQL.
fn parse_object_literal_shorthand(raw: &str) -> Option<Term> {
    if raw == "true" || raw == "false" {
        return Some(Term::Literal(Literal::boolean(raw == "true")));
    }
    if is_integer_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_INTEGER)));
    }
    if is_decimal_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_DECIMAL)));
    }
    if is_double_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_DOUBLE)));
    }
    None
}

fn is_integer_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let Some((int_part, frac_part)) = body.split_once('.') else {
        return false;
    };
    !frac_part.is_empty()
        && frac_part.chars().all(|c| c.is_ascii_digit())
        && int_part.chars().all(|c| c.is_ascii_digit())
}

fn is_double_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let Some(e_pos) = body.find(['e', 'E']) else {
        return false;
    };
    let (mantissa, exponent) = body.split_at(e_pos);
    let exponent = &exponent[1..];
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if exponent.is_empty() || !exponent.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if mantissa.is_empty() {
        return false;
    }
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_integer_decimal_and_double_shorthand() {
        assert!(matches!(parse_object_literal_shorthand("42"), Some(Term::Literal(_))));
        assert!(matches!(parse_object_literal_shorthand("-3.14"), Some(Term::Literal(_))));
        assert!(matches!(parse_object_literal_shorthand("1.0e10"), Some(Term::Literal(_))));
        assert!(parse_object_literal_shorthand("abc").is_none());
    }

    #[test]
    fn recognizes_boolean_shorthand() {
        assert!(matches!(parse_object_literal_shorthand("true"), Some(Term::Literal(_))));
        assert!(matches!(parse_object_literal_shorthand("false"), Some(Term::Literal(_))));
    }
}


