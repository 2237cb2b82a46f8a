//! RDF term model: IRI, blank node, literal, variable.
//!
//! Terms own their `String` data rather than borrowing from an interning
//! arena — the store and SPARQL layers work with textual bindings, which
//! makes ownership simpler to reason about than lifetime-threading an
//! arena through every query. See `Resource`, the value type SPARQL
//! operators consume and produce, for the two extra states (`Error`,
//! `Empty`) beyond a plain `Term`.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod iri;
mod literal;
mod term;
mod vocab;

pub use iri::{resolve_relative, Iri};
pub use literal::{unescape_lexical, Literal};
pub use term::{BlankNode, Resource, Term, Variable};
pub use vocab::Vocabulary;

/// Errors that can occur when working with RDF data.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    /// Invalid IRI format, including an unresolvable relative reference.
    #[error("invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid literal format (bad escape sequence, unterminated quote).
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// Invalid blank node label.
    #[error("invalid blank node: {0}")]
    InvalidBlankNode(String),
}

/// Result type for RDF operations.
pub type Result<T> = std::result::Result<T, RdfError>;


