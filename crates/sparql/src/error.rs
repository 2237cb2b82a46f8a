//! SPARQL translation and evaluation errors.

/// Failure to parse, build, or evaluate a SPARQL query.
#[derive(Debug, thiserror::Error)]
pub enum SparqlError {
    /// The grammar engine could not match the query text.
    #[error("sparql syntax error: {0}")]
    Syntax(#[from] grammar::GrammarError),

    /// A term failed to parse (bad IRI, unregistered prefix, malformed literal).
    #[error("sparql term error: {0}")]
    Term(#[from] rdf_model::RdfError),

    /// The active dataset rejected a graph reference.
    #[error("sparql store error: {0}")]
    Store(#[from] store::StoreError),

    /// The query builder or executor rejected something the grammar itself
    /// cannot: an undeclared variable in SELECT, a malformed aggregate, a
    /// GROUP_CONCAT with no rows, and similar.
    #[error("sparql semantic error: {0}")]
    Semantic(String),
}

/// Result type for SPARQL operations.
pub type SparqlResult<T> = std::result::Result<T, SparqlError>;
