//! Turtle parsing errors.

/// Failure to parse or interpret a Turtle document.
#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    /// The grammar engine could not match the document.
    #[error("turtle syntax error: {0}")]
    Syntax(#[from] grammar::GrammarError),

    /// A term (IRI, literal, or blank node) failed to parse.
    #[error("turtle term error: {0}")]
    Term(#[from] rdf_model::RdfError),

    /// A directive or collection referenced something malformed that the
    /// grammar itself could not reject (e.g. an unregistered prefix).
    #[error("turtle semantic error: {0}")]
    Semantic(String),
}

/// Result type for Turtle operations.
pub type TurtleResult<T> = std::result::Result<T, TurtleError>;
