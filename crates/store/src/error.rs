//! Store error type.

/// Errors raised by the key collection, index, graph, and dataset layers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A pattern referenced an unknown named graph.
    #[error("no such graph: {0}")]
    NoSuchGraph(String),

    /// A malformed triple pattern (e.g. an object-only constraint with no
    /// subject or predicate bound on an index that requires it).
    #[error("malformed pattern: {0}")]
    MalformedPattern(String),

    /// Propagated from the underlying ordered key collection.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
