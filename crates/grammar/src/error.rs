//! Grammar engine errors.

/// Failure to parse: a message containing up to the first 42 residual
/// characters of unconsumed input.
#[derive(Debug, thiserror::Error)]
#[error("parse failed: {message}")]
pub struct GrammarError {
    pub message: String,
}

impl GrammarError {
    pub(crate) fn at(residual: &str) -> Self {
        let truncated: String = residual.chars().take(42).collect();
        GrammarError {
            message: format!("unexpected input at: {truncated:?}"),
        }
    }
}
