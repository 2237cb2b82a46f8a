//! Structured logging for graph/dataset operations via `tracing`.

use std::time::Instant;
use tracing::{debug, error, instrument};

/// Kind of operation being traced, for the `op` field on the emitted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Assert,
    Retract,
    Enumerate,
    IsTrue,
}

/// Run `f`, logging its outcome and latency at `debug`/`error` level.
#[instrument(level = "debug", skip(f))]
pub fn track_operation<F, T, E>(op_type: OperationType, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Debug,
{
    let start = Instant::now();
    let result = f();
    let latency_us = start.elapsed().as_micros();

    match &result {
        Ok(_) => debug!(op = ?op_type, latency_us, "operation completed"),
        Err(e) => error!(op = ?op_type, latency_us, error = ?e, "operation failed"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_operation_returns_the_inner_result() {
        let result = track_operation(OperationType::Assert, || -> Result<&str, &str> { Ok("ok") });
        assert_eq!(result, Ok("ok"));
    }

    #[test]
    fn track_operation_propagates_errors() {
        let result = track_operation(OperationType::Retract, || -> Result<(), &str> { Err("boom") });
        assert_eq!(result, Err("boom"));
    }
}
