//! Hard error types shared across phases.

use thiserror::Error;

/// Invariant violation inside a compiler phase.
///
/// These are the "should not happen on valid input" failures: the semantic
/// analyzer guarantees the properties the later phases rely on, so a later
/// phase that still trips over its input reports an `InternalError` rather
/// than a user-facing diagnostic of its own.
#[derive(Debug, Error)]
pub enum InternalError {
    /// A RES lookup reached code generation with an index the analyzer
    /// should have rejected.
    #[error("result history index {requested} out of range (available: 1-{available})")]
    HistoryIndex { requested: usize, available: usize },

    /// A phase received a node shape its predecessor should never produce.
    #[error("malformed {phase} input: {detail}")]
    Malformed { phase: &'static str, detail: String },
}

impl InternalError {
    /// Convenience constructor for [`InternalError::Malformed`].
    pub fn malformed(phase: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            phase,
            detail: detail.into(),
        }
    }
}
