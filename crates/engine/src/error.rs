//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the operation processor and the recovery scanner.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No record exists for the given operation id.
    #[error("operation '{0}' not found")]
    OperationNotFound(String),

    /// The persisted step ordinal has no registered handler.  Fatal to the
    /// operation; never retried automatically.
    #[error("operation '{id}': unknown step ordinal {step}")]
    UnknownStep { id: String, step: i32 },

    /// A step handler failed; the operation has been marked `FAILED`.
    #[error("step {step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: users::ClientError,
    },

    /// The step loop hit its transition bound without reaching a terminal
    /// step.  Points at a cyclic or misconfigured sequence.
    #[error("operation '{id}' exceeded {limit} step transitions")]
    TransitionLimit { id: String, limit: usize },

    /// Persistence error from the store crate.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}
