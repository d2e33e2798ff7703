//! Orchestrator error types.

use thiserror::Error;

use crate::message::MessageError;

/// Errors returned to the caller of a submit operation.
///
/// Job failures after acceptance are never returned here; they are reported
/// to the consumer as `error` messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    /// The request was rejected before a job was started.
    #[error("Rejected request: {0}")]
    Rejected(#[from] MessageError),
}

impl OrchestratorError {
    /// Process id of the rejected request, when known.
    pub fn process_id(&self) -> Option<&str> {
        match self {
            OrchestratorError::Rejected(e) => e.process_id(),
        }
    }
}
