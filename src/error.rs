use thiserror::Error;

use crate::tracker::TrackerStatus;

/// A malformed sample. The offending frame is dropped; nothing is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample has an empty class name")]
    EmptyClassName,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("frame carried no class scores")]
    EmptyFrame,
}

/// An operation attempted in a state that does not allow it.
///
/// Frame delivery cannot be perfectly synchronized with lifecycle commands,
/// so callers treat these as no-ops rather than failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} is not valid while {status:?}")]
pub struct StateError {
    pub operation: &'static str,
    pub status: TrackerStatus,
}

impl StateError {
    pub fn new(operation: &'static str, status: TrackerStatus) -> Self {
        Self { operation, status }
    }
}
