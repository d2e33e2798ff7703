//! Error types for the culling stages.

use thiserror::Error;

use crate::geo::GeoError;

/// Errors that can occur while culling a candidate set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CullError {
    /// The viewport used to size the grid is not a valid rectangle.
    #[error("Invalid culling bounds: {0}")]
    InvalidBounds(GeoError),

    /// The focal point used for range culling is not a valid coordinate.
    #[error("Invalid focal point: {0}")]
    InvalidFocalPoint(GeoError),

    /// Range must be a finite, non-negative number of meters.
    #[error("Invalid range: {0} (must be a finite number of meters >= 0)")]
    InvalidRange(f64),

    /// The owning job was aborted while the stage was running.
    #[error("Culling cancelled")]
    Cancelled,
}

impl CullError {
    /// Returns true if this error only reflects cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CullError::Cancelled)
    }
}
