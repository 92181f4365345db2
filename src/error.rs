//! Error types for the detection-overlap library.

use crate::solver::SolverError;
use thiserror::Error;

/// Result type for detection-overlap operations.
pub type Result<T> = std::result::Result<T, OverlapError>;

/// Error types that can occur while matching two label maps.
#[derive(Error, Debug)]
pub enum OverlapError {
    /// An input precondition was violated (e.g. a multi-slice stack).
    #[error("Usage error: {0}")]
    UsageError(String),

    /// The ground truth and reconstruction maps differ in size.
    #[error(
        "Dimension mismatch: ground truth is {gt_width}x{gt_height}, \
         reconstruction is {rec_width}x{rec_height}"
    )]
    DimensionMismatch {
        gt_width: usize,
        gt_height: usize,
        rec_width: usize,
        rec_height: usize,
    },

    /// A label map could not be constructed from the given data.
    #[error("Invalid label map: {0}")]
    InvalidLabelMap(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A candidate pair refers to a label without region statistics.
    #[error("Missing region: {0}")]
    MissingRegion(String),

    /// The linear solver failed. Fatal to the run.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OverlapError {
    /// Whether this error reports a violated input precondition, as opposed
    /// to a failure while matching.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            OverlapError::UsageError(_)
                | OverlapError::DimensionMismatch { .. }
                | OverlapError::InvalidLabelMap(_)
        )
    }
}
