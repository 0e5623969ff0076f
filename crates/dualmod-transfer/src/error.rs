//! Error types for response model construction.

use thiserror::Error;

/// Error type for display response models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    /// A model parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for response models.
pub type TransferResult<T> = Result<T, TransferError>;
