//! Error types for PSF models and display algorithms.

use dualmod_core::CoreError;
use dualmod_transfer::TransferError;
use thiserror::Error;

/// Error type for model and algorithm operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Image buffer or convolution failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Response model failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Result type for model and algorithm operations.
pub type OpsResult<T> = Result<T, OpsError>;
