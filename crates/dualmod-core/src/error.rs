//! Error types for dualmod-core operations.
//!
//! The [`CoreError`] enum covers every failure mode of the dense image
//! buffer:
//! - Construction with invalid dimensions or a mismatched buffer
//! - Shape mismatches between elementwise operands
//! - Degenerate normalization (non-positive maximum)
//! - Malformed convolution kernels
//!
//! # Usage
//!
//! ```rust
//! use dualmod_core::{CoreError, DenseImage, Result};
//!
//! fn check(img: &DenseImage, kernel: &DenseImage) -> Result<()> {
//!     if kernel.width() > img.width() {
//!         return Err(CoreError::kernel_too_large(
//!             kernel.dimensions(),
//!             img.dimensions(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias using [`CoreError`] as the error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur during dense image operations.
///
/// # Categories
///
/// - **Construction**: [`InvalidDimensions`](CoreError::InvalidDimensions),
///   [`BufferSize`](CoreError::BufferSize)
/// - **Operand shape**: [`ShapeMismatch`](CoreError::ShapeMismatch),
///   [`ChannelMismatch`](CoreError::ChannelMismatch)
/// - **Numeric domain**: [`NonPositiveMaximum`](CoreError::NonPositiveMaximum),
///   [`KernelTooLarge`](CoreError::KernelTooLarge)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// One of height, width or channels is zero.
    #[error("invalid dimensions: {height}x{width}x{channels} (all must be > 0)")]
    InvalidDimensions {
        /// Requested height
        height: usize,
        /// Requested width
        width: usize,
        /// Requested channel count
        channels: usize,
    },

    /// Supplied buffer length does not match `height * width * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSize {
        /// Expected sample count
        expected: usize,
        /// Actual sample count
        got: usize,
    },

    /// Two images used together in an elementwise operation differ in shape.
    ///
    /// Shapes are reported as `(height, width, channels)`.
    #[error("shape mismatch: {a:?} vs {b:?}")]
    ShapeMismatch {
        /// Shape of the left operand
        a: (usize, usize, usize),
        /// Shape of the right operand
        b: (usize, usize, usize),
    },

    /// Kernel channel count is neither 1 nor the image channel count.
    #[error("channel mismatch: image has {expected} channels, kernel has {got}")]
    ChannelMismatch {
        /// Image channel count
        expected: usize,
        /// Kernel channel count
        got: usize,
    },

    /// Convolution kernel exceeds the image on at least one axis.
    ///
    /// Sizes are reported as `(height, width)`.
    #[error("kernel {kernel:?} is larger than image {image:?}")]
    KernelTooLarge {
        /// Kernel (height, width)
        kernel: (usize, usize),
        /// Image (height, width)
        image: (usize, usize),
    },

    /// `normalize` found no strictly positive maximum.
    #[error("cannot normalize: maximum element is {max}")]
    NonPositiveMaximum {
        /// The offending maximum (`-inf` when the buffer holds only NaN)
        max: f64,
    },
}

impl CoreError {
    /// Creates a [`CoreError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(height: usize, width: usize, channels: usize) -> Self {
        Self::InvalidDimensions {
            height,
            width,
            channels,
        }
    }

    /// Creates a [`CoreError::ShapeMismatch`] error.
    #[inline]
    pub fn shape_mismatch(a: (usize, usize, usize), b: (usize, usize, usize)) -> Self {
        Self::ShapeMismatch { a, b }
    }

    /// Creates a [`CoreError::KernelTooLarge`] error.
    #[inline]
    pub fn kernel_too_large(kernel: (usize, usize), image: (usize, usize)) -> Self {
        Self::KernelTooLarge { kernel, image }
    }

    /// Returns `true` for errors raised by numeric domain checks.
    #[inline]
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            Self::NonPositiveMaximum { .. } | Self::KernelTooLarge { .. }
        )
    }
}
