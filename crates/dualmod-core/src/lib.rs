//! # dualmod-core
//!
//! Core numeric types for dual-modulation HDR display simulation.
//!
//! This crate provides the foundation used throughout the workspace:
//!
//! - [`DenseImage`] - Owned `f64` image buffer with elementwise arithmetic,
//!   reductions and normalization
//! - [`DenseImage::convolve`] - Mirror-boundary 2-D convolution
//! - [`CoreError`] - Error type for all buffer and numeric-domain failures
//!
//! ## Crate Structure
//!
//! ```text
//! dualmod-core (this crate)
//!    ^
//!    |
//!    +-- dualmod-transfer (display response models)
//!    +-- dualmod-ops (PSF models, display algorithms)
//!    +-- dualmod-io (image decoding / encoding)
//!    +-- dualmod-cli
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Column-parallel convolution on the rayon pool (enabled by default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod convolve;
pub mod error;
pub mod image;

pub use convolve::mirror_index;
pub use error::{CoreError, Result};
pub use image::DenseImage;
