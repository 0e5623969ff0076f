//! Dense multi-channel image buffer.
//!
//! [`DenseImage`] owns a rectangular grid of per-pixel vectors stored as
//! one flat `Vec<f64>`. It provides elementwise arithmetic, global
//! reductions and normalization; mirrored convolution lives in
//! [`crate::convolve`].
//!
//! # Memory Layout
//!
//! Pixels are addressed as `(i, j)` with `i` the **width** coordinate and
//! `j` the **height** coordinate. The width index is the outer stride:
//!
//! ```text
//! slot(i, j) = i * height + j
//!
//! Memory: [c0 c1 c2 | c0 c1 c2 | ...]  <- column i = 0, j = 0..height
//!         [c0 c1 c2 | c0 c1 c2 | ...]  <- column i = 1
//!         ...
//! ```
//!
//! The channels of one pixel are contiguous, so sample `(i, j, c)` lives
//! at `slot(i, j) * channels + c`. Kernel centering in convolution and the
//! PSF generator both depend on this convention.
//!
//! # Usage
//!
//! ```rust
//! use dualmod_core::DenseImage;
//!
//! let mut img = DenseImage::new(4, 6, 3).unwrap();
//! img.set_pixel(5, 3, 2.0);
//! assert_eq!(img.pixel(5, 3), &[2.0, 2.0, 2.0]);
//!
//! let root = img.sqrt();
//! assert_eq!(root.get(5, 3, 1), 2.0f64.sqrt());
//! ```

use crate::{CoreError, Result};

/// Owned dense image of `f64` samples.
///
/// A value type: cloning copies the whole buffer. The invariant
/// `data.len() == height * width * channels` holds for every instance,
/// and all three dimensions are non-zero.
#[derive(Clone, PartialEq)]
pub struct DenseImage {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f64>,
}

impl DenseImage {
    /// Channel count used by [`with_default_channels`](Self::with_default_channels).
    pub const DEFAULT_CHANNELS: usize = 3;

    /// Creates a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] if any dimension is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dualmod_core::DenseImage;
    ///
    /// let img = DenseImage::new(768, 1024, 3).unwrap();
    /// assert_eq!(img.pixel_count(), 768 * 1024);
    /// assert!(DenseImage::new(0, 10, 3).is_err());
    /// ```
    pub fn new(height: usize, width: usize, channels: usize) -> Result<Self> {
        let len = Self::checked_len(height, width, channels)?;
        Ok(Self {
            height,
            width,
            channels,
            data: vec![0.0; len],
        })
    }

    /// Creates a zero-filled RGB image.
    pub fn with_default_channels(height: usize, width: usize) -> Result<Self> {
        Self::new(height, width, Self::DEFAULT_CHANNELS)
    }

    /// Creates an image from an existing sample buffer laid out as
    /// described in the [module docs](self).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BufferSize`] when `data.len()` is not
    /// `height * width * channels`, or [`CoreError::InvalidDimensions`]
    /// for zero dimensions.
    pub fn from_data(height: usize, width: usize, channels: usize, data: Vec<f64>) -> Result<Self> {
        let expected = Self::checked_len(height, width, channels)?;
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Creates an image with every sample set to `value`.
    pub fn filled(height: usize, width: usize, channels: usize, value: f64) -> Result<Self> {
        let len = Self::checked_len(height, width, channels)?;
        Ok(Self {
            height,
            width,
            channels,
            data: vec![value; len],
        })
    }

    /// Creates a zero-filled image with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Self {
            height: self.height,
            width: self.width,
            channels: self.channels,
            data: vec![0.0; self.data.len()],
        }
    }

    fn checked_len(height: usize, width: usize, channels: usize) -> Result<usize> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(CoreError::invalid_dimensions(height, width, channels));
        }
        height
            .checked_mul(width)
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| CoreError::invalid_dimensions(height, width, channels))
    }

    /// Returns the image height (number of `j` positions).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the image width (number of `i` positions).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(height, width)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Returns `(height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Returns the number of pixels (`height * width`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Returns the number of samples (`height * width * channels`).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw sample buffer for bulk arithmetic.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw sample buffer.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the image and returns its sample buffer.
    #[inline]
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(
            i < self.width && j < self.height,
            "pixel ({i}, {j}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        (i * self.height + j) * self.channels
    }

    /// Returns the channel vector of pixel `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of bounds.
    #[inline]
    pub fn pixel(&self, i: usize, j: usize) -> &[f64] {
        let offset = self.offset(i, j);
        &self.data[offset..offset + self.channels]
    }

    /// Returns the mutable channel vector of pixel `(i, j)`.
    #[inline]
    pub fn pixel_mut(&mut self, i: usize, j: usize) -> &mut [f64] {
        let offset = self.offset(i, j);
        let channels = self.channels;
        &mut self.data[offset..offset + channels]
    }

    /// Returns sample `c` of pixel `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, c: usize) -> f64 {
        debug_assert!(c < self.channels, "channel {c} out of range");
        self.data[self.offset(i, j) + c]
    }

    /// Sets sample `c` of pixel `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, c: usize, value: f64) {
        debug_assert!(c < self.channels, "channel {c} out of range");
        let offset = self.offset(i, j);
        self.data[offset + c] = value;
    }

    /// Broadcasts `value` to every channel of pixel `(i, j)`.
    #[inline]
    pub fn set_pixel(&mut self, i: usize, j: usize, value: f64) {
        self.pixel_mut(i, j).fill(value);
    }

    /// Returns `true` if `other` has the same height, width and channels.
    #[inline]
    pub fn same_shape(&self, other: &DenseImage) -> bool {
        self.shape() == other.shape()
    }

    /// Fails with [`CoreError::ShapeMismatch`] unless shapes agree.
    pub fn ensure_same_shape(&self, other: &DenseImage) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(CoreError::shape_mismatch(self.shape(), other.shape()))
        }
    }

    // ------------------------------------------------------------------
    // Elementwise arithmetic
    // ------------------------------------------------------------------

    /// Applies `f` to every sample, returning a new image.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            height: self.height,
            width: self.width,
            channels: self.channels,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Applies `f` to every sample in place.
    pub fn map_inplace<F>(&mut self, mut f: F)
    where
        F: FnMut(f64) -> f64,
    {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Combines two same-shaped images sample by sample.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the shapes differ.
    pub fn zip_map<F>(&self, other: &DenseImage, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.ensure_same_shape(other)?;
        Ok(Self {
            height: self.height,
            width: self.width,
            channels: self.channels,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Elementwise square root. Negative samples become NaN.
    pub fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }

    /// Elementwise power `v^exponent`.
    pub fn powf(&self, exponent: f64) -> Self {
        self.map(|v| v.powf(exponent))
    }

    /// Multiplies every sample by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        self.map_inplace(|v| v * factor);
    }

    /// Returns a copy with every sample multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Elementwise division `self / other`.
    ///
    /// Follows IEEE-754: a zero divisor yields `±inf`, and `0/0` yields NaN.
    pub fn divide(&self, other: &DenseImage) -> Result<Self> {
        self.zip_map(other, |a, b| a / b)
    }

    /// Elementwise product `self * other`.
    pub fn multiply(&self, other: &DenseImage) -> Result<Self> {
        self.zip_map(other, |a, b| a * b)
    }

    // ------------------------------------------------------------------
    // Reductions
    // ------------------------------------------------------------------

    /// Largest sample, ignoring NaN. `-inf` if every sample is NaN.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest sample, ignoring NaN. `+inf` if every sample is NaN.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Sum of all samples over all pixels and channels.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Number of samples that are NaN or infinite.
    pub fn count_non_finite(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }

    /// Divides every sample by the global maximum over all pixels and
    /// channels.
    ///
    /// Afterwards the largest sample is exactly `1.0` and all ratios
    /// between samples are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonPositiveMaximum`] when the maximum is not
    /// strictly positive; the buffer is left untouched in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dualmod_core::DenseImage;
    ///
    /// let mut img = DenseImage::from_data(1, 2, 1, vec![2.0, 8.0]).unwrap();
    /// img.normalize().unwrap();
    /// assert_eq!(img.data(), &[0.25, 1.0]);
    /// ```
    pub fn normalize(&mut self) -> Result<()> {
        let max = self.max();
        if !(max > 0.0) {
            return Err(CoreError::NonPositiveMaximum { max });
        }
        self.map_inplace(|v| v / max);
        Ok(())
    }
}

impl std::fmt::Debug for DenseImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseImage")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("channels", &self.channels)
            .finish()
    }
}
