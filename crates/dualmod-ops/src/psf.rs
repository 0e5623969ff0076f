//! Point-spread function models.
//!
//! A PSF model produces the blur kernel describing how the projector
//! layer spreads a point of light. The display algorithm convolves the
//! projector drive image with this kernel.
//!
//! # Gaussian PSF
//!
//! For pixel `(i, j)` of a `height x width` kernel:
//!
//! ```text
//! xc = width / 2 - 1      (real division)
//! yc = height / 2 - 1
//! value = exp(-((i - xc)^2 + (j - yc)^2) / (2 * sigma^2))
//! ```
//!
//! The center sits one pixel below the geometric center on each axis.
//! The value is written to every channel and the whole buffer is then
//! divided by its total sum, so with `channels > 1` each channel slice
//! sums to `1 / channels` rather than 1.
//!
//! # Example
//!
//! ```rust
//! use dualmod_ops::psf::{GaussianPsf, PsfModel, PsfParams};
//!
//! let psf = GaussianPsf::new(PsfParams::new(5, 5, 3, 2.0)).unwrap();
//! let kernel = psf.generate().unwrap();
//! assert!((kernel.sum() - 1.0).abs() < 1e-12);
//! ```

use crate::{OpsError, OpsResult};
use dualmod_core::DenseImage;
use tracing::trace;

/// A PSF model capability.
///
/// Object-safe; display algorithms borrow models as `&dyn PsfModel`.
pub trait PsfModel {
    /// Generates the kernel image.
    fn generate(&self) -> OpsResult<DenseImage>;

    /// Number of channels of the generated kernel.
    fn channels(&self) -> usize;

    /// Kernel `(height, width)`, known without generating it.
    fn dimensions(&self) -> (usize, usize);
}

/// Gaussian PSF parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsfParams {
    /// Kernel height in pixels.
    pub height: usize,
    /// Kernel width in pixels.
    pub width: usize,
    /// Kernel channel count.
    pub channels: usize,
    /// Standard deviation in pixels.
    pub sigma: f64,
}

impl PsfParams {
    /// Default standard deviation in pixels.
    pub const DEFAULT_SIGMA: f64 = 8.0;

    /// Creates a parameter record without validation.
    pub const fn new(height: usize, width: usize, channels: usize, sigma: f64) -> Self {
        Self {
            height,
            width,
            channels,
            sigma,
        }
    }

    /// Square kernel of side `floor(sigma)`.
    pub fn from_sigma(sigma: f64, channels: usize) -> Self {
        let size = kernel_size(sigma);
        Self::new(size, size, channels, sigma)
    }

    /// Sets `sigma` and re-derives the kernel size from it.
    pub fn set_sigma(&mut self, sigma: f64) {
        let size = kernel_size(sigma);
        self.sigma = sigma;
        self.height = size;
        self.width = size;
    }

    /// Checks all dimensions are non-zero and `sigma` is finite and positive.
    pub fn validate(&self) -> OpsResult<()> {
        if self.height == 0 || self.width == 0 || self.channels == 0 {
            return Err(OpsError::InvalidParameter(format!(
                "psf dimensions must be > 0, got {}x{}x{}",
                self.height, self.width, self.channels
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(OpsError::InvalidParameter(format!(
                "psf sigma must be finite and > 0, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

impl Default for PsfParams {
    fn default() -> Self {
        Self::from_sigma(Self::DEFAULT_SIGMA, DenseImage::DEFAULT_CHANNELS)
    }
}

// Truncation toward zero; non-finite or negative sigma gives 0 and fails validation.
fn kernel_size(sigma: f64) -> usize {
    if sigma.is_finite() && sigma > 0.0 {
        sigma.floor() as usize
    } else {
        0
    }
}

/// Gaussian point-spread function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPsf {
    params: PsfParams,
}

impl GaussianPsf {
    /// Creates a Gaussian PSF after validating `params`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for zero dimensions or a
    /// non-positive / non-finite sigma.
    pub fn new(params: PsfParams) -> OpsResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the parameters.
    #[inline]
    pub fn params(&self) -> &PsfParams {
        &self.params
    }

    /// Replaces the parameters; on error the current ones are kept.
    pub fn set_params(&mut self, params: PsfParams) -> OpsResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}

impl PsfModel for GaussianPsf {
    fn generate(&self) -> OpsResult<DenseImage> {
        let PsfParams {
            height,
            width,
            channels,
            sigma,
        } = self.params;
        trace!(height, width, channels, sigma, "gaussian psf");

        let mut psf = DenseImage::new(height, width, channels)?;

        let xc = width as f64 / 2.0 - 1.0;
        let yc = height as f64 / 2.0 - 1.0;
        let sigma2_sq = 2.0 * sigma * sigma;

        for i in 0..width {
            for j in 0..height {
                let x = i as f64 - xc;
                let y = j as f64 - yc;
                psf.set_pixel(i, j, (-(x * x + y * y) / sigma2_sq).exp());
            }
        }

        let total = psf.sum();
        psf.map_inplace(|v| v / total);
        Ok(psf)
    }

    fn channels(&self) -> usize {
        self.params.channels
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.params.height, self.params.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn channel_sum(img: &DenseImage, c: usize) -> f64 {
        img.data().iter().skip(c).step_by(img.channels()).sum()
    }

    #[test]
    fn test_from_sigma_size() {
        let p = PsfParams::from_sigma(8.0, 3);
        assert_eq!((p.height, p.width, p.channels), (8, 8, 3));
        let p = PsfParams::from_sigma(2.9, 1);
        assert_eq!((p.height, p.width), (2, 2));
    }

    #[test]
    fn test_set_sigma_rederives_size() {
        let mut p = PsfParams::default();
        p.set_sigma(4.5);
        assert_eq!((p.height, p.width), (4, 4));
        assert_eq!(p.sigma, 4.5);
    }

    #[test]
    fn test_set_params_keeps_old_on_error() {
        let mut psf = GaussianPsf::new(PsfParams::default()).unwrap();
        assert!(psf.set_params(PsfParams::new(0, 4, 3, 2.0)).is_err());
        assert_eq!(*psf.params(), PsfParams::default());

        psf.set_params(PsfParams::from_sigma(3.0, 1)).unwrap();
        assert_eq!(psf.channels(), 1);
        assert_eq!(psf.generate().unwrap().shape(), (3, 3, 1));
    }

    #[test]
    fn test_dimensions_match_generated() {
        let psf = GaussianPsf::new(PsfParams::new(3, 5, 2, 1.5)).unwrap();
        assert_eq!(psf.dimensions(), (3, 5));
        assert_eq!(psf.generate().unwrap().dimensions(), psf.dimensions());
    }

    #[test]
    fn test_default_matches_cli() {
        let p = PsfParams::default();
        assert_eq!(p, PsfParams::new(8, 8, 3, 8.0));
    }

    #[test]
    fn test_invalid_params() {
        assert!(GaussianPsf::new(PsfParams::new(0, 5, 3, 2.0)).is_err());
        assert!(GaussianPsf::new(PsfParams::new(5, 5, 0, 2.0)).is_err());
        assert!(GaussianPsf::new(PsfParams::new(5, 5, 3, 0.0)).is_err());
        assert!(GaussianPsf::new(PsfParams::new(5, 5, 3, f64::NAN)).is_err());
        // floor(0.5) == 0
        assert!(GaussianPsf::new(PsfParams::from_sigma(0.5, 3)).is_err());
    }

    #[test]
    fn test_channel_slices_sum_to_reciprocal() {
        let psf = GaussianPsf::new(PsfParams::new(5, 5, 3, 2.0)).unwrap();
        let kernel = psf.generate().unwrap();
        assert_eq!(kernel.shape(), (5, 5, 3));
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        for c in 0..3 {
            assert_relative_eq!(channel_sum(&kernel, c), 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_channel_sums_to_one() {
        let kernel = GaussianPsf::new(PsfParams::new(7, 4, 1, 1.5))
            .unwrap()
            .generate()
            .unwrap();
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_peak_is_offset_center() {
        // 6x6: xc = yc = 2, so the peak is at (2, 2), not (3, 3) or (2.5, 2.5).
        let kernel = GaussianPsf::new(PsfParams::new(6, 6, 1, 1.0))
            .unwrap()
            .generate()
            .unwrap();
        let peak = kernel.get(2, 2, 0);
        assert_eq!(kernel.max(), peak);
        assert!(peak > kernel.get(3, 3, 0));
        assert_relative_eq!(kernel.get(1, 2, 0), kernel.get(3, 2, 0), epsilon = 1e-15);
    }

    #[test]
    fn test_channels_are_identical() {
        let kernel = GaussianPsf::new(PsfParams::new(4, 5, 3, 2.0))
            .unwrap()
            .generate()
            .unwrap();
        let p = kernel.pixel(1, 3);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn test_one_by_one_kernel() {
        let kernel = GaussianPsf::new(PsfParams::from_sigma(1.0, 1))
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(kernel.data(), &[1.0]);
    }
}
