//! The display response capability.
//!
//! A response model maps between a normalized drive value ("luma") and
//! the physical light a display layer emits or transmits ("luminance").
//! Implementors supply the two scalar maps; the image-wide versions are
//! provided.

use dualmod_core::DenseImage;

/// A display response model and its inverse.
///
/// The trait is object-safe so algorithms can borrow models as
/// `&dyn ResponseModel`.
///
/// # Example
///
/// ```rust
/// use dualmod_core::DenseImage;
/// use dualmod_transfer::{GainOffsetGamma, ResponseModel, ResponseParams};
///
/// let gog = GainOffsetGamma::new(ResponseParams::new(4.0, 0.0, 1.0)).unwrap();
/// let drive = DenseImage::filled(2, 2, 1, 0.5).unwrap();
/// let light = gog.luminance(&drive);
/// assert_eq!(light.get(0, 0, 0), 2.0);
/// assert_eq!(gog.luma(&light).get(0, 0, 0), 0.5);
/// ```
pub trait ResponseModel {
    /// Forward model: drive value to emitted luminance.
    fn luminance_value(&self, drive: f64) -> f64;

    /// Inverse model: luminance to drive value, saturated to `[0, 1]`.
    fn luma_value(&self, luminance: f64) -> f64;

    /// Applies [`luminance_value`](Self::luminance_value) to every sample.
    fn luminance(&self, image: &DenseImage) -> DenseImage {
        image.map(|v| self.luminance_value(v))
    }

    /// Applies [`luma_value`](Self::luma_value) to every sample.
    fn luma(&self, image: &DenseImage) -> DenseImage {
        image.map(|v| self.luma_value(v))
    }
}

/// Saturates `v` into `[0, 1]`: first at least 0, then at most 1.
///
/// NaN maps to 0 and `+inf` to 1, so the result is always finite.
#[inline]
pub fn saturate(v: f64) -> f64 {
    v.max(0.0).min(1.0)
}
