//! Gain-Offset-Gamma (GOG) display response.
//!
//! Forward model (drive value `v` to luminance):
//!
//! ```text
//! L = (Lpeak - Lblack) * v^gamma + Lblack
//! ```
//!
//! Inverse model (luminance to drive value), saturated to `[0, 1]`:
//!
//! ```text
//! v = clamp(((L - Lblack) / (Lpeak - Lblack))^(1/gamma), 0, 1)
//! ```
//!
//! Reference: R. K. Mantiuk, "Perceptual display calibration", in
//! *Displays: Fundamentals and Applications*, 2nd ed., CRC Press, 2016,
//! section 1.3.
//!
//! # Range
//!
//! Luminance below `Lblack` has no real inverse (negative base under a
//! fractional power); such samples produce NaN before saturation and end
//! up as drive value 0.

use crate::response::saturate;
use crate::{ResponseModel, TransferError, TransferResult};

/// Parameters of the GOG model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseParams {
    /// Peak luminance `Lpeak` (cd/m2).
    pub peak: f64,
    /// Black level `Lblack` (cd/m2).
    pub black: f64,
    /// Gamma exponent.
    pub gamma: f64,
}

impl ResponseParams {
    /// Projector layer default: 5000 / 5 cd/m2, gamma 2.2.
    pub const DLP_DEFAULT: Self = Self {
        peak: 5000.0,
        black: 5.0,
        gamma: 2.2,
    };

    /// LCD attenuation layer default: transmittance 1 / 0.005, gamma 2.2.
    pub const LCD_DEFAULT: Self = Self {
        peak: 1.0,
        black: 0.005,
        gamma: 2.2,
    };

    /// Creates a parameter record without validation.
    pub const fn new(peak: f64, black: f64, gamma: f64) -> Self {
        Self { peak, black, gamma }
    }

    /// Checks `peak > black >= 0`, `gamma > 0`, all finite.
    pub fn validate(&self) -> TransferResult<()> {
        if !(self.peak.is_finite() && self.black.is_finite() && self.gamma.is_finite()) {
            return Err(TransferError::InvalidParameter(format!(
                "non-finite response parameters: {self:?}"
            )));
        }
        if self.black < 0.0 {
            return Err(TransferError::InvalidParameter(format!(
                "black luminance must be >= 0, got {}",
                self.black
            )));
        }
        if self.peak <= self.black {
            return Err(TransferError::InvalidParameter(format!(
                "peak luminance {} must exceed black luminance {}",
                self.peak, self.black
            )));
        }
        if self.gamma <= 0.0 {
            return Err(TransferError::InvalidParameter(format!(
                "gamma must be > 0, got {}",
                self.gamma
            )));
        }
        Ok(())
    }

    /// Luminance range `Lpeak - Lblack`.
    #[inline]
    pub fn range(&self) -> f64 {
        self.peak - self.black
    }

    /// Static contrast ratio `Lpeak / Lblack` (infinite for a zero black level).
    #[inline]
    pub fn contrast(&self) -> f64 {
        self.peak / self.black
    }
}

/// Defaults to [`ResponseParams::DLP_DEFAULT`].
impl Default for ResponseParams {
    fn default() -> Self {
        Self::DLP_DEFAULT
    }
}

/// Gain-Offset-Gamma response model.
///
/// # Example
///
/// ```rust
/// use dualmod_transfer::{GainOffsetGamma, ResponseModel, ResponseParams};
///
/// let dlp = GainOffsetGamma::new(ResponseParams::DLP_DEFAULT).unwrap();
/// assert_eq!(dlp.luminance_value(0.0), 5.0);
/// assert_eq!(dlp.luminance_value(1.0), 5000.0);
/// assert_eq!(dlp.luma_value(1.0e6), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainOffsetGamma {
    params: ResponseParams,
}

impl GainOffsetGamma {
    /// Creates a model after validating `params`.
    pub fn new(params: ResponseParams) -> TransferResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the model parameters.
    #[inline]
    pub fn params(&self) -> &ResponseParams {
        &self.params
    }

    /// Replaces the model parameters after validation.
    pub fn set_params(&mut self, params: ResponseParams) -> TransferResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}

impl ResponseModel for GainOffsetGamma {
    #[inline]
    fn luminance_value(&self, drive: f64) -> f64 {
        let p = &self.params;
        p.range() * drive.powf(p.gamma) + p.black
    }

    #[inline]
    fn luma_value(&self, luminance: f64) -> f64 {
        let p = &self.params;
        saturate(((luminance - p.black) / p.range()).powf(1.0 / p.gamma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dualmod_core::DenseImage;

    fn linear4() -> GainOffsetGamma {
        GainOffsetGamma::new(ResponseParams::new(4.0, 0.0, 1.0)).unwrap()
    }

    #[test]
    fn test_luminance_luma_sample() {
        let gog = linear4();
        assert_eq!(gog.luminance_value(0.5), 2.0);
        assert_eq!(gog.luma_value(2.0), 0.5);
    }

    #[test]
    fn test_inverse_on_open_interval() {
        let gog = GainOffsetGamma::new(ResponseParams::new(250.0, 0.5, 2.2)).unwrap();
        for i in 1..100 {
            let v = i as f64 / 100.0;
            let l = gog.luminance_value(v);
            assert!(l > 0.5 && l < 250.0);
            assert_relative_eq!(gog.luma_value(l), v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_luma_saturates() {
        let gog = GainOffsetGamma::new(ResponseParams::DLP_DEFAULT).unwrap();
        // Above peak
        assert_eq!(gog.luma_value(6000.0), 1.0);
        assert_eq!(gog.luma_value(f64::INFINITY), 1.0);
        // Below black: negative base -> NaN -> 0
        assert_eq!(gog.luma_value(1.0), 0.0);
        assert_eq!(gog.luma_value(f64::NAN), 0.0);
        // Exactly black
        assert_eq!(gog.luma_value(5.0), 0.0);
    }

    #[test]
    fn test_luma_image_is_not_constant() {
        let gog = linear4();
        let data = vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 8.0, 2.5];
        let img = DenseImage::from_data(2, 4, 1, data).unwrap();
        let out = gog.luma(&img);
        assert_eq!(out.data(), &[0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 0.625]);
    }

    #[test]
    fn test_luminance_image() {
        let gog = GainOffsetGamma::new(ResponseParams::new(101.0, 1.0, 2.0)).unwrap();
        let img = DenseImage::filled(2, 2, 3, 0.5).unwrap();
        let out = gog.luminance(&img);
        for &v in out.data() {
            assert_relative_eq!(v, 26.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_params() {
        assert!(GainOffsetGamma::new(ResponseParams::new(1.0, 1.0, 2.2)).is_err());
        assert!(GainOffsetGamma::new(ResponseParams::new(1.0, 2.0, 2.2)).is_err());
        assert!(GainOffsetGamma::new(ResponseParams::new(1.0, -0.1, 2.2)).is_err());
        assert!(GainOffsetGamma::new(ResponseParams::new(1.0, 0.0, 0.0)).is_err());
        assert!(GainOffsetGamma::new(ResponseParams::new(f64::NAN, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_set_params_validates() {
        let mut gog = linear4();
        assert!(gog.set_params(ResponseParams::new(0.0, 1.0, 1.0)).is_err());
        assert_eq!(gog.params().peak, 4.0);
        gog.set_params(ResponseParams::LCD_DEFAULT).unwrap();
        assert_eq!(gog.params().black, 0.005);
    }

    #[test]
    fn test_defaults() {
        assert!(ResponseParams::DLP_DEFAULT.validate().is_ok());
        assert!(ResponseParams::LCD_DEFAULT.validate().is_ok());
        assert_relative_eq!(ResponseParams::LCD_DEFAULT.contrast(), 200.0, epsilon = 1e-9);
    }
}
