//! Dual-modulation display algorithms.
//!
//! A display algorithm splits one HDR image into the drive images of two
//! stacked modulators. The optical product of the two layers, each seen
//! through its response model, approximates the input radiance.
//!
//! # Projector-based display
//!
//! Seetzen et al., "High dynamic range display systems", ACM Trans.
//! Graph. 23(3), 2004, section 4:
//!
//! ```text
//! sqrt    = sqrt(hdr)
//! blurred = sqrt (*) psf
//! lcd_in  = hdr / blurred
//! dlp     = dlp_response.luma(sqrt)
//! lcd     = lcd_response.luma(lcd_in)
//! ```
//!
//! The square root balances dynamic range between the layers; dividing
//! by the blurred projector image lets the sharper LCD layer compensate
//! for the projector's optical blur.
//!
//! # Numeric policy
//!
//! Division follows IEEE-754. A zero in `blurred` turns into `+inf`
//! (or NaN for `0 / 0`); the number of such samples is logged at `warn`
//! level and `luma` saturates them to 1 and 0 respectively, so both
//! layers are always finite and within `[0, 1]`.

use crate::OpsResult;
use crate::psf::PsfModel;
use dualmod_core::{CoreError, DenseImage};
use dualmod_transfer::ResponseModel;
use tracing::{debug, debug_span, warn};

/// Drive images for the two modulation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLayers {
    /// Projector (DLP) drive image, values in `[0, 1]`.
    pub dlp: DenseImage,
    /// LCD attenuation drive image, values in `[0, 1]`.
    pub lcd: DenseImage,
}

/// A display algorithm capability.
pub trait HdrDisplay {
    /// Computes both layer drive images for `hdr`.
    fn process(&self, hdr: &DenseImage) -> OpsResult<DisplayLayers>;
}

/// Models used by [`ProjectorDisplay`].
///
/// The caller owns the models; the parameters only borrow them, so the
/// models outlive every `process` call made through them.
#[derive(Clone, Copy)]
pub struct ProjectorParams<'a> {
    /// Projector point-spread function.
    pub psf: &'a dyn PsfModel,
    /// Projector response.
    pub dlp: &'a dyn ResponseModel,
    /// LCD response.
    pub lcd: &'a dyn ResponseModel,
}

impl std::fmt::Debug for ProjectorParams<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorParams")
            .field("psf_channels", &self.psf.channels())
            .finish_non_exhaustive()
    }
}

/// Projector + LCD dual-modulation display.
///
/// # Example
///
/// ```rust
/// use dualmod_core::DenseImage;
/// use dualmod_ops::{GaussianPsf, HdrDisplay, ProjectorDisplay, ProjectorParams, PsfParams};
/// use dualmod_transfer::{GainOffsetGamma, ResponseParams};
///
/// let psf = GaussianPsf::new(PsfParams::from_sigma(3.0, 3)).unwrap();
/// let dlp = GainOffsetGamma::new(ResponseParams::DLP_DEFAULT).unwrap();
/// let lcd = GainOffsetGamma::new(ResponseParams::LCD_DEFAULT).unwrap();
/// let display = ProjectorDisplay::new(ProjectorParams { psf: &psf, dlp: &dlp, lcd: &lcd });
///
/// let hdr = DenseImage::filled(16, 16, 3, 400.0).unwrap();
/// let layers = display.process(&hdr).unwrap();
/// assert!(layers.dlp.data().iter().all(|v| (0.0..=1.0).contains(v)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProjectorDisplay<'a> {
    params: ProjectorParams<'a>,
}

impl<'a> ProjectorDisplay<'a> {
    /// Creates the algorithm over borrowed models.
    pub fn new(params: ProjectorParams<'a>) -> Self {
        Self { params }
    }

    /// Returns the borrowed models.
    pub fn params(&self) -> &ProjectorParams<'a> {
        &self.params
    }

    /// Replaces the borrowed models.
    pub fn set_params(&mut self, params: ProjectorParams<'a>) {
        self.params = params;
    }

    /// Recombines the layers optically: `dlp.luminance(dlp) * lcd.luminance(lcd)`.
    ///
    /// Where neither layer saturated, the result approximates the HDR
    /// input of [`process`](HdrDisplay::process).
    ///
    /// # Errors
    ///
    /// Shape mismatch between the two layers.
    pub fn reconstruct(&self, layers: &DisplayLayers) -> OpsResult<DenseImage> {
        let emitted = self.params.dlp.luminance(&layers.dlp);
        let transmitted = self.params.lcd.luminance(&layers.lcd);
        Ok(emitted.multiply(&transmitted)?)
    }
}

impl HdrDisplay for ProjectorDisplay<'_> {
    fn process(&self, hdr: &DenseImage) -> OpsResult<DisplayLayers> {
        let (height, width, channels) = hdr.shape();
        let _span = debug_span!("projector_display", height, width, channels).entered();

        // Reject before generating; the kernel grows with sigma squared.
        let kernel_dims = self.params.psf.dimensions();
        if kernel_dims.0 > height || kernel_dims.1 > width {
            return Err(CoreError::KernelTooLarge {
                kernel: kernel_dims,
                image: (height, width),
            }
            .into());
        }

        let sqrt = hdr.sqrt();

        let kernel = self.params.psf.generate()?;
        debug!(
            kernel_h = kernel.height(),
            kernel_w = kernel.width(),
            kernel_c = kernel.channels(),
            "psf generated"
        );
        let blurred = sqrt.convolve(&kernel)?;

        let corrected = hdr.divide(&blurred)?;
        let non_finite = corrected.count_non_finite();
        if non_finite > 0 {
            warn!(
                non_finite,
                total = corrected.len(),
                "non-finite samples after psf division, saturating"
            );
        }

        let dlp = self.params.dlp.luma(&sqrt);
        let lcd = self.params.lcd.luma(&corrected);
        debug!("layers computed");

        Ok(DisplayLayers { dlp, lcd })
    }
}
