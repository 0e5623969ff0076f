//! # dualmod-ops
//!
//! PSF models and display algorithms for dual-modulation HDR displays.
//!
//! # Modules
//!
//! - [`psf`] - Point-spread function models ([`GaussianPsf`])
//! - [`display`] - Display algorithms ([`ProjectorDisplay`])
//!
//! # Example
//!
//! ```rust
//! use dualmod_core::DenseImage;
//! use dualmod_ops::{GaussianPsf, HdrDisplay, ProjectorDisplay, ProjectorParams, PsfParams};
//! use dualmod_transfer::{GainOffsetGamma, ResponseParams};
//!
//! let hdr = DenseImage::filled(32, 32, 3, 1000.0).unwrap();
//!
//! let psf = GaussianPsf::new(PsfParams::from_sigma(8.0, hdr.channels())).unwrap();
//! let dlp = GainOffsetGamma::new(ResponseParams::DLP_DEFAULT).unwrap();
//! let lcd = GainOffsetGamma::new(ResponseParams::LCD_DEFAULT).unwrap();
//!
//! let display = ProjectorDisplay::new(ProjectorParams { psf: &psf, dlp: &dlp, lcd: &lcd });
//! let layers = display.process(&hdr).unwrap();
//! assert_eq!(layers.dlp.shape(), hdr.shape());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod display;
pub mod psf;

pub use display::{DisplayLayers, HdrDisplay, ProjectorDisplay, ProjectorParams};
pub use error::{OpsError, OpsResult};
pub use psf::{GaussianPsf, PsfModel, PsfParams};
