//! # dualmod-transfer
//!
//! Display response models for dual-modulation HDR displays.
//!
//! A response model converts between the normalized drive value sent to a
//! display layer ("luma", `[0, 1]`) and the light that layer produces
//! ("luminance", cd/m2 for an emitter, transmittance for an attenuator).
//!
//! # Terminology
//!
//! - **Luminance**: forward model, drive value -> physical light
//! - **Luma**: inverse model, physical light -> drive value, saturated to `[0, 1]`
//!
//! # Supported Models
//!
//! | Model | Parameters | Typical Use |
//! |-------|------------|-------------|
//! | [`GainOffsetGamma`] | peak, black, gamma | Projector and LCD layers |
//!
//! # Usage
//!
//! ```rust
//! use dualmod_transfer::{GainOffsetGamma, ResponseModel, ResponseParams};
//!
//! let lcd = GainOffsetGamma::new(ResponseParams::LCD_DEFAULT).unwrap();
//! let drive = lcd.luma_value(0.25);
//! assert!(drive > 0.0 && drive < 1.0);
//! ```
//!
//! # Dependencies
//!
//! - `dualmod-core` - [`DenseImage`](dualmod_core::DenseImage) for the image-wide maps
//!
//! # Used By
//!
//! - `dualmod-ops` - Display algorithms
//! - `dualmod-cli`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod gog;
pub mod response;

pub use error::{TransferError, TransferResult};
pub use gog::{GainOffsetGamma, ResponseParams};
pub use response::{ResponseModel, saturate};
