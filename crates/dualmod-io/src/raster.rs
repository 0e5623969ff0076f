//! Interleaved row-major pixel buffer shared by the codecs.
//!
//! Codecs speak scanlines: `data[(y * width + x) * channels + c]`.
//! [`DenseImage`] stores the width index as the outer stride instead, so
//! conversion transposes the pixel grid while keeping each pixel's
//! channels together.

use crate::{IoError, IoResult};
use dualmod_core::DenseImage;

/// Decoded image in scanline order with samples in their native range.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Samples per pixel.
    pub channels: usize,
    /// `width * height * channels` samples, row-major, interleaved.
    pub data: Vec<f32>,
}

impl Raster {
    /// Creates a raster, checking the buffer length.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<f32>) -> IoResult<Self> {
        let expected = width as usize * height as usize * channels;
        if width == 0 || height == 0 || channels == 0 || data.len() != expected {
            return Err(IoError::InvalidFile(format!(
                "{width}x{height}x{channels} raster with {} samples",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Builds a raster from 8-bit samples.
    pub fn from_u8(width: u32, height: u32, channels: usize, data: &[u8]) -> IoResult<Self> {
        Self::new(width, height, channels, data.iter().map(|&v| v as f32).collect())
    }

    /// Builds a raster from 16-bit samples.
    pub fn from_u16(width: u32, height: u32, channels: usize, data: &[u16]) -> IoResult<Self> {
        Self::new(width, height, channels, data.iter().map(|&v| v as f32).collect())
    }

    /// Copies a [`DenseImage`] into scanline order.
    pub fn from_image(image: &DenseImage) -> IoResult<Self> {
        let (height, width, channels) = image.shape();
        let mut data = Vec::with_capacity(image.len());
        for y in 0..height {
            for x in 0..width {
                data.extend(image.pixel(x, y).iter().map(|&v| v as f32));
            }
        }
        Ok(Self {
            width: dimension(width)?,
            height: dimension(height)?,
            channels,
            data,
        })
    }

    /// Converts into a [`DenseImage`] with the same channel count.
    pub fn to_image(&self) -> IoResult<DenseImage> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut image = DenseImage::new(height, width, self.channels)?;
        for (idx, px) in self.data.chunks_exact(self.channels).enumerate() {
            let (y, x) = (idx / width, idx % width);
            for (dst, &src) in image.pixel_mut(x, y).iter_mut().zip(px) {
                *dst = src as f64;
            }
        }
        Ok(image)
    }

    /// Quantises to `u8` by rounding and saturating to `[0, 255]`. NaN becomes 0.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| quantize_u8(v)).collect()
    }

    /// Returns a 3-channel copy: grey is replicated, alpha is dropped.
    ///
    /// # Errors
    ///
    /// [`IoError::EncodeError`] for channel counts other than 1 to 4.
    pub fn to_rgb(&self) -> IoResult<Self> {
        let data = match self.channels {
            1 => self.data.iter().flat_map(|&g| [g, g, g]).collect(),
            2 => self
                .data
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0]])
                .collect(),
            3 => self.data.clone(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
                .collect(),
            n => {
                return Err(IoError::EncodeError(format!(
                    "unsupported channel count: {n}"
                )));
            }
        };
        Ok(Self {
            width: self.width,
            height: self.height,
            channels: 3,
            data,
        })
    }
}

#[inline]
fn quantize_u8(v: f32) -> u8 {
    // `as` saturates and maps NaN to 0
    v.round() as u8
}

fn dimension(v: usize) -> IoResult<u32> {
    u32::try_from(v).map_err(|_| IoError::EncodeError(format!("dimension {v} exceeds u32")))
}
