//! # dualmod-io
//!
//! Image file I/O for the dual-modulation simulator.
//!
//! | Format | Read | Write | Module |
//! |--------|------|-------|--------|
//! | PNG | 8/16-bit, grey/RGB, alpha, palette | 8-bit | [`png`] |
//! | JPEG | RGB, grey, CMYK | 8-bit RGB | [`jpeg`] |
//! | Radiance HDR | RGBE (flat, RLE) | RGBE RLE | [`hdr`] |
//!
//! Decoded samples keep their native range (`[0, 255]` for 8-bit files,
//! linear radiance for HDR) and the file's channel count. The 8-bit
//! writers round and saturate, so callers pass `[0, 255]` content.
//!
//! # Example
//!
//! ```rust,ignore
//! use dualmod_io::{read_image, write_image};
//!
//! // Load at native size
//! let hdr = read_image("memorial.hdr", 0, 0)?;
//!
//! // Load resized to 1024x768
//! let small = read_image("memorial.hdr", 768, 1024)?;
//! write_image(&small, "preview.png")?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod detect;
pub mod error;
pub mod raster;
pub mod resize;

#[cfg(feature = "hdr")]
pub mod hdr;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use raster::Raster;

use dualmod_core::DenseImage;
use std::path::Path;
use tracing::debug;

/// Output formats accepted on the command line.
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg"];

/// Returns `true` if `format` (case-insensitive) is in [`SUPPORTED_FORMATS`].
pub fn is_supported_format(format: &str) -> bool {
    SUPPORTED_FORMATS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(format))
}

/// Reads an image file, resizing if a target dimension is non-zero.
///
/// The format is detected from magic bytes, then from the extension. A
/// zero `target_height` or `target_width` keeps the decoded size on that
/// axis.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for unknown files; decoder errors
/// otherwise.
pub fn read_image<P: AsRef<Path>>(
    path: P,
    target_height: usize,
    target_width: usize,
) -> IoResult<DenseImage> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), ?format, "reading image");

    let raster = read_raster(path, format)?;
    let image = raster.to_image()?;

    if target_height == 0 && target_width == 0 {
        return Ok(image);
    }
    Ok(resize::resize_linear(&image, target_height, target_width)?)
}

fn read_raster(path: &Path, format: Format) -> IoResult<Raster> {
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),
        #[cfg(feature = "hdr")]
        Format::Hdr => hdr::read(path),
        _ => Err(IoError::UnsupportedFormat(format!(
            "cannot read {}",
            path.display()
        ))),
    }
}

/// Writes an image, choosing the encoder from the file extension.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for unknown extensions,
/// [`IoError::EncodeError`] for channel counts the encoder cannot store.
pub fn write_image<P: AsRef<Path>>(image: &DenseImage, path: P) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), ?format, shape = ?image.shape(), "writing image");

    let raster = Raster::from_image(image)?;
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, &raster),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write(path, &raster),
        #[cfg(feature = "hdr")]
        Format::Hdr => hdr::write(path, &raster),
        _ => Err(IoError::UnsupportedFormat(format!(
            "cannot write {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_format("png"));
        assert!(is_supported_format("JPG"));
        assert!(is_supported_format("jpeg"));
        assert!(!is_supported_format("hdr"));
        assert!(!is_supported_format("tiff"));
        assert!(!is_supported_format(""));
    }

    #[test]
    fn test_write_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = DenseImage::new(2, 2, 3).unwrap();
        assert!(matches!(
            write_image(&img, dir.path().join("out.tiff")),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            read_image("/nonexistent/dir/image.png", 0, 0),
            Err(IoError::Io(_))
        ));
    }
}
