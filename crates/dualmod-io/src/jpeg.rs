//! JPEG format support.
//!
//! Decoding goes through `jpeg-decoder`, encoding through `jpeg-encoder`.
//!
//! | Decoded layout | Result |
//! |----------------|--------|
//! | RGB24 | 3 channels, `[0, 255]` |
//! | L8 | 1 channel, `[0, 255]` |
//! | L16 | 1 channel, `[0, 65535]` |
//! | CMYK32 | converted to 3-channel RGB, `[0, 255]` |
//!
//! Output is always 8-bit RGB: grey is expanded and alpha dropped.

use crate::{IoError, IoResult, Raster};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::trace;

/// Encoder quality used by [`write`].
pub const DEFAULT_QUALITY: u8 = 90;

/// Reads a JPEG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let file = File::open(path.as_ref())?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let width = info.width as u32;
    let height = info.height as u32;
    trace!(width, height, pixel_format = ?info.pixel_format, "jpeg decoded");

    match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => Raster::from_u8(width, height, 3, &pixels),
        jpeg_decoder::PixelFormat::L8 => Raster::from_u8(width, height, 1, &pixels),
        jpeg_decoder::PixelFormat::L16 => {
            let samples: Vec<u16> = pixels
                .chunks_exact(2)
                .map(|l16| u16::from_be_bytes([l16[0], l16[1]]))
                .collect();
            Raster::from_u16(width, height, 1, &samples)
        }
        jpeg_decoder::PixelFormat::CMYK32 => {
            let rgb: Vec<u8> = pixels.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            Raster::from_u8(width, height, 3, &rgb)
        }
    }
}

// Approximate conversion without a color profile.
fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 1.0 - cmyk[3] as f32 / 255.0;
    let channel = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

/// Writes a raster as an RGB JPEG with [`DEFAULT_QUALITY`].
pub fn write<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    write_with_quality(path, raster, DEFAULT_QUALITY)
}

/// Writes a raster as an RGB JPEG.
///
/// # Errors
///
/// [`IoError::EncodeError`] for dimensions above 65535 or channel counts
/// other than 1 to 4.
pub fn write_with_quality<P: AsRef<Path>>(path: P, raster: &Raster, quality: u8) -> IoResult<()> {
    use jpeg_encoder::{ColorType, Encoder};

    let (width, height) = match (u16::try_from(raster.width), u16::try_from(raster.height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(IoError::EncodeError(format!(
                "{}x{} exceeds JPEG limits",
                raster.width, raster.height
            )));
        }
    };
    let rgb = raster.to_rgb()?.to_u8();

    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, quality);
    encoder
        .encode(&rgb, width, height, ColorType::Rgb)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(&buffer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.jpg");
        let raster = Raster::new(16, 16, 3, vec![100.0; 16 * 16 * 3]).unwrap();

        write(&path, &raster).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!((loaded.width, loaded.height, loaded.channels), (16, 16, 3));
        // Flat content survives lossy coding almost exactly
        assert!(loaded.data.iter().all(|&v| (v - 100.0).abs() <= 2.0));
    }

    #[test]
    fn test_gray_expanded_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.jpg");
        let raster = Raster::new(8, 8, 1, vec![200.0; 64]).unwrap();

        write(&path, &raster).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.channels, 3);
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 255, 0]), [0, 255, 0]);
    }

    #[test]
    fn test_quality_affects_size() {
        let dir = tempfile::tempdir().unwrap();
        let data = (0..32 * 32 * 3).map(|v| ((v * 37) % 256) as f32).collect();
        let raster = Raster::new(32, 32, 3, data).unwrap();

        let low = dir.path().join("low.jpg");
        let high = dir.path().join("high.jpg");
        write_with_quality(&low, &raster, 30).unwrap();
        write_with_quality(&high, &raster, 99).unwrap();

        let low_size = std::fs::metadata(&low).unwrap().len();
        let high_size = std::fs::metadata(&high).unwrap().len();
        assert!(high_size >= low_size);
    }
}
