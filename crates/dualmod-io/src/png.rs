//! PNG format support.
//!
//! Reading keeps the file's channel layout and sample range: 8-bit files
//! decode to `[0, 255]`, 16-bit files to `[0, 65535]`. Palette and
//! sub-byte images are expanded to 8 bits per sample first.
//!
//! Writing always produces 8-bit output with 1 to 4 channels.
//!
//! # Example
//!
//! ```rust,ignore
//! use dualmod_io::png::{read, write};
//!
//! let raster = read("input.png")?;
//! write("output.png", &raster)?;
//! ```

use crate::{IoError, IoResult, Raster};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::trace;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let bytes = &buf[..info.buffer_size()];
    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            return Err(IoError::UnsupportedBitDepth(
                "indexed PNG was not expanded".into(),
            ));
        }
    };
    trace!(
        width = info.width,
        height = info.height,
        channels,
        bit_depth = ?info.bit_depth,
        "png decoded"
    );

    match info.bit_depth {
        png::BitDepth::Eight => Raster::from_u8(info.width, info.height, channels, bytes),
        png::BitDepth::Sixteen => {
            Raster::from_u16(info.width, info.height, channels, &bytes_to_u16(bytes))
        }
        bit_depth => Err(IoError::UnsupportedBitDepth(format!(
            "{:?} {:?}",
            info.color_type, bit_depth
        ))),
    }
}

/// Writes a raster to an 8-bit PNG file.
///
/// Samples are rounded and saturated to `[0, 255]`.
pub fn write<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    let color_type = match raster.channels {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {n}"))),
    };

    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, raster.width, raster.height);
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .write_image_data(&raster.to_u8())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}
