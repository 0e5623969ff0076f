//! Radiance HDR (RGBE) format support.
//!
//! Supports reading and writing RGBE with optional RLE scanlines. Only
//! the `-Y h +X w` orientation written by virtually every tool is
//! accepted; any other resolution line is [`IoError::InvalidFile`], as
//! are headers above 2^30 pixels. Samples decode to linear
//! floating-point radiance.

use crate::{IoError, IoResult, Raster};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

const HDR_MAGIC: &str = "#?";
const SOFTWARE: &str = concat!("dualmod ", env!("CARGO_PKG_VERSION"));

/// Largest pixel count accepted from a header (32768 x 32768).
const MAX_PIXELS: usize = 1 << 30;

/// Upper bound on the up-front sample reservation, in pixels.
const SCANLINE_RESERVE: usize = 1 << 20;

/// Reads an HDR (Radiance RGBE) file as a 3-channel raster.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    if header.format.to_lowercase().contains("xyze") {
        debug!("XYZE file, samples are read as RGB");
    }
    trace!(width = header.width, height = header.height, "hdr header");

    let data = read_pixels(&mut reader, header.width as usize, header.height as usize)?;
    Raster::new(header.width, header.height, 3, data)
}

/// Writes an HDR (Radiance RGBE) file.
///
/// Grey input is replicated to RGB, alpha is dropped, negative values
/// clip to 0.
pub fn write<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    let rgb = raster.to_rgb()?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{HDR_MAGIC}RADIANCE")?;
    writeln!(writer, "FORMAT=32-bit_rle_rgbe")?;
    writeln!(writer, "SOFTWARE={SOFTWARE}")?;
    writeln!(writer)?;
    writeln!(writer, "-Y {} +X {}", rgb.height, rgb.width)?;

    write_pixels(&mut writer, &rgb)?;
    writer.flush()?;
    Ok(())
}

struct Header {
    width: u32,
    height: u32,
    format: String,
}

fn read_header<R: BufRead>(reader: &mut R) -> IoResult<Header> {
    let mut line = String::new();

    reader.read_line(&mut line)?;
    if !trim_line(&line).starts_with(HDR_MAGIC) {
        return Err(IoError::InvalidFile("HDR magic not found".into()));
    }

    let mut resolution = None;
    let mut format = "32-bit_rle_rgbe".to_string();

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            break;
        }
        let line = trim_line(&line);

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('+') || line.starts_with('-') {
            resolution = Some(parse_resolution(line)?);
            break;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("FORMAT") {
                format = value.trim().to_string();
            }
        }
    }

    let (width, height) =
        resolution.ok_or_else(|| IoError::InvalidFile("Missing HDR resolution".into()))?;

    Ok(Header {
        width,
        height,
        format,
    })
}

fn read_pixels<R: Read>(reader: &mut R, width: usize, height: usize) -> IoResult<Vec<f32>> {
    let pixels = width
        .checked_mul(height)
        .filter(|&n| n <= MAX_PIXELS)
        .ok_or_else(|| {
            IoError::InvalidFile(format!("HDR resolution {width}x{height} is too large"))
        })?;

    let mut first = [0u8; 4];
    reader.read_exact(&mut first)?;

    let use_rle = (8..=0x7fff).contains(&width)
        && first[0] == 2
        && first[1] == 2
        && ((first[2] as usize) << 8 | first[3] as usize) == width;

    // Decoded one scanline at a time so a truncated file fails before
    // the whole image is allocated.
    let mut scanline = vec![0u8; width * 4];
    let mut data = Vec::with_capacity(pixels.min(SCANLINE_RESERVE) * 3);

    for y in 0..height {
        if use_rle {
            let mut header = first;
            if y > 0 {
                reader.read_exact(&mut header)?;
            }
            decode_rle_scanline(reader, width, &mut scanline, header)?;
        } else if y == 0 {
            scanline[0..4].copy_from_slice(&first);
            reader.read_exact(&mut scanline[4..])?;
        } else {
            reader.read_exact(&mut scanline)?;
        }

        data.reserve(width * 3);
        for chunk in scanline.chunks_exact(4) {
            data.extend(rgbe_to_f32(chunk[0], chunk[1], chunk[2], chunk[3]));
        }
    }

    Ok(data)
}

fn decode_rle_scanline<R: Read>(
    reader: &mut R,
    width: usize,
    out: &mut [u8],
    header: [u8; 4],
) -> IoResult<()> {
    if header[0] != 2 || header[1] != 2 {
        return Err(IoError::InvalidFile("HDR RLE header invalid".into()));
    }
    let encoded_width = ((header[2] as usize) << 8) | (header[3] as usize);
    if encoded_width != width {
        return Err(IoError::InvalidFile("HDR RLE width mismatch".into()));
    }

    let mut channel = vec![0u8; width];
    for c in 0..4 {
        let mut idx = 0usize;
        while idx < width {
            let mut count = [0u8; 1];
            reader.read_exact(&mut count)?;
            let count = count[0] as usize;
            if count > 128 {
                let run = count - 128;
                if idx + run > width {
                    return Err(IoError::InvalidFile("HDR RLE run overflows scanline".into()));
                }
                let mut value = [0u8; 1];
                reader.read_exact(&mut value)?;
                channel[idx..idx + run].fill(value[0]);
                idx += run;
            } else {
                let run = count;
                if run == 0 || idx + run > width {
                    return Err(IoError::InvalidFile("HDR RLE literal overflows scanline".into()));
                }
                reader.read_exact(&mut channel[idx..idx + run])?;
                idx += run;
            }
        }

        for (x, &v) in channel.iter().enumerate() {
            out[x * 4 + c] = v;
        }
    }

    Ok(())
}

fn write_pixels<W: Write>(writer: &mut W, rgb: &Raster) -> IoResult<()> {
    let width = rgb.width as usize;
    let use_rle = (8..=0x7fff).contains(&width);

    let mut scanline = vec![0u8; width * 4];
    for row in rgb.data.chunks_exact(width * 3) {
        for (px, out) in row.chunks_exact(3).zip(scanline.chunks_exact_mut(4)) {
            out.copy_from_slice(&f32_to_rgbe(px[0], px[1], px[2]));
        }

        if use_rle {
            let header = [2u8, 2u8, (width >> 8) as u8, (width & 0xFF) as u8];
            writer.write_all(&header)?;
            encode_rle_scanline(writer, width, &scanline)?;
        } else {
            writer.write_all(&scanline)?;
        }
    }

    Ok(())
}

fn encode_rle_scanline<W: Write>(writer: &mut W, width: usize, scanline: &[u8]) -> IoResult<()> {
    let mut channel = vec![0u8; width];
    for c in 0..4 {
        for (x, v) in channel.iter_mut().enumerate() {
            *v = scanline[x * 4 + c];
        }
        writer.write_all(&encode_rle_channel(&channel))?;
    }
    Ok(())
}

fn encode_rle_channel(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0usize;
    while i < data.len() {
        let mut run = 1usize;
        while i + run < data.len() && run < 127 && data[i] == data[i + run] {
            run += 1;
        }

        if run >= 4 {
            out.push((128 + run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        let start = i;
        let mut literal = 0usize;
        while i < data.len() {
            run = 1;
            while i + run < data.len() && run < 127 && data[i] == data[i + run] {
                run += 1;
            }
            if run >= 4 {
                break;
            }
            i += 1;
            literal += 1;
            if literal == 128 {
                break;
            }
        }
        out.push(literal as u8);
        out.extend_from_slice(&data[start..start + literal]);
    }
    out
}

fn f32_to_rgbe(r: f32, g: f32, b: f32) -> [u8; 4] {
    // `max` drops NaN in favour of 0
    let r = r.max(0.0);
    let g = g.max(0.0);
    let b = b.max(0.0);
    let max = r.max(g).max(b);
    if max < 1.0e-32 {
        return [0, 0, 0, 0];
    }
    if !max.is_finite() {
        return [255, 255, 255, 255];
    }

    let (m, e) = frexp(max);
    let scale = m * 256.0 / max;

    [
        (r * scale).clamp(0.0, 255.0) as u8,
        (g * scale).clamp(0.0, 255.0) as u8,
        (b * scale).clamp(0.0, 255.0) as u8,
        (e + 128).clamp(0, 255) as u8,
    ]
}

fn rgbe_to_f32(r: u8, g: u8, b: u8, e: u8) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let f = 2.0_f32.powi(e as i32 - 136);
    [r as f32 * f, g as f32 * f, b as f32 * f]
}

fn frexp(x: f32) -> (f32, i32) {
    if x == 0.0 {
        return (0.0, 0);
    }
    let e = x.abs().log2().floor() as i32 + 1;
    let m = x / 2.0_f32.powi(e);
    (m, e)
}

/// Parses `-Y <height> +X <width>`, the standard top-down orientation.
///
/// Flipped or transposed orientations are rejected rather than decoded
/// in the wrong pixel order.
fn parse_resolution(line: &str) -> IoResult<(u32, u32)> {
    let invalid = || IoError::InvalidFile(format!("Invalid HDR resolution line {line:?}"));

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [y_axis, height, x_axis, width] = parts[..] else {
        return Err(invalid());
    };
    if (y_axis, x_axis) != ("-Y", "+X") {
        return Err(IoError::InvalidFile(format!(
            "Unsupported HDR orientation {line:?}, expected -Y <height> +X <width>"
        )));
    }

    let height: u32 = height.parse().map_err(|_| invalid())?;
    let width: u32 = width.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(&['\r', '\n'][..])
}
