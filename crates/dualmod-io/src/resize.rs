//! Resize-on-load with linear interpolation.
//!
//! Two separable passes, width first then height. Each destination
//! coordinate `x` maps to a source position:
//!
//! ```text
//! upscale    pos = x * (src - 1) / (dst - 1)
//! downscale  pos = x * src / dst
//! ```
//!
//! and blends the two neighbouring source samples with triangle weights.
//! Upscaling keeps both corner pixels exactly; downscaling samples with
//! the plain ratio.

use dualmod_core::{DenseImage, Result};
use tracing::trace;

/// One destination sample: source indices and the weight of `i1`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    i0: usize,
    i1: usize,
    t: f64,
}

fn taps(src: usize, dst: usize) -> Vec<Tap> {
    let ratio = if dst > src {
        if dst > 1 {
            (src - 1) as f64 / (dst - 1) as f64
        } else {
            0.0
        }
    } else {
        src as f64 / dst as f64
    };

    (0..dst)
        .map(|x| {
            let pos = x as f64 * ratio;
            let i0 = (pos.floor() as usize).min(src - 1);
            let i1 = (i0 + 1).min(src - 1);
            Tap {
                i0,
                i1,
                t: pos - i0 as f64,
            }
        })
        .collect()
}

/// Resizes `image` to `height x width` with linear interpolation.
///
/// A zero target keeps that axis unchanged. Returns a clone when
/// nothing changes.
///
/// # Errors
///
/// Propagates buffer construction failures.
///
/// # Example
///
/// ```rust
/// use dualmod_core::DenseImage;
/// use dualmod_io::resize::resize_linear;
///
/// let img = DenseImage::filled(4, 4, 3, 0.5).unwrap();
/// let big = resize_linear(&img, 8, 0).unwrap();
/// assert_eq!(big.dimensions(), (8, 4));
/// ```
pub fn resize_linear(image: &DenseImage, height: usize, width: usize) -> Result<DenseImage> {
    let (src_h, src_w) = image.dimensions();
    let dst_h = if height == 0 { src_h } else { height };
    let dst_w = if width == 0 { src_w } else { width };

    if (dst_h, dst_w) == (src_h, src_w) {
        return Ok(image.clone());
    }
    trace!(src_h, src_w, dst_h, dst_w, "resize_linear");

    let horizontal = resize_width(image, dst_w)?;
    resize_height(&horizontal, dst_h)
}

fn resize_width(src: &DenseImage, dst_w: usize) -> Result<DenseImage> {
    if dst_w == src.width() {
        return Ok(src.clone());
    }
    let mut out = DenseImage::new(src.height(), dst_w, src.channels())?;
    for (x, tap) in taps(src.width(), dst_w).into_iter().enumerate() {
        for y in 0..src.height() {
            lerp_into(out.pixel_mut(x, y), src.pixel(tap.i0, y), src.pixel(tap.i1, y), tap.t);
        }
    }
    Ok(out)
}

fn resize_height(src: &DenseImage, dst_h: usize) -> Result<DenseImage> {
    if dst_h == src.height() {
        return Ok(src.clone());
    }
    let mut out = DenseImage::new(dst_h, src.width(), src.channels())?;
    let taps = taps(src.height(), dst_h);
    for x in 0..src.width() {
        for (y, tap) in taps.iter().enumerate() {
            lerp_into(out.pixel_mut(x, y), src.pixel(x, tap.i0), src.pixel(x, tap.i1), tap.t);
        }
    }
    Ok(out)
}

#[inline]
fn lerp_into(out: &mut [f64], a: &[f64], b: &[f64], t: f64) {
    for ((o, &a), &b) in out.iter_mut().zip(a).zip(b) {
        *o = a + (b - a) * t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_target_is_noop() {
        let img = DenseImage::filled(3, 5, 2, 1.5).unwrap();
        assert_eq!(resize_linear(&img, 0, 0).unwrap(), img);
        assert_eq!(resize_linear(&img, 3, 5).unwrap(), img);
    }

    #[test]
    fn test_upscale_keeps_corners() {
        // One row: 0, 10, 20 -> five samples
        let img = DenseImage::from_data(1, 3, 1, vec![0.0, 10.0, 20.0]).unwrap();
        let out = resize_linear(&img, 0, 5).unwrap();
        assert_eq!(out.dimensions(), (1, 5));
        let values: Vec<f64> = (0..5).map(|x| out.get(x, 0, 0)).collect();
        for (v, e) in values.iter().zip([0.0, 5.0, 10.0, 15.0, 20.0]) {
            assert_relative_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_downscale_ratio() {
        // Column of 4 -> 2: positions 0 and 2
        let img = DenseImage::from_data(4, 1, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = resize_linear(&img, 2, 0).unwrap();
        assert_eq!(out.data(), &[1.0, 3.0]);
    }

    #[test]
    fn test_constant_stays_constant() {
        let img = DenseImage::filled(7, 5, 3, 0.25).unwrap();
        let out = resize_linear(&img, 12, 3).unwrap();
        assert_eq!(out.shape(), (12, 3, 3));
        for &v in out.data() {
            assert_relative_eq!(v, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_pixel_source() {
        let img = DenseImage::filled(1, 1, 1, 9.0).unwrap();
        let out = resize_linear(&img, 3, 4).unwrap();
        assert!(out.data().iter().all(|&v| v == 9.0));
    }
}
