//! Mirror-boundary 2-D convolution.
//!
//! For output pixel `(x, y)` and kernel tap `(i, j)` the source pixel is
//! `(x - kw/2 + i, y - kh/2 + j)` (integer division), reflected back into
//! the image per axis:
//!
//! ```text
//! p <  0     ->  -p - 1
//! p >= size  ->  (size - 1) - (p - size)
//! ```
//!
//! Even-sized kernels therefore reach one tap further toward the lower
//! index than toward the higher one.
//!
//! A single-channel kernel is broadcast across all image channels; a
//! kernel with the image's channel count is applied channel by channel.
//!
//! With the `parallel` feature the output is computed column-parallel on
//! the rayon pool. Each output pixel accumulates its taps in the same
//! order either way, so both paths give identical results.

use crate::{CoreError, DenseImage, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

/// How kernel samples map onto image channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelChannels {
    /// Kernel has one channel, applied to every image channel.
    Broadcast,
    /// Kernel channel `c` weights image channel `c`.
    Matched,
}

/// Reflects coordinate `p` into `[0, size)` using the mirror rule.
///
/// Valid for `-size <= p < 2 * size`, which the kernel size check
/// guarantees.
#[inline]
pub fn mirror_index(p: isize, size: usize) -> usize {
    let size = size as isize;
    let mut p = p;
    if p < 0 {
        p = -p - 1;
    }
    if p >= size {
        p = (size - 1) - (p - size);
    }
    p as usize
}

impl DenseImage {
    /// Convolves this image with `kernel` using mirror boundaries.
    ///
    /// # Errors
    ///
    /// - [`CoreError::KernelTooLarge`] if the kernel is wider or taller
    ///   than the image
    /// - [`CoreError::ChannelMismatch`] if the kernel channel count is
    ///   neither 1 nor the image channel count
    ///
    /// # Example
    ///
    /// ```rust
    /// use dualmod_core::DenseImage;
    ///
    /// let img = DenseImage::filled(8, 8, 3, 0.5).unwrap();
    /// let kernel = DenseImage::filled(3, 3, 1, 1.0 / 9.0).unwrap();
    /// let out = img.convolve(&kernel).unwrap();
    /// assert!(out.data().iter().all(|v| (v - 0.5).abs() < 1e-12));
    /// ```
    pub fn convolve(&self, kernel: &DenseImage) -> Result<DenseImage> {
        let mut out = self.zeros_like();
        self.convolve_into(kernel, &mut out)?;
        Ok(out)
    }

    /// Convolves into an existing buffer of the same shape as `self`.
    ///
    /// # Errors
    ///
    /// As [`convolve`](Self::convolve), plus [`CoreError::ShapeMismatch`]
    /// when `out` differs in shape.
    pub fn convolve_into(&self, kernel: &DenseImage, out: &mut DenseImage) -> Result<()> {
        let mode = self.kernel_channels(kernel)?;
        self.ensure_same_shape(out)?;

        trace!(
            height = self.height(),
            width = self.width(),
            channels = self.channels(),
            kernel_h = kernel.height(),
            kernel_w = kernel.width(),
            ?mode,
            "convolve"
        );

        let column_len = self.height() * self.channels();

        #[cfg(feature = "parallel")]
        out.data_mut()
            .par_chunks_mut(column_len)
            .enumerate()
            .for_each(|(x, column)| self.convolve_column(x, kernel, mode, column));

        #[cfg(not(feature = "parallel"))]
        out.data_mut()
            .chunks_mut(column_len)
            .enumerate()
            .for_each(|(x, column)| self.convolve_column(x, kernel, mode, column));

        Ok(())
    }

    fn kernel_channels(&self, kernel: &DenseImage) -> Result<KernelChannels> {
        if kernel.width() > self.width() || kernel.height() > self.height() {
            return Err(CoreError::kernel_too_large(
                kernel.dimensions(),
                self.dimensions(),
            ));
        }
        if kernel.channels() == self.channels() {
            Ok(KernelChannels::Matched)
        } else if kernel.channels() == 1 {
            Ok(KernelChannels::Broadcast)
        } else {
            Err(CoreError::ChannelMismatch {
                expected: self.channels(),
                got: kernel.channels(),
            })
        }
    }

    /// Fills one output column (`x` fixed, all `y`).
    fn convolve_column(
        &self,
        x: usize,
        kernel: &DenseImage,
        mode: KernelChannels,
        column: &mut [f64],
    ) {
        let channels = self.channels();
        for (y, sum) in column.chunks_exact_mut(channels).enumerate() {
            sum.fill(0.0);
            self.accumulate(x, y, kernel, mode, sum);
        }
    }

    fn accumulate(
        &self,
        x: usize,
        y: usize,
        kernel: &DenseImage,
        mode: KernelChannels,
        sum: &mut [f64],
    ) {
        let kw2 = (kernel.width() / 2) as isize;
        let kh2 = (kernel.height() / 2) as isize;

        for i in 0..kernel.width() {
            let px = mirror_index(x as isize - kw2 + i as isize, self.width());
            for j in 0..kernel.height() {
                let py = mirror_index(y as isize - kh2 + j as isize, self.height());

                let src = self.pixel(px, py);
                let weights = kernel.pixel(i, j);
                match mode {
                    KernelChannels::Broadcast => {
                        let w = weights[0];
                        for (s, &v) in sum.iter_mut().zip(src) {
                            *s += v * w;
                        }
                    }
                    KernelChannels::Matched => {
                        for ((s, &v), &w) in sum.iter_mut().zip(src).zip(weights) {
                            *s += v * w;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(height: usize, width: usize, channels: usize) -> DenseImage {
        let data = (0..height * width * channels)
            .map(|v| (v as f64 * 0.37).sin() + 1.5)
            .collect();
        DenseImage::from_data(height, width, channels, data).unwrap()
    }

    #[test]
    fn test_mirror_index() {
        assert_eq!(mirror_index(-1, 5), 0);
        assert_eq!(mirror_index(-2, 5), 1);
        assert_eq!(mirror_index(0, 5), 0);
        assert_eq!(mirror_index(4, 5), 4);
        assert_eq!(mirror_index(5, 5), 4);
        assert_eq!(mirror_index(6, 5), 3);
    }

    #[test]
    fn test_identity_kernel() {
        let img = ramp(5, 7, 3);
        let kernel = DenseImage::filled(1, 1, 1, 1.0).unwrap();
        let out = img.convolve(&kernel).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_constant_image_uniform_kernel() {
        let img = DenseImage::filled(6, 5, 2, 0.8).unwrap();
        for (kh, kw) in [(3, 3), (2, 2), (4, 5), (1, 3)] {
            let kernel = DenseImage::filled(kh, kw, 1, 1.0 / (kh * kw) as f64).unwrap();
            let out = img.convolve(&kernel).unwrap();
            for &v in out.data() {
                assert_relative_eq!(v, 0.8, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_even_kernel_biased_to_lower_index() {
        // 1x4 image (height 1), 1x2 kernel picking only the first tap.
        // kw2 = 1, so tap i = 0 reads x - 1: output is the left neighbour.
        let img = DenseImage::from_data(1, 4, 1, vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let kernel = DenseImage::from_data(1, 2, 1, vec![1.0, 0.0]).unwrap();
        let out = img.convolve(&kernel).unwrap();
        // x = 0 reflects -1 -> 0
        assert_eq!(out.data(), &[10.0, 10.0, 20.0, 30.0]);

        // Second tap reads x itself
        let kernel = DenseImage::from_data(1, 2, 1, vec![0.0, 1.0]).unwrap();
        let out = img.convolve(&kernel).unwrap();
        assert_eq!(out.data(), &[10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_mirror_at_far_edge() {
        // Height axis: 3x1 kernel selecting the last tap reads y + 1.
        let img = DenseImage::from_data(3, 1, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let kernel = DenseImage::from_data(3, 1, 1, vec![0.0, 0.0, 1.0]).unwrap();
        let out = img.convolve(&kernel).unwrap();
        // y = 2 reads 3 -> reflected to 2
        assert_eq!(out.data(), &[2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_matched_channel_kernel() {
        let img = DenseImage::filled(3, 3, 2, 1.0).unwrap();
        let mut kernel = DenseImage::new(1, 1, 2).unwrap();
        kernel.set(0, 0, 0, 2.0);
        kernel.set(0, 0, 1, 3.0);
        let out = img.convolve(&kernel).unwrap();
        assert_eq!(out.pixel(1, 1), &[2.0, 3.0]);
    }

    #[test]
    fn test_kernel_too_large() {
        let img = DenseImage::new(4, 4, 1).unwrap();
        let kernel = DenseImage::new(5, 3, 1).unwrap();
        assert!(matches!(
            img.convolve(&kernel),
            Err(CoreError::KernelTooLarge { .. })
        ));
    }

    #[test]
    fn test_kernel_channel_mismatch() {
        let img = DenseImage::new(4, 4, 3).unwrap();
        let kernel = DenseImage::new(3, 3, 2).unwrap();
        assert!(matches!(
            img.convolve(&kernel),
            Err(CoreError::ChannelMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_convolve_into_shape_checked() {
        let img = DenseImage::new(4, 4, 1).unwrap();
        let kernel = DenseImage::filled(1, 1, 1, 1.0).unwrap();
        let mut out = DenseImage::new(4, 5, 1).unwrap();
        assert!(img.convolve_into(&kernel, &mut out).is_err());
    }

    #[test]
    fn test_matches_reference_loop() {
        // Direct transcription of the per-pixel rule over a non-square image.
        let img = ramp(5, 6, 2);
        let kernel = ramp(3, 4, 1);
        let out = img.convolve(&kernel).unwrap();

        for x in 0..img.width() {
            for y in 0..img.height() {
                for c in 0..img.channels() {
                    let mut expected = 0.0;
                    for i in 0..kernel.width() {
                        for j in 0..kernel.height() {
                            let px = mirror_index(x as isize - 2 + i as isize, img.width());
                            let py = mirror_index(y as isize - 1 + j as isize, img.height());
                            expected += img.get(px, py, c) * kernel.get(i, j, 0);
                        }
                    }
                    assert_relative_eq!(out.get(x, y, c), expected, epsilon = 1e-12);
                }
            }
        }
    }
}
