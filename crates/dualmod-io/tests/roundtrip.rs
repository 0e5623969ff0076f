//! File round trips through the public `read_image` / `write_image` API.

use approx::assert_relative_eq;
use dualmod_core::DenseImage;
use dualmod_io::{read_image, write_image, Format, IoError};

/// Distinct value per (x, y, c) so transposition errors show up.
fn gradient(height: usize, width: usize, channels: usize) -> DenseImage {
    let mut img = DenseImage::new(height, width, channels).unwrap();
    for x in 0..width {
        for y in 0..height {
            for c in 0..channels {
                img.set(x, y, c, (x * 20 + y * 3 + c) as f64);
            }
        }
    }
    img
}

#[test]
fn png_preserves_layout_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grad.png");
    let img = gradient(6, 9, 3);

    write_image(&img, &path).unwrap();
    let loaded = read_image(&path, 0, 0).unwrap();

    assert_eq!(loaded, img);
}

#[test]
fn png_single_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    let img = gradient(4, 5, 1);

    write_image(&img, &path).unwrap();
    let loaded = read_image(&path, 0, 0).unwrap();

    assert_eq!(loaded.channels(), 1);
    assert_eq!(loaded, img);
}

#[test]
fn png_write_saturates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sat.png");
    let img = DenseImage::from_data(1, 3, 1, vec![-10.0, 127.6, 900.0]).unwrap();

    write_image(&img, &path).unwrap();
    let loaded = read_image(&path, 0, 0).unwrap();
    assert_eq!(loaded.data(), &[0.0, 128.0, 255.0]);
}

#[test]
fn read_with_resize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.png");
    let img = DenseImage::filled(4, 6, 3, 200.0).unwrap();
    write_image(&img, &path).unwrap();

    let loaded = read_image(&path, 8, 12).unwrap();
    assert_eq!(loaded.shape(), (8, 12, 3));
    assert!(loaded.data().iter().all(|&v| v == 200.0));

    // Zero height keeps the decoded height
    let loaded = read_image(&path, 0, 3).unwrap();
    assert_eq!(loaded.dimensions(), (4, 3));
}

#[test]
fn jpeg_roundtrip_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.jpeg");
    let img = DenseImage::filled(16, 16, 3, 90.0).unwrap();

    write_image(&img, &path).unwrap();
    assert_eq!(Format::detect(&path).unwrap(), Format::Jpeg);

    let loaded = read_image(&path, 0, 0).unwrap();
    assert_eq!(loaded.shape(), (16, 16, 3));
    for &v in loaded.data() {
        assert!((v - 90.0).abs() <= 2.0, "{v}");
    }
}

#[test]
fn hdr_keeps_float_radiance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.hdr");
    let mut img = DenseImage::filled(3, 10, 3, 0.5).unwrap();
    img.set_pixel(4, 1, 4000.0);

    write_image(&img, &path).unwrap();
    let loaded = read_image(&path, 0, 0).unwrap();

    assert_eq!(loaded.shape(), img.shape());
    assert_relative_eq!(loaded.get(4, 1, 0), 4000.0, max_relative = 1e-2);
    assert_relative_eq!(loaded.get(0, 0, 2), 0.5, max_relative = 1e-2);
}

#[test]
fn unknown_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not an image").unwrap();

    assert!(matches!(
        read_image(&path, 0, 0),
        Err(IoError::UnsupportedFormat(_))
    ));
}

#[test]
fn corrupt_png_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"garbage");
    std::fs::write(&path, bytes).unwrap();

    assert!(read_image(&path, 0, 0).is_err());
}

#[test]
fn hdr_with_overflowing_resolution_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.hdr");
    let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 4000000000 +X 4000000000\n".to_vec();
    bytes.extend_from_slice(&[0x02, 0x02, 0x00, 0x01]);
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        read_image(&path, 0, 0),
        Err(IoError::InvalidFile(_))
    ));
}
