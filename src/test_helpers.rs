//! Shared test utilities for the media-cache test suite.
//!
//! Provides synthetic image fixtures and pixel assertions. Images are built
//! in memory with the `image` crate, so no binary fixtures live in the repo.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = quadrant_image(40, 20);
//! let bytes = jpeg_with_orientation(&img, 6);
//! let host = MockHost::new(tmp.path()).with_stream(URI, bytes);
//! ```

use image::{DynamicImage, Rgb, RgbImage};

// =========================================================================
// Fixture images
// =========================================================================

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// An RGB image split into four flat quadrants:
///
/// ```text
/// RED   | GREEN
/// ------+------
/// BLUE  | WHITE
/// ```
///
/// Flat regions survive JPEG round trips, so the quadrant a color lands in
/// tells which way an image was rotated.
pub fn quadrant_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => RED,
            (false, true) => GREEN,
            (true, false) => BLUE,
            (false, false) => WHITE,
        }
    }))
}

/// Encode as a max-quality JPEG without metadata.
pub fn jpeg_bytes(img: &DynamicImage) -> Vec<u8> {
    crate::imaging::encode_jpeg_to_vec(img, crate::imaging::Quality::MAX).unwrap()
}

/// Encode as JPEG and splice in an EXIF APP1 segment carrying `orientation`.
pub fn jpeg_with_orientation(img: &DynamicImage, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(img);
    let mut out = Vec::with_capacity(jpeg.len() + 40);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&exif_app1(orientation));
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Minimal big-endian EXIF APP1 segment with a single IFD0 Orientation entry.
fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

// =========================================================================
// Pixel assertions
// =========================================================================

/// Assert a pixel is within `tolerance` per channel of `expected`.
///
/// JPEG is lossy even at quality 100, so exact equality is never checked on
/// decoded output.
pub fn assert_color_near(img: &DynamicImage, x: u32, y: u32, expected: Rgb<u8>, tolerance: u8) {
    let actual = img.to_rgb8().get_pixel(x, y).0;
    for (channel, (a, e)) in actual.iter().zip(expected.0).enumerate() {
        assert!(
            a.abs_diff(e) <= tolerance,
            "pixel ({x}, {y}) channel {channel}: got {actual:?}, expected {:?} ±{tolerance}",
            expected.0
        );
    }
}

/// Assert which color sits in each corner, clockwise from top-left.
pub fn assert_corners(img: &DynamicImage, corners: [Rgb<u8>; 4]) {
    let (w, h) = (img.width(), img.height());
    let points = [(1, 1), (w - 2, 1), (w - 2, h - 2), (1, h - 2)];
    for ((x, y), color) in points.into_iter().zip(corners) {
        assert_color_near(img, x, y, color, 40);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_image_layout() {
        let img = quadrant_image(10, 10);
        assert_corners(&img, [RED, GREEN, WHITE, BLUE]);
    }

    #[test]
    fn orientation_segment_follows_soi() {
        let bytes = jpeg_with_orientation(&quadrant_image(8, 8), 6);
        assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
        assert_eq!(&bytes[6..12], b"Exif\0\0");
    }
}
