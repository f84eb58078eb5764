//! Decode and JPEG encode.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! The source format is sniffed from the bytes, never from a file extension:
//! locators rarely carry one. JPEG has no alpha channel and no 16-bit mode,
//! so anything other than 8-bit gray or RGB is converted to RGB8 first.

use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageReader};
use std::borrow::Cow;
use std::io::{BufRead, Seek, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(ImageError),
    #[error("JPEG encode failed: {0}")]
    Encode(ImageError),
}

/// Decode an image, guessing the format from its leading bytes.
///
/// The reader is left wherever the decoder stopped consuming.
pub fn decode<R: BufRead + Seek>(reader: R) -> Result<DynamicImage, ImagingError> {
    ImageReader::new(reader)
        .with_guessed_format()?
        .decode()
        .map_err(ImagingError::Decode)
}

/// Encode `img` as a baseline JPEG into `writer`.
pub fn encode_jpeg<W: Write>(
    img: &DynamicImage,
    writer: W,
    quality: Quality,
) -> Result<(), ImagingError> {
    let encodable = jpeg_compatible(img);
    let encoder = JpegEncoder::new_with_quality(writer, quality.value());
    encodable
        .write_with_encoder(encoder)
        .map_err(ImagingError::Encode)
}

/// Encode `img` as JPEG into a fresh buffer.
pub fn encode_jpeg_to_vec(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    encode_jpeg(img, &mut buf, quality)?;
    Ok(buf)
}

fn jpeg_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(img),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}
