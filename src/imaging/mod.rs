//! Image processing: decode, orient, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Orientation** | `kamadak-exif` reader over the locator's metadata channel |
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Rotate** | `image::DynamicImage::rotate90/180/270` (clockwise) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Orientation**: [`Orientation`] and the EXIF reader
//! - **Parameters**: [`Quality`]
//! - **Codec**: decode from any supported format, encode to JPEG

pub mod codec;
pub mod orientation;
mod params;

pub use codec::{ImagingError, decode, encode_jpeg, encode_jpeg_to_vec};
pub use orientation::{Orientation, read_orientation};
pub use params::Quality;
