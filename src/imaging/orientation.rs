//! EXIF orientation.
//!
//! Cameras store pixels in sensor order and record how the device was held in
//! the EXIF `Orientation` tag (0x0112). Cache files are written upright, so the
//! tag is read once, mapped to a clockwise rotation, and then discarded.
//!
//! | Tag value | Meaning | Rotation |
//! |---|---|---|
//! | 1 | normal | 0° |
//! | 6 | rotate 90 | 90° |
//! | 3 | rotate 180 | 180° |
//! | 8 | rotate 270 | 270° |
//! | other (mirrored, 0, garbage) | undefined | 0° |
//!
//! Mirrored orientations (2, 4, 5, 7) are treated as undefined: the output is
//! rotated, never flipped.

use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::{BufRead, Seek};

/// Orientation decoded from embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
    Undefined,
}

impl Orientation {
    /// Map a raw EXIF orientation value.
    pub fn from_exif(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            6 => Orientation::Rotate90,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate270,
            _ => Orientation::Undefined,
        }
    }

    /// Clockwise rotation needed to display the image upright.
    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
            Orientation::Normal | Orientation::Undefined => 0,
        }
    }

    /// Rotate `img` upright. Pixel content is unchanged apart from position.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::Rotate270 => img.rotate270(),
            Orientation::Normal | Orientation::Undefined => img,
        }
    }
}

/// Read the orientation tag from an image container (JPEG, TIFF, PNG, WebP).
///
/// A container without EXIF data, or EXIF data without the tag, reads as
/// [`Orientation::Normal`], the tag's default. Anything unreadable is
/// [`Orientation::Undefined`].
pub fn read_orientation<R: BufRead + Seek>(reader: &mut R) -> Orientation {
    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Orientation::Normal,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable EXIF metadata");
            return Orientation::Undefined;
        }
    };

    match exif.get_field(Tag::Orientation, In::PRIMARY) {
        Some(field) => field
            .value
            .get_uint(0)
            .map(Orientation::from_exif)
            .unwrap_or(Orientation::Undefined),
        None => Orientation::Normal,
    }
}
