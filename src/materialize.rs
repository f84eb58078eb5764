//! Stream materialization: locator bytes → upright JPEG cache file.
//!
//! Used whenever a locator has no filesystem path we can hand back directly.
//! The pipeline runs in this order, each step a possible early exit:
//!
//! ```text
//! open stream ─→ allocate path ─→ read orientation ─→ decode
//!                                                        │
//!              CacheFile ←─ flush ←─ encode JPEG ←─ rotate
//! ```
//!
//! # Design
//!
//! ## Scoped handles
//!
//! The source stream, the orientation reader and the destination writer are
//! owned values. They are released when they go out of scope, so every
//! early return closes them. The destination is only created once the image
//! has decoded; if encoding or flushing fails afterwards, [`PartialFile`]
//! removes it again. A failed call never leaves a cache file behind.
//!
//! ## Buffering
//!
//! Image decoders need to seek, provider streams cannot. The stream is read
//! into memory once and decoded from a cursor over that buffer.
//!
//! ## Trailing bytes
//!
//! Older hosts appended whatever the decoder left unread after the encoded
//! JPEG. With [`MaterializeOptions::append_trailing_bytes`] set, bytes past
//! the decoder's final read position are appended the same way. It is off by
//! default: in practice decoders consume the whole buffer, and when they do
//! not, the result is a JPEG with junk after the EOI marker.

use crate::cache::{self, CacheFile};
use crate::config::{EncodingConfig, PickerOptions};
use crate::host::{HostError, MediaHost};
use crate::imaging::{self, ImagingError, Orientation, Quality};
use crate::locator::MediaLocator;
use crate::selector::ErrorKind;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Locator has no authority: {0}")]
    NoAuthority(String),
    #[error("Failed to open {locator}: {source}")]
    Open {
        locator: String,
        #[source]
        source: HostError,
    },
    #[error("Failed to read {locator}: {source}")]
    Read {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {locator}: {source}")]
    Decode {
        locator: String,
        #[source]
        source: ImagingError,
    },
    #[error("Failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: ImagingError,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MaterializeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MaterializeError::NoAuthority(_)
            | MaterializeError::Open { .. }
            | MaterializeError::Read { .. } => ErrorKind::StreamOpenFailed,
            MaterializeError::Decode { .. } => ErrorKind::DecodeFailed,
            MaterializeError::Create { .. } => ErrorKind::AllocationFailed,
            MaterializeError::Encode { .. } | MaterializeError::Write { .. } => {
                ErrorKind::EncodeFailed
            }
        }
    }
}

/// Encoder settings for one materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterializeOptions {
    pub quality: Quality,
    pub append_trailing_bytes: bool,
}

impl From<&EncodingConfig> for MaterializeOptions {
    fn from(config: &EncodingConfig) -> Self {
        Self {
            quality: Quality::new(config.quality),
            append_trailing_bytes: config.append_trailing_bytes,
        }
    }
}

/// Copy a locator's image into a fresh upright JPEG under the cache directory.
#[tracing::instrument(skip_all, fields(locator = %locator))]
pub fn materialize(
    host: &dyn MediaHost,
    locator: &MediaLocator,
    options: &PickerOptions,
    settings: &MaterializeOptions,
) -> Result<CacheFile, MaterializeError> {
    if locator.authority().is_none() {
        return Err(MaterializeError::NoAuthority(locator.to_string()));
    }

    let mut source = host
        .open_stream(locator)
        .map_err(|source| MaterializeError::Open {
            locator: locator.to_string(),
            source,
        })?;

    let dest = cache::allocate(host.cache_dir(), options);
    let orientation = orientation_of(host, locator);

    let mut bytes = Vec::new();
    source
        .read_to_end(&mut bytes)
        .map_err(|source| MaterializeError::Read {
            locator: locator.to_string(),
            source,
        })?;
    drop(source);

    let mut cursor = Cursor::new(bytes.as_slice());
    let decoded = imaging::decode(&mut cursor).map_err(|source| MaterializeError::Decode {
        locator: locator.to_string(),
        source,
    })?;
    let consumed = usize::try_from(cursor.position()).unwrap_or(bytes.len());
    let trailing = bytes.get(consumed..).unwrap_or_default();

    let upright = orientation.apply(decoded);

    let trailing: &[u8] = if settings.append_trailing_bytes {
        trailing
    } else {
        &[]
    };
    write_jpeg(&dest, &upright, settings.quality, trailing)?;

    let file = CacheFile::from_path(&dest).map_err(|source| MaterializeError::Write {
        path: dest.clone(),
        source,
    })?;
    tracing::info!(
        path = %file.path.display(),
        bytes = file.len,
        rotation = orientation.degrees(),
        "materialized cache file"
    );
    Ok(file)
}

/// Orientation from the locator's metadata channel. No channel reads as
/// [`Orientation::Undefined`].
fn orientation_of(host: &dyn MediaHost, locator: &MediaLocator) -> Orientation {
    match host.orientation_source(locator) {
        Some(mut reader) => imaging::read_orientation(&mut reader),
        None => Orientation::Undefined,
    }
}

/// Encode into `dest`, removing the file again if anything fails.
fn write_jpeg(
    dest: &Path,
    img: &image::DynamicImage,
    quality: Quality,
    trailing: &[u8],
) -> Result<(), MaterializeError> {
    let file = File::create(dest).map_err(|source| MaterializeError::Create {
        path: dest.to_path_buf(),
        source,
    })?;
    let mut guard = PartialFile::new(dest);
    let mut writer = BufWriter::new(file);

    imaging::encode_jpeg(img, &mut writer, quality).map_err(|source| {
        MaterializeError::Encode {
            path: dest.to_path_buf(),
            source,
        }
    })?;

    let write_err = |source| MaterializeError::Write {
        path: dest.to_path_buf(),
        source,
    };
    if !trailing.is_empty() {
        tracing::debug!(bytes = trailing.len(), "appending trailing source bytes");
        writer.write_all(trailing).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;
    drop(writer);

    guard.keep();
    Ok(())
}

/// Removes a destination file on drop unless [`PartialFile::keep`] was called.
struct PartialFile<'a> {
    path: &'a Path,
    keep: bool,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, keep: false }
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if !self.keep
            && let Err(e) = fs::remove_file(self.path)
        {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove partial cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::context::tests::{MockHost, RecordedOp};
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    const URI: &str = "content://com.example.provider/picked/1";

    fn locator(uri: &str) -> MediaLocator {
        MediaLocator::parse(uri).unwrap()
    }

    fn decode_file(path: &Path) -> image::DynamicImage {
        image::open(path).unwrap()
    }

    fn cache_entries(dir: &Path) -> Vec<PathBuf> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                entries.extend(cache_entries(&path));
            } else {
                entries.push(path);
            }
        }
        entries
    }

    fn run(host: &MockHost, uri: &str) -> Result<CacheFile, MaterializeError> {
        materialize(
            host,
            &locator(uri),
            &PickerOptions::default(),
            &MaterializeOptions::default(),
        )
    }

    // =========================================================================
    // Success paths
    // =========================================================================

    #[test]
    fn materializes_jpeg_under_cache_dir() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(tmp.path()).with_stream(URI, jpeg_bytes(&quadrant_image(40, 20)));

        let file = run(&host, URI).unwrap();

        assert_eq!(file.path.parent().unwrap(), tmp.path());
        assert!(file.file_name().ends_with(".jpg"));
        assert_eq!(file.len, fs::metadata(&file.path).unwrap().len());
        let out = decode_file(&file.path);
        assert_eq!((out.width(), out.height()), (40, 20));
        assert_corners(&out, [RED, GREEN, WHITE, BLUE]);
    }

    #[test]
    fn rotate90_metadata_transposes_output() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(40, 20);
        let host = MockHost::new(tmp.path())
            .with_stream(URI, jpeg_with_orientation(&raw, 6))
            .with_metadata(URI, jpeg_with_orientation(&raw, 6));

        let file = run(&host, URI).unwrap();

        let out = decode_file(&file.path);
        assert_eq!((out.width(), out.height()), (20, 40));
        // Clockwise: top-left red moves to top-right
        assert_corners(&out, [BLUE, RED, GREEN, WHITE]);
    }

    #[test]
    fn rotate180_and_270_metadata() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(40, 20);
        let host = MockHost::new(tmp.path())
            .with_stream(URI, jpeg_bytes(&raw))
            .with_metadata(URI, jpeg_with_orientation(&raw, 3));
        let out = decode_file(&run(&host, URI).unwrap().path);
        assert_eq!((out.width(), out.height()), (40, 20));
        assert_corners(&out, [WHITE, BLUE, RED, GREEN]);

        let host = MockHost::new(tmp.path())
            .with_stream(URI, jpeg_bytes(&raw))
            .with_metadata(URI, jpeg_with_orientation(&raw, 8));
        let out = decode_file(&run(&host, URI).unwrap().path);
        assert_eq!((out.width(), out.height()), (20, 40));
        assert_corners(&out, [GREEN, WHITE, BLUE, RED]);
    }

    #[test]
    fn orientation_comes_from_metadata_channel_not_stream() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(40, 20);
        // Stream carries rotate-90, but there is no metadata channel
        let host = MockHost::new(tmp.path()).with_stream(URI, jpeg_with_orientation(&raw, 6));

        let out = decode_file(&run(&host, URI).unwrap().path);
        assert_eq!((out.width(), out.height()), (40, 20));
    }

    #[test]
    fn mirrored_orientation_is_not_applied() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(40, 20);
        let host = MockHost::new(tmp.path())
            .with_stream(URI, jpeg_bytes(&raw))
            .with_metadata(URI, jpeg_with_orientation(&raw, 2));

        let out = decode_file(&run(&host, URI).unwrap().path);
        assert_corners(&out, [RED, GREEN, WHITE, BLUE]);
    }

    #[test]
    fn png_source_becomes_jpeg() {
        let tmp = TempDir::new().unwrap();
        let mut png = Vec::new();
        quadrant_image(16, 16)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let host = MockHost::new(tmp.path()).with_stream(URI, png);

        let file = run(&host, URI).unwrap();
        let bytes = fs::read(&file.path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn sub_path_option_is_honored() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(tmp.path()).with_stream(URI, jpeg_bytes(&quadrant_image(8, 8)));
        let options = PickerOptions::from_value(&json!({ "storageOptions": { "path": "sel" } }));

        let file = materialize(
            &host,
            &locator(URI),
            &options,
            &MaterializeOptions::default(),
        )
        .unwrap();
        assert_eq!(file.path.parent().unwrap(), tmp.path().join("sel"));
    }

    #[test]
    fn operations_run_in_pipeline_order() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(tmp.path()).with_stream(URI, jpeg_bytes(&quadrant_image(8, 8)));
        run(&host, URI).unwrap();

        assert_eq!(
            host.get_operations(),
            vec![
                RecordedOp::OpenStream(URI.into()),
                RecordedOp::OrientationSource(URI.into()),
            ]
        );
    }

    #[test]
    fn handles_released_after_success() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(8, 8);
        let host = MockHost::new(tmp.path())
            .with_stream(URI, jpeg_bytes(&raw))
            .with_metadata(URI, jpeg_with_orientation(&raw, 6));
        run(&host, URI).unwrap();
        assert_eq!(host.open_handles(), 0);
    }

    // =========================================================================
    // Trailing bytes
    // =========================================================================

    #[test]
    fn trailing_bytes_are_dropped_by_default() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = jpeg_bytes(&quadrant_image(8, 8));
        bytes.extend_from_slice(b"TRAILER");
        let host = MockHost::new(tmp.path()).with_stream(URI, bytes);

        let file = run(&host, URI).unwrap();
        let written = fs::read(&file.path).unwrap();
        assert_eq!(&written[written.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn appending_trailing_bytes_keeps_output_decodable() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = jpeg_bytes(&quadrant_image(8, 8));
        bytes.extend_from_slice(b"TRAILER");
        let host = MockHost::new(tmp.path()).with_stream(URI, bytes);
        let settings = MaterializeOptions {
            append_trailing_bytes: true,
            ..MaterializeOptions::default()
        };

        let file = materialize(&host, &locator(URI), &PickerOptions::default(), &settings).unwrap();
        let written = fs::read(&file.path).unwrap();
        assert_eq!(&written[..2], &[0xFF, 0xD8]);
        assert!(image::load_from_memory(&written).is_ok());
    }

    #[test]
    fn trailing_bytes_follow_the_eoi_marker() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        let img = quadrant_image(8, 8);

        write_jpeg(&dest, &img, Quality::MAX, b"TRAILER").unwrap();

        let written = fs::read(&dest).unwrap();
        let encoded = imaging::encode_jpeg_to_vec(&img, Quality::MAX).unwrap();
        assert_eq!(&written[..encoded.len()], encoded.as_slice());
        assert_eq!(&written[encoded.len() - 2..encoded.len()], &[0xFF, 0xD9]);
        assert_eq!(&written[encoded.len()..], b"TRAILER");
    }

    #[test]
    fn empty_trailer_writes_only_the_encoded_image() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        let img = quadrant_image(8, 8);

        write_jpeg(&dest, &img, Quality::MAX, &[]).unwrap();

        let encoded = imaging::encode_jpeg_to_vec(&img, Quality::MAX).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), encoded);
    }

    // =========================================================================
    // Failure paths
    // =========================================================================

    #[test]
    fn locator_without_authority_fails_before_io() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(tmp.path());

        let err = run(&host, "file:///sdcard/a.jpg").unwrap_err();
        assert!(matches!(err, MaterializeError::NoAuthority(_)));
        assert_eq!(err.kind(), ErrorKind::StreamOpenFailed);
        assert!(host.get_operations().is_empty());
    }

    #[test]
    fn unopenable_stream_fails_without_allocating() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(tmp.path());

        let err = run(&host, URI).unwrap_err();
        assert!(matches!(err, MaterializeError::Open { .. }));
        assert_eq!(err.kind(), ErrorKind::StreamOpenFailed);
        assert!(cache_entries(tmp.path()).is_empty());
    }

    #[test]
    fn decode_failure_leaves_no_file_and_no_open_handles() {
        let tmp = TempDir::new().unwrap();
        let raw = quadrant_image(8, 8);
        let host = MockHost::new(tmp.path())
            .with_stream(URI, b"not an image".to_vec())
            .with_metadata(URI, jpeg_with_orientation(&raw, 6));

        let err = run(&host, URI).unwrap_err();
        assert!(matches!(err, MaterializeError::Decode { .. }));
        assert_eq!(err.kind(), ErrorKind::DecodeFailed);
        assert!(cache_entries(tmp.path()).is_empty());
        assert_eq!(host.open_handles(), 0);
    }

    #[test]
    fn create_failure_is_allocation_error() {
        let tmp = TempDir::new().unwrap();
        let host = MockHost::new(&tmp.path().join("missing"))
            .with_stream(URI, jpeg_bytes(&quadrant_image(8, 8)));

        let err = run(&host, URI).unwrap_err();
        assert!(matches!(err, MaterializeError::Create { .. }));
        assert_eq!(err.kind(), ErrorKind::AllocationFailed);
        assert_eq!(host.open_handles(), 0);
    }

    #[test]
    fn partial_file_guard_removes_unkept_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.jpg");
        fs::write(&path, b"half").unwrap();
        drop(PartialFile::new(&path));
        assert!(!path.exists());

        fs::write(&path, b"whole").unwrap();
        let mut guard = PartialFile::new(&path);
        guard.keep();
        drop(guard);
        assert!(path.exists());
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[test]
    fn options_from_encoding_config() {
        let config = EncodingConfig {
            quality: 250,
            append_trailing_bytes: true,
        };
        let settings = MaterializeOptions::from(&config);
        assert_eq!(settings.quality, Quality::MAX);
        assert!(settings.append_trailing_bytes);
    }

    #[test]
    fn default_options_use_max_quality_without_trailer() {
        let settings = MaterializeOptions::default();
        assert_eq!(settings.quality, Quality::MAX);
        assert!(!settings.append_trailing_bytes);
    }
}
