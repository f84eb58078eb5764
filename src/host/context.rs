//! Host context trait and shared types.
//!
//! The [`MediaHost`] trait is the whole surface this crate needs from the
//! platform: a way to open a locator as bytes, a way to query structured
//! stores, and two directories. Production hosts wrap the platform's content
//! resolver; [`LocalHost`](super::local::LocalHost) serves everything from the
//! filesystem.
//!
//! Streams and cursors are returned as owned boxes. Dropping them releases
//! the underlying handle, so every exit path of a caller closes them.

use super::store::{StoreCursor, StoreQuery};
use crate::locator::MediaLocator;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No content provider for {0}")]
    NoProvider(String),
    #[error("Unknown store: {0}")]
    UnknownStore(String),
    #[error("Store query failed: {0}")]
    Query(String),
    #[error("Column {0} is not in the result set")]
    MissingColumn(String),
}

/// Seekable buffered reader over embedded image metadata.
pub trait MetadataReader: BufRead + Seek {}

impl<T: BufRead + Seek> MetadataReader for T {}

/// Platform capabilities available to a single call.
pub trait MediaHost {
    /// Open the bytes behind a locator.
    fn open_stream(&self, locator: &MediaLocator) -> Result<Box<dyn Read>, HostError>;

    /// Run a structured store query.
    fn query(&self, query: &StoreQuery) -> Result<Box<dyn StoreCursor>, HostError>;

    /// Reader over the locator's own metadata channel, used for EXIF
    /// orientation. Defaults to opening the locator path as a file, which
    /// only succeeds when the path names a readable file.
    fn orientation_source(&self, locator: &MediaLocator) -> Option<Box<dyn MetadataReader>> {
        if locator.path().is_empty() {
            return None;
        }
        let file = File::open(locator.path()).ok()?;
        Some(Box::new(BufReader::new(file)))
    }

    /// Base directory for cache files.
    fn cache_dir(&self) -> &Path;

    /// Root of the primary shared storage volume.
    fn public_storage_root(&self) -> &Path;
}
