//! Filesystem-backed host.
//!
//! `LocalHost` stands in for a device when running the CLI or end-to-end
//! tests. Content is served from a mount directory, one subdirectory per
//! provider authority:
//!
//! ```text
//! mount/
//! ├── com.google.android.apps.photos.content/
//! │   └── 0/1/mediakey:/local:1/ORIGINAL/NONE     # served for content://<authority>/0/1/…
//! └── media/
//!     └── external/images/media/42
//! ```
//!
//! Structured stores come from a [`StoreIndex`] JSON file. `file://`
//! locators are opened directly.

use super::context::{HostError, MediaHost, MetadataReader};
use super::store::{StoreCursor, StoreIndex, StoreQuery, VecCursor};
use crate::config::HostConfig;
use crate::locator::{MediaLocator, Scheme};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

pub struct LocalHost {
    cache_dir: PathBuf,
    public_storage_root: PathBuf,
    mount_root: PathBuf,
    stores: StoreIndex,
}

impl LocalHost {
    pub fn new(cache_dir: impl Into<PathBuf>, mount_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            public_storage_root: PathBuf::from("/storage/emulated/0"),
            mount_root: mount_root.into(),
            stores: StoreIndex::empty(),
        }
    }

    pub fn with_public_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.public_storage_root = root.into();
        self
    }

    pub fn with_stores(mut self, stores: StoreIndex) -> Self {
        self.stores = stores;
        self
    }

    /// Build from a host config, loading the store index when one is set.
    pub fn from_config(config: &HostConfig) -> Result<Self, HostError> {
        let stores = match &config.store_index {
            Some(path) => StoreIndex::load(path)?,
            None => StoreIndex::empty(),
        };
        Ok(Self::new(&config.cache_dir, &config.mount_root)
            .with_public_storage_root(&config.public_storage_root)
            .with_stores(stores))
    }

    /// Filesystem location backing a locator.
    ///
    /// `file` locators map to their own path; anything with an authority maps
    /// to `<mount_root>/<authority>/<path>`.
    pub fn backing_path(&self, locator: &MediaLocator) -> Result<PathBuf, HostError> {
        if *locator.scheme() == Scheme::File {
            return Ok(PathBuf::from(locator.path()));
        }
        let authority = locator
            .authority()
            .ok_or_else(|| HostError::NoProvider(locator.to_string()))?;
        Ok(self
            .mount_root
            .join(authority)
            .join(locator.path().trim_start_matches('/')))
    }
}

impl MediaHost for LocalHost {
    fn open_stream(&self, locator: &MediaLocator) -> Result<Box<dyn Read>, HostError> {
        let path = self.backing_path(locator)?;
        let file = File::open(&path)?;
        Ok(Box::new(file))
    }

    fn query(&self, query: &StoreQuery) -> Result<Box<dyn StoreCursor>, HostError> {
        let rows = self.stores.query(query)?;
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn orientation_source(&self, locator: &MediaLocator) -> Option<Box<dyn MetadataReader>> {
        let path = self.backing_path(locator).ok()?;
        let file = File::open(path).ok()?;
        Some(Box::new(BufReader::new(file)))
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn public_storage_root(&self) -> &Path {
        &self.public_storage_root
    }
}
